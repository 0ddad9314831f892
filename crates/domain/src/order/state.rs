//! Order state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► StockReserved ──► Completed
///    │              │
///    └──────────────┴──► Failed
/// ```
///
/// `Cancelled` is reserved for a future user-initiated cancellation path
/// and is never reached by create, reservation, payment, or expiry
/// handling as implemented today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderState {
    /// Order persisted, stock not yet reserved.
    #[default]
    Pending,

    /// Stock reserved and payment initiated; awaiting the payment callback.
    StockReserved,

    /// Payment confirmed (terminal state).
    Completed,

    /// Reserved for a future cancellation flow (terminal state). Unreachable
    /// today.
    Cancelled,

    /// Reservation failed, payment failed, or the order expired before
    /// either completed (terminal state).
    Failed,
}

impl OrderState {
    /// Returns true if stock can be reserved in this state.
    pub fn can_mark_stock_reserved(&self) -> bool {
        matches!(self, OrderState::Pending)
    }

    /// Returns true if the order can be completed in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderState::StockReserved)
    }

    /// Returns true if the order can fail in this state: create-time
    /// failure and sweeper expiry originate from `Pending`; payment
    /// failure and compensation originate from `StockReserved`.
    pub fn can_fail(&self) -> bool {
        matches!(self, OrderState::Pending | OrderState::StockReserved)
    }

    /// Returns true if this is a terminal state (no further transitions
    /// possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Completed | OrderState::Cancelled | OrderState::Failed
        )
    }

    /// Returns the state name as a string, matching the wire format used by
    /// `GetOrder`/`GetOrderList` status filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "PENDING",
            OrderState::StockReserved => "STOCK_RESERVED",
            OrderState::Completed => "COMPLETED",
            OrderState::Cancelled => "CANCELLED",
            OrderState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderState::Pending),
            "STOCK_RESERVED" => Ok(OrderState::StockReserved),
            "COMPLETED" => Ok(OrderState::Completed),
            "CANCELLED" => Ok(OrderState::Cancelled),
            "FAILED" => Ok(OrderState::Failed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}
