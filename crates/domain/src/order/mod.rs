//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use commands::*;
pub use events::{
    OrderCancelledData, OrderCompletedData, OrderCreatedData, OrderEvent, OrderFailedData,
    StockReservedData,
};
pub use service::OrderService;
pub use state::OrderState;
pub use value_objects::OrderItem;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is not in the expected state for the attempted transition.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: OrderState,
        action: &'static str,
    },

    /// Invalid quantity on a line item.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Line items (or a line item and the order total) carry mismatched
    /// currencies.
    #[error("Currency mismatch: {lhs} vs {rhs}")]
    CurrencyMismatch { lhs: String, rhs: String },

    /// Order is already created.
    #[error("Order already created")]
    AlreadyCreated,
}
