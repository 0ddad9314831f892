//! Order commands.

use common::{AggregateId, Money, UserId};

use crate::command::Command;

use super::{Order, OrderItem};

/// Command to create a new order from a priced, stock-unverified cart
/// snapshot. Stock reservation and payment happen afterward, driven by the
/// checkout saga.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The order ID to create.
    pub order_id: AggregateId,

    /// The idempotency key supplied by the caller.
    pub idempotency_key: String,

    /// The user placing the order.
    pub user_id: UserId,

    /// Line items, snapshotted from the cart and catalog at this moment.
    pub items: Vec<OrderItem>,

    /// Total amount across all items.
    pub total_amount: Money,
}

impl CreateOrder {
    /// Creates a new `CreateOrder` command.
    pub fn new(
        order_id: AggregateId,
        idempotency_key: impl Into<String>,
        user_id: UserId,
        items: Vec<OrderItem>,
        total_amount: Money,
    ) -> Self {
        Self {
            order_id,
            idempotency_key: idempotency_key.into(),
            user_id,
            items,
            total_amount,
        }
    }
}

impl Command for CreateOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to mark an order's stock as reserved and payment as initiated.
#[derive(Debug, Clone)]
pub struct MarkStockReserved {
    /// The order to transition.
    pub order_id: AggregateId,

    /// The payment transaction ID returned by `ProcessPayment`.
    pub transaction_id: String,
}

impl MarkStockReserved {
    /// Creates a new `MarkStockReserved` command.
    pub fn new(order_id: AggregateId, transaction_id: impl Into<String>) -> Self {
        Self {
            order_id,
            transaction_id: transaction_id.into(),
        }
    }
}

impl Command for MarkStockReserved {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to complete an order after its payment has been confirmed.
#[derive(Debug, Clone)]
pub struct CompleteOrder {
    /// The order to complete.
    pub order_id: AggregateId,
}

impl CompleteOrder {
    /// Creates a new `CompleteOrder` command.
    pub fn new(order_id: AggregateId) -> Self {
        Self { order_id }
    }
}

impl Command for CompleteOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to fail an order: reservation failure, payment failure,
/// compensation, or sweeper expiry.
#[derive(Debug, Clone)]
pub struct FailOrder {
    /// The order to fail.
    pub order_id: AggregateId,

    /// Human-readable reason, preserved for diagnostics.
    pub reason: String,
}

impl FailOrder {
    /// Creates a new `FailOrder` command.
    pub fn new(order_id: AggregateId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
        }
    }
}

impl Command for FailOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_command() {
        let order_id = AggregateId::new();
        let user_id = UserId::new();
        let items = vec![OrderItem::new("SKU-001", "Widget", 2, Money::new(1000, "USD"))];

        let cmd = CreateOrder::new(order_id, "idem-1", user_id, items, Money::new(2000, "USD"));
        assert_eq!(cmd.aggregate_id(), order_id);
        assert_eq!(cmd.user_id, user_id);
        assert_eq!(cmd.idempotency_key, "idem-1");
        assert_eq!(cmd.items.len(), 1);
    }

    #[test]
    fn test_mark_stock_reserved_command() {
        let order_id = AggregateId::new();
        let cmd = MarkStockReserved::new(order_id, "TX123");
        assert_eq!(cmd.aggregate_id(), order_id);
        assert_eq!(cmd.transaction_id, "TX123");
    }

    #[test]
    fn test_complete_order_command() {
        let order_id = AggregateId::new();
        let cmd = CompleteOrder::new(order_id);
        assert_eq!(cmd.aggregate_id(), order_id);
    }

    #[test]
    fn test_fail_order_command() {
        let order_id = AggregateId::new();
        let cmd = FailOrder::new(order_id, "insufficient stock");
        assert_eq!(cmd.aggregate_id(), order_id);
        assert_eq!(cmd.reason, "insufficient stock");
    }
}
