//! Order domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::OrderItem;

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was created with its full item snapshot and computed total.
    OrderCreated(OrderCreatedData),

    /// Stock was reserved and payment was initiated.
    StockReserved(StockReservedData),

    /// Payment was confirmed; the order is done.
    OrderCompleted(OrderCompletedData),

    /// The order failed: stock reservation failed, payment failed, or the
    /// order expired before completing.
    OrderFailed(OrderFailedData),

    /// Reserved for a future cancellation flow. Never emitted today.
    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::StockReserved(_) => "StockReserved",
            OrderEvent::OrderCompleted(_) => "OrderCompleted",
            OrderEvent::OrderFailed(_) => "OrderFailed",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

/// Data for the `OrderCreated` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// The unique order ID.
    pub order_id: AggregateId,

    /// The idempotency key the caller supplied to `CreateOrder`.
    pub idempotency_key: String,

    /// The user who created the order.
    pub user_id: UserId,

    /// Line items, snapshotted at creation time.
    pub items: Vec<OrderItem>,

    /// Total amount across all items, in a single currency.
    pub total_amount: Money,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// Data for the `StockReserved` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReservedData {
    /// The payment transaction ID returned by `ProcessPayment`.
    pub transaction_id: String,

    /// When stock was reserved and payment initiated.
    pub reserved_at: DateTime<Utc>,
}

/// Data for the `OrderCompleted` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCompletedData {
    /// When the order was completed.
    pub completed_at: DateTime<Utc>,
}

/// Data for the `OrderFailed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFailedData {
    /// When the order failed.
    pub failed_at: DateTime<Utc>,

    /// Human-readable reason: stock reservation failure, payment failure,
    /// or expiry.
    pub reason: String,
}

/// Data for the `OrderCancelled` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    /// When the order was cancelled.
    pub cancelled_at: DateTime<Utc>,

    /// Reason for cancellation.
    pub reason: String,
}

impl OrderEvent {
    /// Creates an `OrderCreated` event.
    pub fn order_created(
        order_id: AggregateId,
        idempotency_key: impl Into<String>,
        user_id: UserId,
        items: Vec<OrderItem>,
        total_amount: Money,
    ) -> Self {
        OrderEvent::OrderCreated(OrderCreatedData {
            order_id,
            idempotency_key: idempotency_key.into(),
            user_id,
            items,
            total_amount,
            created_at: Utc::now(),
        })
    }

    /// Creates a `StockReserved` event.
    pub fn stock_reserved(transaction_id: impl Into<String>) -> Self {
        OrderEvent::StockReserved(StockReservedData {
            transaction_id: transaction_id.into(),
            reserved_at: Utc::now(),
        })
    }

    /// Creates an `OrderCompleted` event.
    pub fn order_completed() -> Self {
        OrderEvent::OrderCompleted(OrderCompletedData {
            completed_at: Utc::now(),
        })
    }

    /// Creates an `OrderFailed` event.
    pub fn order_failed(reason: impl Into<String>) -> Self {
        OrderEvent::OrderFailed(OrderFailedData {
            failed_at: Utc::now(),
            reason: reason.into(),
        })
    }

    /// Creates an `OrderCancelled` event.
    pub fn order_cancelled(reason: impl Into<String>) -> Self {
        OrderEvent::OrderCancelled(OrderCancelledData {
            cancelled_at: Utc::now(),
            reason: reason.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<OrderItem> {
        vec![OrderItem::new("SKU-001", "Widget", 2, Money::new(1000, "USD"))]
    }

    #[test]
    fn test_event_type() {
        let order_id = AggregateId::new();
        let user_id = UserId::new();

        let event = OrderEvent::order_created(
            order_id,
            "idem-1",
            user_id,
            sample_items(),
            Money::new(2000, "USD"),
        );
        assert_eq!(event.event_type(), "OrderCreated");

        let event = OrderEvent::stock_reserved("TX123");
        assert_eq!(event.event_type(), "StockReserved");

        let event = OrderEvent::order_completed();
        assert_eq!(event.event_type(), "OrderCompleted");

        let event = OrderEvent::order_failed("insufficient stock");
        assert_eq!(event.event_type(), "OrderFailed");

        let event = OrderEvent::order_cancelled("customer request");
        assert_eq!(event.event_type(), "OrderCancelled");
    }

    #[test]
    fn test_order_created_serialization_roundtrip() {
        let order_id = AggregateId::new();
        let user_id = UserId::new();
        let event = OrderEvent::order_created(
            order_id,
            "idem-1",
            user_id,
            sample_items(),
            Money::new(2000, "USD"),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("OrderCreated"));

        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.event_type(), "OrderCreated");

        if let OrderEvent::OrderCreated(data) = deserialized {
            assert_eq!(data.order_id, order_id);
            assert_eq!(data.user_id, user_id);
            assert_eq!(data.idempotency_key, "idem-1");
            assert_eq!(data.items.len(), 1);
        } else {
            panic!("Expected OrderCreated event");
        }
    }

    #[test]
    fn test_stock_reserved_serialization() {
        let event = OrderEvent::stock_reserved("TX456");
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();

        if let OrderEvent::StockReserved(data) = deserialized {
            assert_eq!(data.transaction_id, "TX456");
        } else {
            panic!("Expected StockReserved event");
        }
    }

    #[test]
    fn test_order_failed_serialization() {
        let event = OrderEvent::order_failed("payment declined");
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderEvent = serde_json::from_str(&json).unwrap();

        if let OrderEvent::OrderFailed(data) = deserialized {
            assert_eq!(data.reason, "payment declined");
        } else {
            panic!("Expected OrderFailed event");
        }
    }
}
