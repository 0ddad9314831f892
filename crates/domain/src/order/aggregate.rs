//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, Money, UserId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::{
    OrderError, OrderEvent, OrderItem, OrderState,
    events::{OrderCreatedData, OrderFailedData, StockReservedData},
};

/// Order aggregate root.
///
/// An order's items are captured once, at creation time, as an immutable
/// price/quantity snapshot — they are never re-read from the catalog and
/// never mutated afterward. Everything that happens next is a status
/// transition driven by the checkout saga: stock reservation, payment, and
/// either completion or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The idempotency key supplied at creation, used to detect duplicate
    /// `CreateOrder` calls.
    idempotency_key: String,

    /// The user who placed the order.
    user_id: Option<UserId>,

    /// Current status of the order.
    status: OrderState,

    /// Line items, immutable after creation.
    items: Vec<OrderItem>,

    /// Total amount across all items, in a single currency.
    total_amount: Option<Money>,

    /// The payment transaction ID, set once stock is reserved.
    transaction_id: Option<String>,

    /// When the order was created.
    created_at: Option<DateTime<Utc>>,

    /// When the order was last updated.
    updated_at: Option<DateTime<Utc>>,

    /// Reason the order failed or was cancelled, if it was.
    terminal_reason: Option<String>,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            id: None,
            version: Version::default(),
            idempotency_key: String::new(),
            user_id: None,
            status: OrderState::Pending,
            items: Vec::new(),
            total_amount: None,
            transaction_id: None,
            created_at: None,
            updated_at: None,
            terminal_reason: None,
        }
    }
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderCreated(data) => self.apply_order_created(data),
            OrderEvent::StockReserved(data) => self.apply_stock_reserved(data),
            OrderEvent::OrderCompleted(_) => {
                self.status = OrderState::Completed;
                self.updated_at = Some(Utc::now());
            }
            OrderEvent::OrderFailed(data) => self.apply_order_failed(data),
            OrderEvent::OrderCancelled(data) => {
                self.status = OrderState::Cancelled;
                self.terminal_reason = Some(data.reason);
                self.updated_at = Some(Utc::now());
            }
        }
    }
}

impl SnapshotCapable for Order {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Order {
    /// Returns the idempotency key this order was created with.
    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    /// Returns the user who placed the order.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderState {
        self.status
    }

    /// Returns the order's line items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the number of distinct line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Returns the total amount, if the order has been created.
    pub fn total_amount(&self) -> Option<&Money> {
        self.total_amount.as_ref()
    }

    /// Returns the payment transaction ID, once stock has been reserved.
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Returns when the order was created.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns when the order was last updated.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns true if the order has items.
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (return events)
impl Order {
    /// Creates a new order with its item snapshot and computed total.
    ///
    /// Requires at least one item and a single currency across all items
    /// and the total.
    pub fn create(
        &self,
        order_id: AggregateId,
        idempotency_key: impl Into<String>,
        user_id: UserId,
        items: Vec<OrderItem>,
        total_amount: Money,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyCreated);
        }

        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            if item.unit_price.currency_code != total_amount.currency_code {
                return Err(OrderError::CurrencyMismatch {
                    lhs: item.unit_price.currency_code.clone(),
                    rhs: total_amount.currency_code.clone(),
                });
            }
        }

        let idempotency_key = idempotency_key.into();
        Ok(vec![OrderEvent::order_created(
            order_id,
            idempotency_key,
            user_id,
            items,
            total_amount,
        )])
    }

    /// Marks stock as reserved and payment as initiated. Only valid from
    /// `Pending`.
    pub fn mark_stock_reserved(
        &self,
        transaction_id: impl Into<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.status.can_mark_stock_reserved() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "mark stock reserved",
            });
        }

        Ok(vec![OrderEvent::stock_reserved(transaction_id)])
    }

    /// Completes the order after the payment callback confirms success.
    /// Only valid from `StockReserved`.
    pub fn complete(&self) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.status.can_complete() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "complete",
            });
        }

        Ok(vec![OrderEvent::order_completed()])
    }

    /// Fails the order: used for create-time reservation/payment failure,
    /// compensation, and sweeper expiry. Valid from `Pending` or
    /// `StockReserved`.
    pub fn fail(&self, reason: impl Into<String>) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.status.can_fail() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "fail",
            });
        }

        Ok(vec![OrderEvent::order_failed(reason)])
    }

    /// Cancels the order. Reserved for a future user-initiated cancellation
    /// flow; no current operation calls this.
    pub fn cancel(&self, reason: impl Into<String>) -> Result<Vec<OrderEvent>, OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "cancel",
            });
        }

        Ok(vec![OrderEvent::order_cancelled(reason)])
    }
}

// Apply event helpers
impl Order {
    fn apply_order_created(&mut self, data: OrderCreatedData) {
        self.id = Some(data.order_id);
        self.idempotency_key = data.idempotency_key;
        self.user_id = Some(data.user_id);
        self.items = data.items;
        self.total_amount = Some(data.total_amount);
        self.status = OrderState::Pending;
        self.created_at = Some(data.created_at);
        self.updated_at = Some(data.created_at);
    }

    fn apply_stock_reserved(&mut self, data: StockReservedData) {
        self.status = OrderState::StockReserved;
        self.transaction_id = Some(data.transaction_id);
        self.updated_at = Some(data.reserved_at);
    }

    fn apply_order_failed(&mut self, data: OrderFailedData) {
        self.status = OrderState::Failed;
        self.terminal_reason = Some(data.reason);
        self.updated_at = Some(data.failed_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregate, DomainEvent};

    fn sample_items() -> Vec<OrderItem> {
        vec![OrderItem::new("SKU-001", "Widget", 2, Money::new(1000, "USD"))]
    }

    fn create_order() -> (Order, AggregateId) {
        let mut order = Order::default();
        let order_id = AggregateId::new();
        let user_id = UserId::new();
        let events = order
            .create(
                order_id,
                "idem-1",
                user_id,
                sample_items(),
                Money::new(2000, "USD"),
            )
            .unwrap();
        order.apply_events(events);
        (order, order_id)
    }

    #[test]
    fn test_create_order() {
        let (order, order_id) = create_order();
        assert_eq!(order.id(), Some(order_id));
        assert!(order.user_id().is_some());
        assert_eq!(order.status(), OrderState::Pending);
        assert!(order.has_items());
        assert_eq!(order.total_amount(), Some(&Money::new(2000, "USD")));
    }

    #[test]
    fn test_create_order_twice_fails() {
        let (order, _) = create_order();
        let result = order.create(
            AggregateId::new(),
            "idem-2",
            UserId::new(),
            sample_items(),
            Money::new(2000, "USD"),
        );
        assert!(matches!(result, Err(OrderError::AlreadyCreated)));
    }

    #[test]
    fn test_create_order_with_no_items_fails() {
        let order = Order::default();
        let result = order.create(
            AggregateId::new(),
            "idem-1",
            UserId::new(),
            vec![],
            Money::zero("USD"),
        );
        assert!(matches!(result, Err(OrderError::NoItems)));
    }

    #[test]
    fn test_create_order_with_mixed_currency_fails() {
        let order = Order::default();
        let items = vec![OrderItem::new("SKU-001", "Widget", 1, Money::new(1000, "EUR"))];
        let result = order.create(
            AggregateId::new(),
            "idem-1",
            UserId::new(),
            items,
            Money::new(1000, "USD"),
        );
        assert!(matches!(result, Err(OrderError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_create_order_with_zero_quantity_item_fails() {
        let order = Order::default();
        let items = vec![OrderItem::new("SKU-001", "Widget", 0, Money::new(1000, "USD"))];
        let result = order.create(
            AggregateId::new(),
            "idem-1",
            UserId::new(),
            items,
            Money::new(0, "USD"),
        );
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_mark_stock_reserved() {
        let (mut order, _) = create_order();
        let events = order.mark_stock_reserved("TX123").unwrap();
        order.apply_events(events);

        assert_eq!(order.status(), OrderState::StockReserved);
        assert_eq!(order.transaction_id(), Some("TX123"));
    }

    #[test]
    fn test_mark_stock_reserved_twice_fails() {
        let (mut order, _) = create_order();
        order.apply_events(order.mark_stock_reserved("TX123").unwrap());

        let result = order.mark_stock_reserved("TX456");
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_complete_requires_stock_reserved() {
        let (order, _) = create_order();
        let result = order.complete();
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_full_happy_path() {
        let (mut order, _) = create_order();
        order.apply_events(order.mark_stock_reserved("TX123").unwrap());
        assert_eq!(order.status(), OrderState::StockReserved);

        let events = order.complete().unwrap();
        assert_eq!(events[0].event_type(), "OrderCompleted");
        order.apply_events(events);

        assert_eq!(order.status(), OrderState::Completed);
        assert!(order.is_terminal());
    }

    #[test]
    fn test_fail_from_pending() {
        let (mut order, _) = create_order();
        let events = order.fail("insufficient stock").unwrap();
        order.apply_events(events);

        assert_eq!(order.status(), OrderState::Failed);
        assert!(order.is_terminal());
    }

    #[test]
    fn test_fail_from_stock_reserved() {
        let (mut order, _) = create_order();
        order.apply_events(order.mark_stock_reserved("TX123").unwrap());

        let events = order.fail("payment declined").unwrap();
        order.apply_events(events);

        assert_eq!(order.status(), OrderState::Failed);
    }

    #[test]
    fn test_cannot_fail_completed_order() {
        let (mut order, _) = create_order();
        order.apply_events(order.mark_stock_reserved("TX123").unwrap());
        order.apply_events(order.complete().unwrap());

        let result = order.fail("too late");
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_total_quantity() {
        let (order, _) = create_order();
        assert_eq!(order.total_quantity(), 2);
    }

    #[test]
    fn test_serialization() {
        let (order, order_id) = create_order();

        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.id(), Some(order_id));
        assert_eq!(deserialized.item_count(), 1);
        assert_eq!(deserialized.total_amount(), Some(&Money::new(2000, "USD")));
    }
}
