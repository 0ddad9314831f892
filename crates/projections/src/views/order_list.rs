//! Order list read model — every order, queryable by owner, date range,
//! and status.
//!
//! Terminal orders are never evicted: `GetOrderList` must be able to
//! return `COMPLETED`/`FAILED` orders alongside active ones, filtered by
//! the caller.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use domain::{OrderEvent, OrderItem, OrderState};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Snapshot of an order as exposed to `GetOrder`/`GetOrderList`.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order_id: AggregateId,
    pub user_id: UserId,
    pub state: OrderState,
    pub items: Vec<OrderItem>,
    pub total_amount: common::Money,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional filters accepted by `list_orders`.
///
/// An inverted `(start_date, end_date)` range or an unrecognized status
/// string is a caller-side validation error (rejected before this view is
/// even queried); this type only carries already-validated filters.
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<OrderState>,
}

/// Read model view over every order, keyed by the owning user.
#[derive(Clone)]
pub struct OrderListView {
    orders: Arc<RwLock<HashMap<AggregateId, OrderSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OrderListView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Returns a single order, if the caller is its owner.
    pub async fn get_order(&self, order_id: AggregateId, user_id: UserId) -> Option<OrderSummary> {
        let orders = self.orders.read().await;
        orders
            .get(&order_id)
            .filter(|o| o.user_id == user_id)
            .cloned()
    }

    /// Lists a user's orders matching the given filter, newest first.
    pub async fn list_orders(&self, user_id: UserId, filter: &OrderListFilter) -> Vec<OrderSummary> {
        let orders = self.orders.read().await;
        let mut matches: Vec<OrderSummary> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .filter(|o| filter.start_date.is_none_or(|d| o.created_at >= d))
            .filter(|o| filter.end_date.is_none_or(|d| o.created_at <= d))
            .filter(|o| filter.status.is_none_or(|s| o.state == s))
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }

    /// Finds the order carrying the given payment transaction id, if any.
    /// Used by `CallbackTransaction`, which locates its order by
    /// `transactionId` rather than `orderId`.
    pub async fn find_by_transaction_id(&self, transaction_id: &str) -> Option<OrderSummary> {
        self.orders
            .read()
            .await
            .values()
            .find(|o| o.transaction_id.as_deref() == Some(transaction_id))
            .cloned()
    }

    /// Returns every order in one of `states` created before `older_than`,
    /// regardless of owner. Used by the expiry sweeper, which operates
    /// system-wide rather than on behalf of a single caller.
    pub async fn list_expirable(
        &self,
        states: &[OrderState],
        older_than: DateTime<Utc>,
    ) -> Vec<OrderSummary> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| states.contains(&o.state) && o.created_at < older_than)
            .cloned()
            .collect()
    }
}

impl Default for OrderListView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OrderListView {
    fn name(&self) -> &'static str {
        "OrderListView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Order" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
        let order_id = event.aggregate_id;

        let mut orders = self.orders.write().await;

        match order_event {
            OrderEvent::OrderCreated(data) => {
                orders.insert(
                    order_id,
                    OrderSummary {
                        order_id,
                        user_id: data.user_id,
                        state: OrderState::Pending,
                        items: data.items,
                        total_amount: data.total_amount,
                        transaction_id: None,
                        created_at: data.created_at,
                        updated_at: data.created_at,
                    },
                );
            }
            OrderEvent::StockReserved(data) => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.state = OrderState::StockReserved;
                    order.transaction_id = Some(data.transaction_id);
                    order.updated_at = data.reserved_at;
                }
            }
            OrderEvent::OrderCompleted(data) => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.state = OrderState::Completed;
                    order.updated_at = data.completed_at;
                }
            }
            OrderEvent::OrderFailed(data) => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.state = OrderState::Failed;
                    order.updated_at = data.failed_at;
                }
            }
            OrderEvent::OrderCancelled(data) => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.state = OrderState::Cancelled;
                    order.updated_at = data.cancelled_at;
                }
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.orders.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for OrderListView {
    fn name(&self) -> &'static str {
        "OrderListView"
    }

    fn count(&self) -> usize {
        self.orders.try_read().map(|o| o.len()).unwrap_or(0)
    }
}
