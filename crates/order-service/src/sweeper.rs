//! Order expiry sweeper.
//!
//! Ticks every `tick_interval`; any order still `PENDING` or
//! `STOCK_RESERVED` past `threshold` is expired: `PENDING` orders are
//! simply marked `FAILED` (a create-time failure may have persisted a
//! pending row without compensation), and `STOCK_RESERVED` orders are
//! marked `FAILED` and have their reservation released. Per-order failures
//! are logged and do not abort the batch — the next tick retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use domain::{FailOrder, OrderService, OrderState};
use event_store::EventStore;
use projections::{OrderListView, ProjectionProcessor};
use saga::WarehouseGateway;

const EXPIRABLE_STATES: &[OrderState] = &[OrderState::Pending, OrderState::StockReserved];

/// Runs the order expiry sweeper until cancelled.
pub async fn run<S, W>(
    order_service: OrderService<S>,
    order_list: OrderListView,
    warehouse: W,
    projection_processor: Arc<ProjectionProcessor<S>>,
    tick_interval: Duration,
    threshold: Duration,
) where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway,
{
    let mut ticker = tokio::time::interval(tick_interval);
    loop {
        ticker.tick().await;
        if let Err(e) = projection_processor.run_catch_up().await {
            tracing::warn!(error = %e, "order sweeper: projection catch-up failed, using stale read model this tick");
        }
        sweep_once(&order_service, &order_list, &warehouse, threshold).await;
        if let Err(e) = projection_processor.run_catch_up().await {
            tracing::warn!(error = %e, "order sweeper: post-sweep projection catch-up failed");
        }
    }
}

async fn sweep_once<S, W>(
    order_service: &OrderService<S>,
    order_list: &OrderListView,
    warehouse: &W,
    threshold: Duration,
) where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway,
{
    let older_than = Utc::now()
        - chrono::Duration::from_std(threshold).unwrap_or(chrono::Duration::seconds(180));

    let stale = order_list.list_expirable(EXPIRABLE_STATES, older_than).await;
    if stale.is_empty() {
        return;
    }

    tracing::info!(count = stale.len(), "order sweeper: expiring stale orders");
    metrics::counter!("order_sweeper_expired_total").increment(stale.len() as u64);

    for order in stale {
        if order.state == OrderState::StockReserved {
            if let Err(e) = warehouse.release_stock(order.order_id).await {
                tracing::warn!(
                    order_id = %order.order_id,
                    error = %e,
                    "order sweeper: release_stock failed, leaving order for next tick"
                );
                continue;
            }
        }

        if let Err(e) = order_service
            .fail_order(FailOrder::new(order.order_id, "expired by sweeper"))
            .await
        {
            tracing::warn!(
                order_id = %order.order_id,
                error = %e,
                "order sweeper: failed to mark order FAILED"
            );
        }
    }
}
