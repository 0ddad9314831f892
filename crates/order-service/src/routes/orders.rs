//! Checkout, order lookup, order history, and the payment callback.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use common::{AggregateId, Money, ProductId, UserId};
use domain::{CompleteOrder, CreateOrder as CreateOrderCommand, FailOrder, OrderItem, OrderState};
use event_store::EventStore;
use projections::{OrderListFilter, OrderSummary};
use saga::{PaymentGateway, WarehouseGateway};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::caller_user_id;
use crate::error::ApiError;

// -- Request / response types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub idempotency_key: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: AggregateId,
    pub user_id: UserId,
    pub status: &'static str,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderSummary> for OrderResponse {
    fn from(o: OrderSummary) -> Self {
        Self {
            id: o.order_id,
            user_id: o.user_id,
            status: o.state.as_str(),
            items: o.items,
            total_amount: o.total_amount,
            transaction_id: o.transaction_id,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackTransactionRequest {
    pub transaction_id: String,
    pub payment_status: String,
}

// -- Handlers --

/// POST /orders — `CreateOrder(idempotencyKey)`.
///
/// Idempotent on `(user_id, idempotency_key)`: a retry with the same key
/// returns the already-created order verbatim rather than re-running the
/// saga. The cart only supplies the product ids and quantities; prices are
/// re-fetched from the catalog here so a stale `AddProductToCart`-time price
/// never leaks into the order total.
pub async fn create<S, W, P>(
    State(state): State<Arc<AppState<S, W, P>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    let user_id = caller_user_id(&headers)?;

    if req.idempotency_key.trim().is_empty() {
        return Err(ApiError::BadRequest("idempotency_key must not be empty".to_string()));
    }

    if let Some(existing_id) = state
        .order_index
        .find(user_id, &req.idempotency_key)
        .await
        .map_err(ApiError::Internal)?
    {
        let summary = state
            .order_list
            .get_order(existing_id, user_id)
            .await
            .ok_or_else(|| ApiError::Internal("idempotency index points at an unreadable order".to_string()))?;
        return Ok(Json(summary.into()));
    }

    let cart = state.cart_repository.get_or_create(user_id).await?;
    if cart.is_empty() {
        return Err(ApiError::NotFound("cart is empty".to_string()));
    }

    for item in &cart.items {
        if item.quantity == 0 {
            return Err(ApiError::BadRequest(format!(
                "invalid quantity for product {}: must be greater than 0",
                item.product_id
            )));
        }
    }

    let product_ids: Vec<ProductId> = cart.items.iter().map(|item| item.product_id.clone()).collect();
    let catalog_prices = state.catalog_client.get_products(&product_ids).await?;

    let mut total_amount = None;
    let mut items = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
        let product = catalog_prices.get(&item.product_id).ok_or_else(|| {
            ApiError::NotFound(format!("catalog product not found: {}", item.product_id))
        })?;

        let line_total = product.price.multiply_by_int(item.quantity as i64)?;
        total_amount = Some(match total_amount {
            None => line_total.clone(),
            Some(running) => running.add(&line_total).map_err(|e| ApiError::BadRequest(e.to_string()))?,
        });
        items.push(OrderItem::new(
            item.product_id.clone(),
            product.name.clone(),
            item.quantity,
            product.price.clone(),
        ));
    }
    let total_amount = total_amount.expect("cart was checked non-empty above");

    let order_id = AggregateId::new();
    state
        .order_service
        .create_order(CreateOrderCommand::new(
            order_id,
            req.idempotency_key.clone(),
            user_id,
            items,
            total_amount,
        ))
        .await?;

    // Recorded only now that the order's initial event has durably
    // appended: a transient failure above leaves the idempotency key
    // reusable rather than pointing at an order that was never created.
    state
        .order_index
        .record(user_id, &req.idempotency_key, order_id)
        .await
        .map_err(ApiError::Internal)?;

    // The saga compensates and marks the order FAILED on its own failure
    // paths, so a saga error here is logged but does not change the
    // response: the order itself is already durably PENDING/FAILED.
    let saga_result = state.saga_coordinator.execute_saga(order_id).await;

    state.cart_repository.deactivate(user_id).await?;

    if let Err(e) = saga_result {
        tracing::warn!(order_id = %order_id, error = %e, "saga execution reported a failure");
    }

    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let summary = state
        .order_list
        .get_order(order_id, user_id)
        .await
        .ok_or_else(|| ApiError::Internal("order not visible in read model immediately after creation".to_string()))?;

    Ok(Json(summary.into()))
}

/// GET /orders/{id} — `GetOrder`.
///
/// The authority check (order's `user_id` must equal the caller's)
/// precedes any projection read: a non-owner gets the same `NOT_FOUND` as a
/// nonexistent order, since `OrderListView::get_order` already filters by
/// owner before returning.
pub async fn get<S, W, P>(
    State(state): State<Arc<AppState<S, W, P>>>,
    headers: HeaderMap,
    Path(order_id): Path<AggregateId>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    let user_id = caller_user_id(&headers)?;

    let summary = state
        .order_list
        .get_order(order_id, user_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))?;

    Ok(Json(summary.into()))
}

/// GET /orders — `GetOrderList`, filtered by optional `start_date`,
/// `end_date`, and `status`.
pub async fn list<S, W, P>(
    State(state): State<Arc<AppState<S, W, P>>>,
    headers: HeaderMap,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<OrderListResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    let user_id = caller_user_id(&headers)?;

    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(ApiError::BadRequest("start_date must not be after end_date".to_string()));
        }
    }

    let status = query
        .status
        .as_deref()
        .map(OrderState::from_str)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let filter = OrderListFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        status,
    };

    let orders = state
        .order_list
        .list_orders(user_id, &filter)
        .await
        .into_iter()
        .map(OrderResponse::from)
        .collect();

    Ok(Json(OrderListResponse { orders }))
}

/// POST /orders/callback — `CallbackTransaction`, called by the payment
/// service once a payment reaches a terminal status.
///
/// The order is located by `transaction_id` rather than `order_id`: this
/// endpoint is driven by the payment service, which only knows its own
/// transaction id. The order's current status must be `STOCK_RESERVED`,
/// else the callback is rejected as a precondition failure — this also
/// makes a duplicate callback for an already-completed order a no-op error
/// rather than a silent double-apply.
pub async fn callback_transaction<S, W, P>(
    State(state): State<Arc<AppState<S, W, P>>>,
    Json(req): Json<CallbackTransactionRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    let summary = state
        .order_list
        .find_by_transaction_id(&req.transaction_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no order for transaction {}", req.transaction_id)))?;

    if summary.state != OrderState::StockReserved {
        return Err(ApiError::Conflict(format!(
            "order {} is in {} state, expected STOCK_RESERVED",
            summary.order_id, summary.state
        )));
    }

    match req.payment_status.as_str() {
        "PAID" => {
            state
                .order_service
                .complete_order(CompleteOrder::new(summary.order_id))
                .await?;
        }
        "FAILED" => {
            state
                .order_service
                .fail_order(FailOrder::new(summary.order_id, "payment failed"))
                .await?;
        }
        other => {
            return Err(ApiError::BadRequest(format!("unknown payment status: {other}")));
        }
    }

    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let summary = state
        .order_list
        .get_order(summary.order_id, summary.user_id)
        .await
        .ok_or_else(|| ApiError::Internal("order vanished from read model after callback".to_string()))?;

    Ok(Json(summary.into()))
}
