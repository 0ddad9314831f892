//! Reservation lifecycle: `ReserveStock`, `ReleaseStock`, `ConfirmStock`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warehouse::{StockRequestLine, WarehouseService};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ReserveStockRequest {
    pub order_id: AggregateId,
    pub user_id: UserId,
    pub lines: Vec<StockRequestLine>,
}

#[derive(Serialize)]
pub struct ReservationsResponse {
    pub reservation_ids: Vec<Uuid>,
}

/// POST /reservations — `ReserveStock(orderId, items)`.
///
/// FIFO across stock rows, all-or-nothing across the requested lines: a
/// shortfall on any one product fails the whole call without reserving
/// any of the others.
pub async fn reserve(
    State(service): State<Arc<WarehouseService>>,
    Json(req): Json<ReserveStockRequest>,
) -> Result<Json<ReservationsResponse>, ApiError> {
    if req.lines.is_empty() {
        return Err(ApiError::BadRequest("lines must not be empty".to_string()));
    }

    let reservation_ids = service
        .reserve_stock(req.order_id.into(), req.user_id.into(), &req.lines)
        .await?;

    Ok(Json(ReservationsResponse { reservation_ids }))
}

/// POST /reservations/{order_id}/release — `ReleaseStock(orderId)`.
///
/// Idempotent: already-released reservations are skipped, so a retry (or a
/// race with the expiry sweeper) is always safe.
pub async fn release(
    State(service): State<Arc<WarehouseService>>,
    Path(order_id): Path<Uuid>,
) -> Result<(), ApiError> {
    service.release_stock(order_id).await?;
    Ok(())
}

/// POST /reservations/{order_id}/confirm — `ConfirmStock(orderId)`.
///
/// Promotes every `RESERVED` reservation for the order to `CONFIRMED`
/// without restoring stock row quantity. Not invoked by the order saga;
/// exposed as its own bookkeeping operation.
pub async fn confirm(
    State(service): State<Arc<WarehouseService>>,
    Path(order_id): Path<Uuid>,
) -> Result<(), ApiError> {
    service.confirm_stock(order_id).await?;
    Ok(())
}
