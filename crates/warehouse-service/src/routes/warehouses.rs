//! Warehouse directory and administration: `TransferStockBetweenWarehouse`,
//! `SetWarehouseStatus`, `GetWarehouseByShopID`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warehouse::{Warehouse, WarehouseService};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct TransferStockRequest {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub product_id: String,
    pub quantity: u32,
}

/// POST /transfers — `TransferStockBetweenWarehouse`.
pub async fn transfer(
    State(service): State<Arc<WarehouseService>>,
    Json(req): Json<TransferStockRequest>,
) -> Result<(), ApiError> {
    service
        .transfer_stock(
            req.from_warehouse_id,
            req.to_warehouse_id,
            &ProductId::new(req.product_id),
            req.quantity,
        )
        .await?;
    Ok(())
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub is_active: bool,
}

/// POST /warehouses/{id}/status — `SetWarehouseStatus`.
///
/// Inactive warehouses are excluded from on-hand summation and new
/// reservations; existing reservations against their rows remain valid for
/// release and confirm.
pub async fn set_status(
    State(service): State<Arc<WarehouseService>>,
    Path(warehouse_id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> Result<(), ApiError> {
    service.set_warehouse_status(warehouse_id, req.is_active).await?;
    Ok(())
}

#[derive(Serialize)]
pub struct WarehousesResponse {
    pub warehouses: Vec<Warehouse>,
}

/// GET /shops/{shop_id}/warehouses — `GetWarehouseByShopID`.
pub async fn by_shop(
    State(service): State<Arc<WarehouseService>>,
    Path(shop_id): Path<Uuid>,
) -> Result<Json<WarehousesResponse>, ApiError> {
    let warehouses = service.get_warehouse_by_shop_id(shop_id).await?;
    Ok(Json(WarehousesResponse { warehouses }))
}
