//! Stock lookup: `GetStocks`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::ProductId;
use serde::Deserialize;
use warehouse::{StockSummary, WarehouseService};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct StocksQuery {
    /// Comma-separated product ids.
    pub product_ids: String,
}

/// GET /stocks?product_ids=a,b,c — `GetStocks`.
///
/// Returns the current on-hand summary, across active warehouses, for each
/// requested product. Used by the order service's cart `GetCart` handler
/// to annotate each line with its live `actualStock`.
pub async fn get(
    State(service): State<Arc<WarehouseService>>,
    Query(query): Query<StocksQuery>,
) -> Result<Json<Vec<StockSummary>>, ApiError> {
    let product_ids: Vec<ProductId> = query
        .product_ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ProductId::new)
        .collect();

    if product_ids.is_empty() {
        return Err(ApiError::BadRequest("product_ids must not be empty".to_string()));
    }

    let stocks = service.get_stocks(&product_ids).await?;
    Ok(Json(stocks))
}
