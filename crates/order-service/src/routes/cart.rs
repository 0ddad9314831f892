//! Cart management: `AddProductToCart` and `GetCart`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use common::{Money, ProductId};
use domain::CartItem;
use event_store::EventStore;
use saga::{PaymentGateway, WarehouseGateway};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::caller_user_id;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub actual_stock: u32,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            actual_stock: item.actual_stock,
        }
    }
}

#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
}

/// POST /cart/items — `AddProductToCart`.
///
/// Looks up the product in the catalog to snapshot its name and price, and
/// rejects a quantity above the catalog's reported stock — a soft
/// pre-check; the authoritative check happens at reservation time in the
/// warehouse service.
pub async fn add_item<S, W, P>(
    State(state): State<Arc<AppState<S, W, P>>>,
    headers: HeaderMap,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    let user_id = caller_user_id(&headers)?;

    if req.quantity == 0 {
        return Err(ApiError::BadRequest("quantity must be greater than 0".to_string()));
    }

    let product_id = ProductId::new(req.product_id);
    let products = state.catalog_client.get_products(&[product_id.clone()]).await?;
    let product = products
        .get(&product_id)
        .ok_or_else(|| ApiError::NotFound(format!("product {product_id} not found")))?;

    let cart = state
        .cart_repository
        .upsert_item(user_id, product, req.quantity)
        .await?;

    Ok(Json(CartResponse {
        items: cart.items.into_iter().map(CartItemResponse::from).collect(),
    }))
}

/// GET /cart — `GetCart`, annotating each line with its live on-hand
/// quantity from the warehouse stock-lookup client. Products the warehouse
/// has no stock record for are reported as zero rather than erroring.
pub async fn get_cart<S, W, P>(
    State(state): State<Arc<AppState<S, W, P>>>,
    headers: HeaderMap,
) -> Result<Json<CartResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    let user_id = caller_user_id(&headers)?;

    let cart = state.cart_repository.get_or_create(user_id).await?;

    let product_ids: Vec<ProductId> = cart.items.iter().map(|i| i.product_id.clone()).collect();
    let stocks = state.stock_client.get_stocks(&product_ids).await?;

    let items = cart
        .items
        .into_iter()
        .map(|mut item| {
            item.actual_stock = stocks.get(&item.product_id).copied().unwrap_or(0);
            CartItemResponse::from(item)
        })
        .collect();

    Ok(Json(CartResponse { items }))
}
