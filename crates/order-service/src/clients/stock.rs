//! Warehouse stock-lookup client used by `GetCart`'s `actualStock`
//! annotation.
//!
//! This is deliberately read-only and distinct from `saga::WarehouseGateway`:
//! the saga coordinator reserves and releases stock on behalf of a single
//! order, while the cart manager only needs the current on-hand quantity
//! for display. Kept as its own trait seam so a cart read never shares a
//! client (or its retry/timeout policy) with the saga's reservation calls.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ProductId;
use thiserror::Error;
use warehouse::StockSummary;

/// Errors from the stock-lookup client.
#[derive(Debug, Error)]
pub enum StockClientError {
    /// The warehouse service could not be reached or returned an error.
    #[error("warehouse service error: {0}")]
    Transport(String),
}

/// Resolves current on-hand quantity by product id.
#[async_trait]
pub trait WarehouseStockClient: Send + Sync {
    /// Returns on-hand quantity for each requested id. Ids with no stock
    /// record are omitted rather than erroring; callers treat a missing
    /// entry as zero.
    async fn get_stocks(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, u32>, StockClientError>;
}

/// In-memory stock lookup, for tests and default/dev wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockClient {
    on_hand: Arc<RwLock<HashMap<ProductId, u32>>>,
}

impl InMemoryStockClient {
    /// Creates an empty stock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds on-hand quantity for a product.
    pub fn seed(&self, product_id: ProductId, quantity: u32) {
        self.on_hand.write().unwrap().insert(product_id, quantity);
    }
}

#[async_trait]
impl WarehouseStockClient for InMemoryStockClient {
    async fn get_stocks(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, u32>, StockClientError> {
        let on_hand = self.on_hand.read().unwrap();
        Ok(product_ids
            .iter()
            .filter_map(|id| on_hand.get(id).map(|qty| (id.clone(), *qty)))
            .collect())
    }
}

/// Stock lookup over the real warehouse service.
#[derive(Clone)]
pub struct HttpStockClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStockClient {
    /// Creates a client against `base_url`, e.g. `http://warehouse:8081`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl WarehouseStockClient for HttpStockClient {
    async fn get_stocks(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, u32>, StockClientError> {
        let ids: Vec<String> = product_ids.iter().map(|p| p.to_string()).collect();

        let response = self
            .client
            .get(format!("{}/stocks", self.base_url))
            .query(&[("product_ids", ids.join(","))])
            .send()
            .await
            .map_err(|e| StockClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StockClientError::Transport(format!(
                "warehouse service returned {}",
                response.status()
            )));
        }

        let summaries: Vec<StockSummary> = response
            .json()
            .await
            .map_err(|e| StockClientError::Transport(e.to_string()))?;

        Ok(summaries
            .into_iter()
            .map(|s| (s.product_id, s.on_hand))
            .collect())
    }
}
