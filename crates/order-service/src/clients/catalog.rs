//! Product catalog client trait and implementations.
//!
//! The product catalog is an external, read-only collaborator: order
//! service only needs to resolve names, prices, and a stock hint for a
//! batch of product ids. This follows the same gateway-trait-seam pattern
//! as the saga crate's `WarehouseGateway`/`PaymentGateway`: a narrow trait,
//! an `InMemory` double for tests and default wiring, and an `Http`
//! implementation for talking to a real catalog service.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, ProductId};
use domain::CatalogProduct;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the catalog client.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// One or more requested product ids do not exist in the catalog.
    #[error("catalog product not found: {0}")]
    NotFound(String),

    /// The catalog service could not be reached or returned an error.
    #[error("catalog service error: {0}")]
    Transport(String),
}

/// Resolves product metadata (name, price, stock hint) by id.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetches catalog entries for every id in `product_ids` in one call.
    /// Fails if any id is unknown to the catalog.
    async fn get_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CatalogProduct>, CatalogError>;
}

/// In-memory catalog, for tests and default/dev wiring. Seeded directly
/// rather than backed by a real product-directory service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogClient {
    products: Arc<RwLock<HashMap<ProductId, CatalogProduct>>>,
}

impl InMemoryCatalogClient {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds (or replaces) a catalog entry.
    pub fn seed(&self, product: CatalogProduct) {
        self.products
            .write()
            .unwrap()
            .insert(product.product_id.clone(), product);
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalogClient {
    async fn get_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CatalogProduct>, CatalogError> {
        let products = self.products.read().unwrap();
        let mut out = HashMap::with_capacity(product_ids.len());
        for id in product_ids {
            let product = products
                .get(id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
            out.insert(id.clone(), product);
        }
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    product_ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CatalogProductWire {
    product_id: String,
    name: String,
    price_units: i64,
    price_currency: String,
    stock: u32,
}

/// Catalog client over a real product-directory service.
#[derive(Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    /// Creates a client against `base_url`, e.g. `http://catalog:8083`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CatalogProduct>, CatalogError> {
        let ids: Vec<String> = product_ids.iter().map(|p| p.to_string()).collect();

        let response = self
            .client
            .post(format!("{}/products/batch", self.base_url))
            .json(&BatchRequest { product_ids: &ids })
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Transport(format!(
                "catalog service returned {}",
                response.status()
            )));
        }

        let wire: Vec<CatalogProductWire> = response
            .json()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(wire
            .into_iter()
            .map(|w| {
                let product_id = ProductId::new(w.product_id);
                let product = CatalogProduct {
                    product_id: product_id.clone(),
                    name: w.name,
                    price: Money::new(w.price_units, w.price_currency),
                    stock: w.stock,
                };
                (product_id, product)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_returns_seeded_products() {
        let catalog = InMemoryCatalogClient::new();
        catalog.seed(CatalogProduct {
            product_id: ProductId::new("SKU-001"),
            name: "Widget".to_string(),
            price: Money::new(1000, "USD"),
            stock: 5,
        });

        let result = catalog
            .get_products(&[ProductId::new("SKU-001")])
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[&ProductId::new("SKU-001")].stock, 5);
    }

    #[tokio::test]
    async fn in_memory_rejects_unknown_product() {
        let catalog = InMemoryCatalogClient::new();
        let result = catalog.get_products(&[ProductId::new("SKU-999")]).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }
}
