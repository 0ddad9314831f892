//! Warehouse gateway trait, its HTTP implementation, and an in-memory
//! double for tests.
//!
//! The warehouse service is a separate process reached over RPC. The wire
//! request reuses `warehouse::StockRequestLine` so the client and the
//! warehouse-service route share one schema instead of two hand-kept
//! copies.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AggregateId, ProductId, UserId};
use serde::Serialize;
use warehouse::StockRequestLine;

use crate::error::SagaError;

/// One requested line in a `ReserveStock` call.
#[derive(Debug, Clone)]
pub struct ReservationItem {
    /// The product identifier.
    pub product_id: ProductId,
    /// Human-readable product name, carried through for error messages.
    pub product_name: String,
    /// Quantity requested.
    pub quantity: u32,
}

/// Gateway to the warehouse service's stock reservation operations.
#[async_trait]
pub trait WarehouseGateway: Send + Sync {
    /// Reserves stock for every requested line, FIFO and all-or-nothing.
    async fn reserve_stock(
        &self,
        order_id: AggregateId,
        user_id: UserId,
        items: &[ReservationItem],
    ) -> Result<(), SagaError>;

    /// Releases every reservation tied to `order_id` back to its stock row.
    /// Idempotent.
    async fn release_stock(&self, order_id: AggregateId) -> Result<(), SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryWarehouseState {
    /// on-hand quantity per product
    on_hand: HashMap<String, u32>,
    /// orders with an active (unreleased) reservation
    reserved_orders: HashMap<AggregateId, Vec<(String, u32)>>,
    fail_on_reserve: bool,
}

/// In-memory warehouse gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarehouseGateway {
    state: Arc<RwLock<InMemoryWarehouseState>>,
}

impl InMemoryWarehouseGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds on-hand quantity for a product.
    pub fn seed_stock(&self, product_id: &str, quantity: u32) {
        self.state
            .write()
            .unwrap()
            .on_hand
            .insert(product_id.to_string(), quantity);
    }

    /// Configures the gateway to fail on the next reservation call.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Returns the number of orders with an active reservation.
    pub fn reservation_count(&self) -> usize {
        self.state.read().unwrap().reserved_orders.len()
    }

    /// Returns current on-hand for a product.
    pub fn on_hand(&self, product_id: &str) -> u32 {
        *self
            .state
            .read()
            .unwrap()
            .on_hand
            .get(product_id)
            .unwrap_or(&0)
    }
}

#[async_trait]
impl WarehouseGateway for InMemoryWarehouseGateway {
    async fn reserve_stock(
        &self,
        order_id: AggregateId,
        _user_id: UserId,
        items: &[ReservationItem],
    ) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_reserve {
            return Err(SagaError::WarehouseService("stock unavailable".to_string()));
        }

        for item in items {
            let available = *state.on_hand.get(item.product_id.as_str()).unwrap_or(&0);
            if available < item.quantity {
                return Err(SagaError::WarehouseService(format!(
                    "insufficient stock for {}: requested {}, available {}",
                    item.product_id, item.quantity, available
                )));
            }
        }

        let mut allocated = Vec::with_capacity(items.len());
        for item in items {
            *state
                .on_hand
                .entry(item.product_id.to_string())
                .or_insert(0) -= item.quantity;
            allocated.push((item.product_id.to_string(), item.quantity));
        }
        state.reserved_orders.insert(order_id, allocated);

        Ok(())
    }

    async fn release_stock(&self, order_id: AggregateId) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();
        if let Some(lines) = state.reserved_orders.remove(&order_id) {
            for (product_id, quantity) in lines {
                *state.on_hand.entry(product_id).or_insert(0) += quantity;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ReserveStockRequest {
    order_id: AggregateId,
    user_id: UserId,
    lines: Vec<StockRequestLine>,
}

/// `WarehouseGateway` over HTTP, talking to the warehouse-service binary.
#[derive(Clone)]
pub struct HttpWarehouseGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWarehouseGateway {
    /// Creates a new gateway against `base_url` (e.g.
    /// `http://warehouse-service:8081`).
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl WarehouseGateway for HttpWarehouseGateway {
    #[tracing::instrument(skip(self, items))]
    async fn reserve_stock(
        &self,
        order_id: AggregateId,
        user_id: UserId,
        items: &[ReservationItem],
    ) -> Result<(), SagaError> {
        let lines = items
            .iter()
            .map(|item| StockRequestLine {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })
            .collect();

        let response = self
            .client
            .post(format!("{}/reservations", self.base_url))
            .json(&ReserveStockRequest {
                order_id,
                user_id,
                lines,
            })
            .send()
            .await
            .map_err(|e| SagaError::WarehouseService(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SagaError::WarehouseService(body));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn release_stock(&self, order_id: AggregateId) -> Result<(), SagaError> {
        let response = self
            .client
            .post(format!("{}/reservations/{}/release", self.base_url, order_id))
            .send()
            .await
            .map_err(|e| SagaError::WarehouseService(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SagaError::WarehouseService(body));
        }

        Ok(())
    }
}
