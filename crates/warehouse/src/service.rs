//! Warehouse service facade: tracing and metrics around the repository.

use std::sync::Arc;

use common::ProductId;
use uuid::Uuid;

use crate::error::WarehouseError;
use crate::models::{StockRequestLine, StockSummary, Warehouse};
use crate::repository::WarehouseRepository;

/// Thin facade over a `WarehouseRepository`, adding the instrumentation the
/// warehouse-service binary exposes on `/metrics`.
#[derive(Clone)]
pub struct WarehouseService {
    repo: Arc<dyn WarehouseRepository>,
}

impl WarehouseService {
    /// Creates a new service over the given repository.
    pub fn new(repo: Arc<dyn WarehouseRepository>) -> Self {
        Self { repo }
    }

    /// Reserves stock for every requested line, FIFO and all-or-nothing.
    #[tracing::instrument(skip(self, lines))]
    pub async fn reserve_stock(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        lines: &[StockRequestLine],
    ) -> Result<Vec<Uuid>, WarehouseError> {
        metrics::counter!("warehouse_reserve_stock_total").increment(1);
        let start = std::time::Instant::now();

        let result = self.repo.reserve_stock(order_id, user_id, lines).await;

        metrics::histogram!("warehouse_reserve_stock_seconds").record(start.elapsed().as_secs_f64());
        if result.is_err() {
            metrics::counter!("warehouse_reserve_stock_failed_total").increment(1);
        }
        result
    }

    /// Releases every reservation tied to `order_id` back to its stock row.
    #[tracing::instrument(skip(self))]
    pub async fn release_stock(&self, order_id: Uuid) -> Result<(), WarehouseError> {
        metrics::counter!("warehouse_release_stock_total").increment(1);
        self.repo.release_stock(order_id).await
    }

    /// Confirms every reservation tied to `order_id` without restoring
    /// quantity.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_stock(&self, order_id: Uuid) -> Result<(), WarehouseError> {
        metrics::counter!("warehouse_confirm_stock_total").increment(1);
        self.repo.confirm_stock(order_id).await
    }

    /// Moves stock between two warehouses.
    #[tracing::instrument(skip(self))]
    pub async fn transfer_stock(
        &self,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), WarehouseError> {
        self.repo
            .transfer_stock(from_warehouse_id, to_warehouse_id, product_id, quantity)
            .await
    }

    /// Enables or disables a warehouse.
    #[tracing::instrument(skip(self))]
    pub async fn set_warehouse_status(
        &self,
        warehouse_id: Uuid,
        is_active: bool,
    ) -> Result<(), WarehouseError> {
        self.repo.set_warehouse_status(warehouse_id, is_active).await
    }

    /// Returns the current on-hand summary for each requested product.
    #[tracing::instrument(skip(self, product_ids))]
    pub async fn get_stocks(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<StockSummary>, WarehouseError> {
        self.repo.get_stocks(product_ids).await
    }

    /// Returns the warehouse(s) belonging to a shop.
    #[tracing::instrument(skip(self))]
    pub async fn get_warehouse_by_shop_id(&self, shop_id: Uuid) -> Result<Vec<Warehouse>, WarehouseError> {
        self.repo.get_warehouse_by_shop_id(shop_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryWarehouseRepository;

    #[tokio::test]
    async fn reserve_and_release_round_trip_through_the_service() {
        let repo = Arc::new(InMemoryWarehouseRepository::new());
        let warehouse_id = repo.seed_warehouse(Uuid::new_v4(), "Main", true).await;
        repo.seed_stock(warehouse_id, "SKU-1", 10).await;

        let service = WarehouseService::new(repo);
        let order_id = Uuid::new_v4();
        let lines = vec![StockRequestLine {
            product_id: ProductId::new("SKU-1"),
            quantity: 3,
        }];

        service.reserve_stock(order_id, Uuid::new_v4(), &lines).await.unwrap();
        let stocks = service.get_stocks(&[ProductId::new("SKU-1")]).await.unwrap();
        assert_eq!(stocks[0].on_hand, 7);

        service.release_stock(order_id).await.unwrap();
        let stocks = service.get_stocks(&[ProductId::new("SKU-1")]).await.unwrap();
        assert_eq!(stocks[0].on_hand, 10);
    }
}
