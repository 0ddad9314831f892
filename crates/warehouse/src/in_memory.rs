//! In-memory warehouse repository, for tests and benches.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::ProductId;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::WarehouseError;
use crate::models::{
    ReservationRecord, ReservationStatus, StockRequestLine, StockRow, StockSummary, Warehouse,
};
use crate::repository::WarehouseRepository;

#[derive(Default)]
struct Inner {
    warehouses: HashMap<Uuid, Warehouse>,
    stock_rows: HashMap<Uuid, StockRow>,
    reservations: HashMap<Uuid, ReservationRecord>,
}

impl Inner {
    fn active_rows_for(&self, product_id: &ProductId) -> Vec<&StockRow> {
        let mut rows: Vec<&StockRow> = self
            .stock_rows
            .values()
            .filter(|row| &row.product_id == product_id)
            .filter(|row| {
                self.warehouses
                    .get(&row.warehouse_id)
                    .is_some_and(|w| w.is_active)
            })
            .collect();
        rows.sort_by_key(|row| row.created_at);
        rows
    }

    fn on_hand(&self, product_id: &ProductId) -> u32 {
        self.active_rows_for(product_id).iter().map(|r| r.quantity).sum()
    }
}

/// In-memory stock ledger, for tests and benchmarks.
#[derive(Default)]
pub struct InMemoryWarehouseRepository {
    inner: Mutex<Inner>,
}

impl InMemoryWarehouseRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a warehouse, returning its ID.
    pub async fn seed_warehouse(&self, shop_id: Uuid, name: &str, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().await;
        inner.warehouses.insert(
            id,
            Warehouse {
                id,
                shop_id,
                name: name.to_string(),
                is_active,
            },
        );
        id
    }

    /// Seeds a stock row for a product in a warehouse, returning its ID.
    pub async fn seed_stock(&self, warehouse_id: Uuid, product_id: &str, quantity: u32) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().await;
        inner.stock_rows.insert(
            id,
            StockRow {
                id,
                warehouse_id,
                product_id: ProductId::new(product_id),
                quantity,
                created_at: Utc::now(),
            },
        );
        id
    }
}

#[async_trait]
impl WarehouseRepository for InMemoryWarehouseRepository {
    async fn reserve_stock(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        lines: &[StockRequestLine],
    ) -> Result<Vec<Uuid>, WarehouseError> {
        let mut inner = self.inner.lock().await;

        // All-or-nothing: validate every line against current on-hand
        // before mutating anything.
        for line in lines {
            let on_hand = inner.on_hand(&line.product_id);
            if on_hand == 0 {
                return Err(WarehouseError::EmptyStock {
                    product_id: line.product_id.to_string(),
                });
            }
            if on_hand < line.quantity {
                return Err(WarehouseError::InsufficientStock {
                    product_id: line.product_id.to_string(),
                    requested: line.quantity,
                    available: on_hand,
                });
            }
        }

        let mut created = Vec::new();
        for line in lines {
            let mut remaining = line.quantity;
            let row_ids: Vec<Uuid> = inner
                .active_rows_for(&line.product_id)
                .into_iter()
                .map(|r| r.id)
                .collect();

            for row_id in row_ids {
                if remaining == 0 {
                    break;
                }
                let row = inner.stock_rows.get_mut(&row_id).expect("row exists");
                let take = remaining.min(row.quantity);
                if take == 0 {
                    continue;
                }
                row.quantity -= take;
                remaining -= take;

                let reservation_id = Uuid::new_v4();
                inner.reservations.insert(
                    reservation_id,
                    ReservationRecord {
                        id: reservation_id,
                        order_id,
                        user_id,
                        stock_row_id: row_id,
                        product_id: line.product_id.clone(),
                        quantity: take,
                        status: ReservationStatus::Reserved,
                        created_at: Utc::now(),
                    },
                );
                created.push(reservation_id);
            }
        }

        Ok(created)
    }

    async fn release_stock(&self, order_id: Uuid) -> Result<(), WarehouseError> {
        let mut inner = self.inner.lock().await;
        let reservation_ids: Vec<Uuid> = inner
            .reservations
            .values()
            .filter(|r| r.order_id == order_id && r.status == ReservationStatus::Reserved)
            .map(|r| r.id)
            .collect();

        for id in reservation_ids {
            let (stock_row_id, quantity) = {
                let record = inner.reservations.get_mut(&id).expect("reservation exists");
                record.status = ReservationStatus::Released;
                (record.stock_row_id, record.quantity)
            };
            if let Some(row) = inner.stock_rows.get_mut(&stock_row_id) {
                row.quantity += quantity;
            }
        }

        Ok(())
    }

    async fn confirm_stock(&self, order_id: Uuid) -> Result<(), WarehouseError> {
        let mut inner = self.inner.lock().await;
        for record in inner.reservations.values_mut() {
            if record.order_id == order_id && record.status == ReservationStatus::Reserved {
                record.status = ReservationStatus::Confirmed;
            }
        }
        Ok(())
    }

    async fn transfer_stock(
        &self,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), WarehouseError> {
        let mut inner = self.inner.lock().await;

        let from_row_id = inner
            .stock_rows
            .values()
            .find(|r| r.warehouse_id == from_warehouse_id && &r.product_id == product_id)
            .map(|r| r.id)
            .ok_or_else(|| {
                WarehouseError::NotFound(format!(
                    "no stock row for product {product_id} in warehouse {from_warehouse_id}"
                ))
            })?;

        {
            let from_row = inner.stock_rows.get_mut(&from_row_id).expect("row exists");
            if from_row.quantity < quantity {
                return Err(WarehouseError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested: quantity,
                    available: from_row.quantity,
                });
            }
            from_row.quantity -= quantity;
        }

        let to_row_id = inner
            .stock_rows
            .values()
            .find(|r| r.warehouse_id == to_warehouse_id && &r.product_id == product_id)
            .map(|r| r.id);

        match to_row_id {
            Some(id) => {
                inner.stock_rows.get_mut(&id).expect("row exists").quantity += quantity;
            }
            None => {
                let id = Uuid::new_v4();
                inner.stock_rows.insert(
                    id,
                    StockRow {
                        id,
                        warehouse_id: to_warehouse_id,
                        product_id: product_id.clone(),
                        quantity,
                        created_at: Utc::now(),
                    },
                );
            }
        }

        Ok(())
    }

    async fn set_warehouse_status(
        &self,
        warehouse_id: Uuid,
        is_active: bool,
    ) -> Result<(), WarehouseError> {
        let mut inner = self.inner.lock().await;
        let warehouse = inner
            .warehouses
            .get_mut(&warehouse_id)
            .ok_or_else(|| WarehouseError::NotFound(warehouse_id.to_string()))?;
        warehouse.is_active = is_active;
        Ok(())
    }

    async fn get_stocks(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<StockSummary>, WarehouseError> {
        let inner = self.inner.lock().await;
        Ok(product_ids
            .iter()
            .map(|id| StockSummary {
                product_id: id.clone(),
                on_hand: inner.on_hand(id),
            })
            .collect())
    }

    async fn get_warehouse_by_shop_id(&self, shop_id: Uuid) -> Result<Vec<Warehouse>, WarehouseError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .warehouses
            .values()
            .filter(|w| w.shop_id == shop_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reserve_stock_is_fifo_across_rows() {
        let repo = InMemoryWarehouseRepository::new();
        let warehouse_id = repo.seed_warehouse(Uuid::new_v4(), "Main", true).await;
        repo.seed_stock(warehouse_id, "SKU-1", 3).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        repo.seed_stock(warehouse_id, "SKU-1", 5).await;

        let order_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let lines = vec![StockRequestLine {
            product_id: ProductId::new("SKU-1"),
            quantity: 4,
        }];

        let reservations = repo.reserve_stock(order_id, user_id, &lines).await.unwrap();
        assert_eq!(reservations.len(), 2);

        let stocks = repo
            .get_stocks(&[ProductId::new("SKU-1")])
            .await
            .unwrap();
        assert_eq!(stocks[0].on_hand, 4);
    }

    #[tokio::test]
    async fn reserve_stock_fails_insufficient_without_mutating() {
        let repo = InMemoryWarehouseRepository::new();
        let warehouse_id = repo.seed_warehouse(Uuid::new_v4(), "Main", true).await;
        repo.seed_stock(warehouse_id, "SKU-1", 2).await;

        let lines = vec![StockRequestLine {
            product_id: ProductId::new("SKU-1"),
            quantity: 5,
        }];

        let err = repo
            .reserve_stock(Uuid::new_v4(), Uuid::new_v4(), &lines)
            .await
            .unwrap_err();
        assert!(matches!(err, WarehouseError::InsufficientStock { .. }));

        let stocks = repo.get_stocks(&[ProductId::new("SKU-1")]).await.unwrap();
        assert_eq!(stocks[0].on_hand, 2);
    }

    #[tokio::test]
    async fn reserve_stock_is_all_or_nothing_across_lines() {
        let repo = InMemoryWarehouseRepository::new();
        let warehouse_id = repo.seed_warehouse(Uuid::new_v4(), "Main", true).await;
        repo.seed_stock(warehouse_id, "SKU-1", 10).await;
        repo.seed_stock(warehouse_id, "SKU-2", 1).await;

        let lines = vec![
            StockRequestLine {
                product_id: ProductId::new("SKU-1"),
                quantity: 5,
            },
            StockRequestLine {
                product_id: ProductId::new("SKU-2"),
                quantity: 5,
            },
        ];

        let err = repo
            .reserve_stock(Uuid::new_v4(), Uuid::new_v4(), &lines)
            .await
            .unwrap_err();
        assert!(matches!(err, WarehouseError::InsufficientStock { .. }));

        let stocks = repo.get_stocks(&[ProductId::new("SKU-1")]).await.unwrap();
        assert_eq!(stocks[0].on_hand, 10);
    }

    #[tokio::test]
    async fn release_stock_restores_quantity_and_is_idempotent() {
        let repo = InMemoryWarehouseRepository::new();
        let warehouse_id = repo.seed_warehouse(Uuid::new_v4(), "Main", true).await;
        repo.seed_stock(warehouse_id, "SKU-1", 10).await;

        let order_id = Uuid::new_v4();
        let lines = vec![StockRequestLine {
            product_id: ProductId::new("SKU-1"),
            quantity: 4,
        }];
        repo.reserve_stock(order_id, Uuid::new_v4(), &lines).await.unwrap();

        repo.release_stock(order_id).await.unwrap();
        repo.release_stock(order_id).await.unwrap();

        let stocks = repo.get_stocks(&[ProductId::new("SKU-1")]).await.unwrap();
        assert_eq!(stocks[0].on_hand, 10);
    }

    #[tokio::test]
    async fn confirm_stock_does_not_restore_quantity() {
        let repo = InMemoryWarehouseRepository::new();
        let warehouse_id = repo.seed_warehouse(Uuid::new_v4(), "Main", true).await;
        repo.seed_stock(warehouse_id, "SKU-1", 10).await;

        let order_id = Uuid::new_v4();
        let lines = vec![StockRequestLine {
            product_id: ProductId::new("SKU-1"),
            quantity: 4,
        }];
        repo.reserve_stock(order_id, Uuid::new_v4(), &lines).await.unwrap();
        repo.confirm_stock(order_id).await.unwrap();

        let stocks = repo.get_stocks(&[ProductId::new("SKU-1")]).await.unwrap();
        assert_eq!(stocks[0].on_hand, 6);
    }

    #[tokio::test]
    async fn inactive_warehouse_excluded_from_on_hand_and_reservation() {
        let repo = InMemoryWarehouseRepository::new();
        let warehouse_id = repo.seed_warehouse(Uuid::new_v4(), "Main", false).await;
        repo.seed_stock(warehouse_id, "SKU-1", 10).await;

        let stocks = repo.get_stocks(&[ProductId::new("SKU-1")]).await.unwrap();
        assert_eq!(stocks[0].on_hand, 0);

        let lines = vec![StockRequestLine {
            product_id: ProductId::new("SKU-1"),
            quantity: 1,
        }];
        let err = repo
            .reserve_stock(Uuid::new_v4(), Uuid::new_v4(), &lines)
            .await
            .unwrap_err();
        assert!(matches!(err, WarehouseError::EmptyStock { .. }));
    }

    #[tokio::test]
    async fn transfer_stock_moves_between_warehouses() {
        let repo = InMemoryWarehouseRepository::new();
        let wh_a = repo.seed_warehouse(Uuid::new_v4(), "A", true).await;
        let wh_b = repo.seed_warehouse(Uuid::new_v4(), "B", true).await;
        repo.seed_stock(wh_a, "SKU-1", 10).await;

        repo.transfer_stock(wh_a, wh_b, &ProductId::new("SKU-1"), 4)
            .await
            .unwrap();

        let stocks = repo.get_stocks(&[ProductId::new("SKU-1")]).await.unwrap();
        assert_eq!(stocks[0].on_hand, 10);
    }
}
