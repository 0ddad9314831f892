//! PostgreSQL-backed warehouse repository.
//!
//! Allocation is serialized per product by `SELECT ... FOR UPDATE` inside a
//! single transaction: concurrent `ReserveStock` calls for the same product
//! queue on the row locks and each sees the decremented state left by the
//! previously-committed one.

use async_trait::async_trait;
use common::ProductId;
use sqlx::{PgPool, Row, Transaction, postgres::Postgres};
use uuid::Uuid;

use crate::error::WarehouseError;
use crate::models::{ReservationStatus, StockRequestLine, StockSummary, Warehouse};
use crate::repository::WarehouseRepository;

fn db_err(e: sqlx::Error) -> WarehouseError {
    WarehouseError::Storage(e.to_string())
}

fn status_str(status: ReservationStatus) -> &'static str {
    match status {
        ReservationStatus::Reserved => "RESERVED",
        ReservationStatus::Released => "RELEASED",
        ReservationStatus::Confirmed => "CONFIRMED",
    }
}

/// PostgreSQL-backed stock ledger.
#[derive(Clone)]
pub struct PostgresWarehouseRepository {
    pool: PgPool,
}

impl PostgresWarehouseRepository {
    /// Creates a new repository backed by `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the crate-local database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn on_hand_for_update(
        tx: &mut Transaction<'_, Postgres>,
        product_id: &ProductId,
    ) -> Result<u32, WarehouseError> {
        // Aggregates can't be combined with FOR UPDATE, so lock the rows
        // first and sum in process.
        let quantities: Vec<(i32,)> = sqlx::query_as(
            "SELECT sr.quantity FROM stock_rows sr \
             JOIN warehouses w ON w.id = sr.warehouse_id \
             WHERE sr.product_id = $1 AND w.is_active = true \
             FOR UPDATE OF sr",
        )
        .bind(product_id.as_str())
        .fetch_all(&mut **tx)
        .await
        .map_err(db_err)?;

        Ok(quantities.into_iter().map(|(q,)| q as u32).sum())
    }
}

#[async_trait]
impl WarehouseRepository for PostgresWarehouseRepository {
    async fn reserve_stock(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        lines: &[StockRequestLine],
    ) -> Result<Vec<Uuid>, WarehouseError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut created = Vec::new();

        for line in lines {
            let on_hand = Self::on_hand_for_update(&mut tx, &line.product_id).await?;
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

            let rows = sqlx::query(
                "SELECT sr.id, sr.quantity FROM stock_rows sr \
                 JOIN warehouses w ON w.id = sr.warehouse_id \
                 WHERE sr.product_id = $1 AND w.is_active = true \
                 ORDER BY sr.created_at ASC",
            )
            .bind(line.product_id.as_str())
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err)?;

            let mut remaining = line.quantity;
            for row in rows {
                if remaining == 0 {
                    break;
                }
                let row_id: Uuid = row.try_get("id").map_err(db_err)?;
                let row_quantity: i32 = row.try_get("quantity").map_err(db_err)?;
                let take = remaining.min(row_quantity as u32);
                if take == 0 {
                    continue;
                }

                sqlx::query("UPDATE stock_rows SET quantity = quantity - $1 WHERE id = $2")
                    .bind(take as i32)
                    .bind(row_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;

                let reservation_id = Uuid::new_v4();
                sqlx::query(
                    "INSERT INTO reservation_records \
                     (id, order_id, user_id, stock_row_id, product_id, quantity, status) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(reservation_id)
                .bind(order_id)
                .bind(user_id)
                .bind(row_id)
                .bind(line.product_id.as_str())
                .bind(take as i32)
                .bind(status_str(ReservationStatus::Reserved))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;

                created.push(reservation_id);
                remaining -= take;
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(created)
    }

    async fn release_stock(&self, order_id: Uuid) -> Result<(), WarehouseError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let rows = sqlx::query(
            "SELECT id, stock_row_id, quantity FROM reservation_records \
             WHERE order_id = $1 AND status = 'RESERVED' FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        for row in rows {
            let reservation_id: Uuid = row.try_get("id").map_err(db_err)?;
            let stock_row_id: Uuid = row.try_get("stock_row_id").map_err(db_err)?;
            let quantity: i32 = row.try_get("quantity").map_err(db_err)?;

            sqlx::query("UPDATE stock_rows SET quantity = quantity + $1 WHERE id = $2")
                .bind(quantity)
                .bind(stock_row_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;

            sqlx::query("UPDATE reservation_records SET status = 'RELEASED' WHERE id = $1")
                .bind(reservation_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn confirm_stock(&self, order_id: Uuid) -> Result<(), WarehouseError> {
        sqlx::query(
            "UPDATE reservation_records SET status = 'CONFIRMED' \
             WHERE order_id = $1 AND status = 'RESERVED'",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn transfer_stock(
        &self,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), WarehouseError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let from_row: Option<(Uuid, i32)> = sqlx::query_as(
            "SELECT id, quantity FROM stock_rows WHERE warehouse_id = $1 AND product_id = $2 \
             FOR UPDATE",
        )
        .bind(from_warehouse_id)
        .bind(product_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let (from_row_id, from_quantity) = from_row.ok_or_else(|| {
            WarehouseError::NotFound(format!(
                "no stock row for product {product_id} in warehouse {from_warehouse_id}"
            ))
        })?;

        if (from_quantity as u32) < quantity {
            return Err(WarehouseError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: quantity,
                available: from_quantity as u32,
            });
        }

        sqlx::query("UPDATE stock_rows SET quantity = quantity - $1 WHERE id = $2")
            .bind(quantity as i32)
            .bind(from_row_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let to_row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM stock_rows WHERE warehouse_id = $1 AND product_id = $2 FOR UPDATE",
        )
        .bind(to_warehouse_id)
        .bind(product_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        match to_row {
            Some((id,)) => {
                sqlx::query("UPDATE stock_rows SET quantity = quantity + $1 WHERE id = $2")
                    .bind(quantity as i32)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO stock_rows (id, warehouse_id, product_id, quantity) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(Uuid::new_v4())
                .bind(to_warehouse_id)
                .bind(product_id.as_str())
                .bind(quantity as i32)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn set_warehouse_status(
        &self,
        warehouse_id: Uuid,
        is_active: bool,
    ) -> Result<(), WarehouseError> {
        let result = sqlx::query("UPDATE warehouses SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(warehouse_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(WarehouseError::NotFound(warehouse_id.to_string()));
        }
        Ok(())
    }

    async fn get_stocks(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<StockSummary>, WarehouseError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = product_ids.iter().map(|p| p.as_str()).collect();
        let rows: Vec<(String, Option<i64>)> = sqlx::query_as(
            "SELECT sr.product_id, SUM(sr.quantity) FROM stock_rows sr \
             JOIN warehouses w ON w.id = sr.warehouse_id \
             WHERE sr.product_id = ANY($1) AND w.is_active = true \
             GROUP BY sr.product_id",
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut on_hand: std::collections::HashMap<String, u32> = rows
            .into_iter()
            .map(|(product_id, sum)| (product_id, sum.unwrap_or(0) as u32))
            .collect();

        Ok(product_ids
            .iter()
            .map(|id| StockSummary {
                product_id: id.clone(),
                on_hand: on_hand.remove(id.as_str()).unwrap_or(0),
            })
            .collect())
    }

    async fn get_warehouse_by_shop_id(&self, shop_id: Uuid) -> Result<Vec<Warehouse>, WarehouseError> {
        let rows: Vec<(Uuid, Uuid, String, bool)> = sqlx::query_as(
            "SELECT id, shop_id, name, is_active FROM warehouses WHERE shop_id = $1",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, shop_id, name, is_active)| Warehouse {
                id,
                shop_id,
                name,
                is_active,
            })
            .collect())
    }
}
