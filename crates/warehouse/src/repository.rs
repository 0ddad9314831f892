//! The warehouse repository trait: stock reservation, release, confirmation,
//! transfer, and warehouse administration.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::WarehouseError;
use crate::models::{StockRequestLine, StockSummary, Warehouse};

/// Storage and allocation operations for warehouse stock.
#[async_trait]
pub trait WarehouseRepository: Send + Sync {
    /// Reserves stock for every requested line, all-or-nothing, inside a
    /// single transaction. Allocation is FIFO by stock row `created_at`.
    /// Returns the IDs of the reservation records created.
    async fn reserve_stock(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        lines: &[StockRequestLine],
    ) -> Result<Vec<Uuid>, WarehouseError>;

    /// Releases every `RESERVED` reservation tied to `order_id` back to its
    /// stock row. Idempotent: already-released or already-confirmed
    /// records are skipped.
    async fn release_stock(&self, order_id: Uuid) -> Result<(), WarehouseError>;

    /// Confirms every `RESERVED` reservation tied to `order_id` without
    /// restoring stock row quantity.
    async fn confirm_stock(&self, order_id: Uuid) -> Result<(), WarehouseError>;

    /// Moves `quantity` of `product_id` from one warehouse to another in a
    /// single transaction.
    async fn transfer_stock(
        &self,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        product_id: &common::ProductId,
        quantity: u32,
    ) -> Result<(), WarehouseError>;

    /// Enables or disables a warehouse. Inactive warehouses are excluded
    /// from on-hand summation and new reservations.
    async fn set_warehouse_status(
        &self,
        warehouse_id: Uuid,
        is_active: bool,
    ) -> Result<(), WarehouseError>;

    /// Returns the current on-hand summary, across active warehouses, for
    /// each requested product.
    async fn get_stocks(
        &self,
        product_ids: &[common::ProductId],
    ) -> Result<Vec<StockSummary>, WarehouseError>;

    /// Returns the warehouse(s) belonging to a shop.
    async fn get_warehouse_by_shop_id(
        &self,
        shop_id: Uuid,
    ) -> Result<Vec<Warehouse>, WarehouseError>;
}
