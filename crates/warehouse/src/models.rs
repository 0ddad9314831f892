//! Warehouse domain models.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical (or logical) warehouse location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    /// Inactive warehouses are excluded from on-hand summation and new
    /// reservations; existing reservations against their rows remain
    /// valid for release and confirm.
    pub is_active: bool,
}

/// A row of stock for one product in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// The lifecycle of a stock reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Stock decremented from the row; held against an order awaiting
    /// payment.
    Reserved,
    /// Released back to the row: compensation, or sweeper expiry.
    Released,
    /// Confirmed after a successful payment: the row is not restored.
    Confirmed,
}

/// A record of stock allocated from a specific row to a specific order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub stock_row_id: Uuid,
    pub product_id: ProductId,
    pub quantity: u32,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

/// A requested line in a `ReserveStock` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequestLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The current on-hand summary for a product across active warehouses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub product_id: ProductId,
    pub on_hand: u32,
}
