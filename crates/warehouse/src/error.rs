//! Warehouse errors.

use thiserror::Error;

/// Errors from warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// No active warehouse carries any stock of the product at all.
    #[error("product {product_id} has no stock in any active warehouse")]
    EmptyStock { product_id: String },

    /// Active warehouses carry some stock, but less than requested.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// A referenced reservation, stock row, or warehouse does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying storage failure.
    #[error("warehouse storage error: {0}")]
    Storage(String),
}
