//! Warehouse stock ledger and FIFO reservation allocator.
//!
//! Stock is plain relational state, not event-sourced: each product has one
//! or more append-only `StockRow`s per warehouse, and reservations are
//! recorded against the specific rows they were allocated from so release
//! and confirm can target exactly what was taken.

pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::WarehouseError;
pub use in_memory::InMemoryWarehouseRepository;
pub use models::{
    ReservationRecord, ReservationStatus, StockRequestLine, StockRow, StockSummary, Warehouse,
};
pub use postgres::PostgresWarehouseRepository;
pub use repository::WarehouseRepository;
pub use service::WarehouseService;
