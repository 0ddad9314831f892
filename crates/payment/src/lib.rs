//! Payment ledger: transaction creation, out-of-band finalization, the
//! order-service callback, and expiry sweeping.
//!
//! Payments are plain relational rows, not event-sourced: a transaction is
//! created once in `WAITING`, finalized exactly once to `PAID`/`FAILED`
//! (or rolled back to `CANCELLED` while still waiting), and that single
//! transition is the whole lifecycle.

pub mod callback;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod sweeper;
pub mod txid;

pub use callback::{CallbackClient, CallbackError};
pub use error::PaymentError;
pub use in_memory::InMemoryPaymentRepository;
pub use models::{Payment, PaymentStatus};
pub use postgres::PostgresPaymentRepository;
pub use repository::PaymentRepository;
pub use service::PaymentService;
