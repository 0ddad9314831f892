//! External service gateways and in-memory implementations for saga steps.

pub mod payment;
pub mod warehouse;

pub use payment::{HttpPaymentGateway, InMemoryPaymentGateway, PaymentGateway};
pub use warehouse::{HttpWarehouseGateway, InMemoryWarehouseGateway, ReservationItem, WarehouseGateway};
