//! Saga pattern implementation for the checkout saga.
//!
//! This crate provides the Saga Pattern for orchestrating a multi-step
//! distributed transaction with a compensating action on failure.
//!
//! The checkout saga follows these steps, once an order is persisted in
//! `PENDING`:
//! 1. Reserve stock
//! 2. Process payment
//!
//! If payment fails, the stock reserved in step 1 is released. If
//! reservation itself fails, there is nothing to compensate. Either failure
//! marks the order `FAILED`.

pub mod aggregate;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod order_fulfillment;
pub mod services;
pub mod state;

pub use aggregate::SagaInstance;
pub use coordinator::SagaCoordinator;
pub use error::SagaError;
pub use events::SagaEvent;
pub use services::{
    HttpPaymentGateway, HttpWarehouseGateway, InMemoryPaymentGateway, InMemoryWarehouseGateway,
    PaymentGateway, ReservationItem, WarehouseGateway,
};
pub use state::SagaState;
