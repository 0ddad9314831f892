//! Domain layer for the checkout system.
//!
//! This crate provides the core domain abstractions including:
//! - `Aggregate` trait for event-sourced entities
//! - `DomainEvent` trait for domain events
//! - `Command` trait and `CommandHandler` for command processing
//! - The `Order` aggregate and its status state machine
//! - Non-event-sourced `Cart` and `OrderIndex` repositories

pub mod aggregate;
pub mod cart;
pub mod command;
pub mod error;
pub mod order;
pub mod order_index;

pub use aggregate::{Aggregate, DomainEvent};
pub use cart::{
    CatalogProduct, Cart, CartError, CartItem, CartRepository, InMemoryCartRepository,
    PostgresCartRepository,
};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use order::{
    CompleteOrder, CreateOrder, FailOrder, MarkStockReserved, Order, OrderError, OrderEvent,
    OrderItem, OrderService, OrderState,
};
pub use order_index::{InMemoryOrderIndex, OrderIndex, PostgresOrderIndex};
