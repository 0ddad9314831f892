//! Read model views for the CQRS query side.

pub mod order_list;

pub use order_list::{OrderListFilter, OrderListView, OrderSummary};
