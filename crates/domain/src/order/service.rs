//! Order service providing a simplified API for order operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{CompleteOrder, CreateOrder, FailOrder, MarkStockReserved, Order};

impl From<super::OrderError> for DomainError {
    fn from(e: super::OrderError) -> Self {
        DomainError::Order(e)
    }
}

/// Service for managing orders.
///
/// Wraps the command handler and exposes the four transitions a checkout
/// order goes through: creation, stock reservation, completion, and
/// failure.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
}

impl<S: EventStore + Clone> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<S: EventStore> OrderService<S> {
    /// Creates a new order service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    /// Creates a new order with its item snapshot and total.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn create_order(
        &self,
        cmd: CreateOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let order_id = cmd.order_id;
        let idempotency_key = cmd.idempotency_key.clone();
        let user_id = cmd.user_id;
        let items = cmd.items.clone();
        let total_amount = cmd.total_amount.clone();

        self.handler
            .execute(order_id, |order| {
                order.create(order_id, idempotency_key.clone(), user_id, items.clone(), total_amount.clone())
            })
            .await
    }

    /// Marks stock as reserved and payment as initiated.
    #[tracing::instrument(skip(self))]
    pub async fn mark_stock_reserved(
        &self,
        cmd: MarkStockReserved,
    ) -> Result<CommandResult<Order>, DomainError> {
        let transaction_id = cmd.transaction_id.clone();

        self.handler
            .execute(cmd.order_id, |order| {
                order.mark_stock_reserved(transaction_id.clone())
            })
            .await
    }

    /// Completes an order once its payment callback confirms success.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(
        &self,
        cmd: CompleteOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(cmd.order_id, |order| order.complete())
            .await
    }

    /// Fails an order: reservation failure, payment failure, compensation,
    /// or sweeper expiry.
    #[tracing::instrument(skip(self))]
    pub async fn fail_order(&self, cmd: FailOrder) -> Result<CommandResult<Order>, DomainError> {
        let reason = cmd.reason.clone();

        self.handler
            .execute(cmd.order_id, |order| order.fail(reason.clone()))
            .await
    }

    /// Loads an order by ID.
    ///
    /// Returns `None` if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id).await
    }
}
