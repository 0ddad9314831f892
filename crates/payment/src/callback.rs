//! The order-service callback boundary.
//!
//! `UpdatePayment` and the expiry sweeper both need to notify the order
//! service of a finalized payment once the local status write commits.
//! This crate only owns the payment ledger, so the actual RPC client
//! (reqwest-based) lives in the `payment-service` binary crate; this trait
//! is the seam it implements against.

use async_trait::async_trait;

use crate::models::PaymentStatus;

/// Errors from posting a callback to the order service.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The order service rejected the callback, e.g. because the order is
    /// no longer `STOCK_RESERVED`. Benign: the order side has already
    /// reached a terminal state through another path.
    #[error("order service rejected callback: {0}")]
    Rejected(String),

    /// The RPC itself failed (timeout, connection error, 5xx).
    #[error("callback transport error: {0}")]
    Transport(String),
}

/// Notifies the order service that a transaction reached a terminal
/// status.
#[async_trait]
pub trait CallbackClient: Send + Sync {
    /// Posts `CallbackTransaction(transactionId, status)` to the order
    /// service. Called once, synchronously, after the local payment status
    /// write commits; implementations do not retry.
    async fn callback_transaction(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> Result<(), CallbackError>;
}
