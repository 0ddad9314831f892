//! Payment errors.

use thiserror::Error;

/// Errors from payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// No payment exists for the given transaction ID.
    #[error("payment not found for transaction {0}")]
    NotFound(String),

    /// `UpdatePayment`'s submitted currency does not match the payment's
    /// stored currency.
    #[error("currency mismatch: payment is {stored}, submitted {submitted}")]
    CurrencyMismatch { stored: String, submitted: String },

    /// `RollbackPayment` was called on a payment no longer `WAITING`.
    #[error("payment {transaction_id} is not waiting, cannot roll back")]
    NotWaiting { transaction_id: String },

    /// The generated transaction ID collided with an existing one after
    /// exhausting retries.
    #[error("failed to generate a unique transaction id after {attempts} attempts")]
    IdGenerationExhausted { attempts: u32 },

    /// Underlying storage failure.
    #[error("payment storage error: {0}")]
    Storage(String),
}
