//! The payment repository trait: creation, finalization, rollback, and
//! expiry-sweeper queries.

use async_trait::async_trait;
use common::Money;
use uuid::Uuid;

use crate::error::PaymentError;
use crate::models::{Payment, PaymentStatus};

/// Storage operations for payment transactions.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persists a new payment in `WAITING`, keyed by `transaction_id`.
    /// Implementations should surface a uniqueness-constraint violation on
    /// `transaction_id` distinctly so the caller can retry with a freshly
    /// generated one.
    async fn create(
        &self,
        order_id: Uuid,
        transaction_id: &str,
        total_amount: &Money,
    ) -> Result<Payment, PaymentError>;

    /// Looks up a payment by its transaction ID.
    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, PaymentError>;

    /// Unconditionally overwrites a payment's status, returning the updated
    /// row. Callers are responsible for enforcing any precondition (e.g.
    /// `WAITING`-only) before calling this.
    async fn set_status(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> Result<Payment, PaymentError>;

    /// Returns every payment still `WAITING` whose `created_at` is older
    /// than `threshold_seconds`, for the expiry sweeper.
    async fn find_expired_waiting(
        &self,
        threshold_seconds: i64,
    ) -> Result<Vec<Payment>, PaymentError>;
}
