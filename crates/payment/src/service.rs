//! Payment service: transaction lifecycle, finalization, and the callback
//! to the order service.

use std::sync::Arc;

use common::Money;

use crate::callback::CallbackClient;
use crate::error::PaymentError;
use crate::models::{Payment, PaymentStatus};
use crate::repository::PaymentRepository;
use crate::txid;

const MAX_ID_GENERATION_ATTEMPTS: u32 = 5;

/// Orchestrates the payment ledger and the order-service callback.
#[derive(Clone)]
pub struct PaymentService {
    repo: Arc<dyn PaymentRepository>,
    callback: Arc<dyn CallbackClient>,
}

impl PaymentService {
    /// Creates a new service over the given repository and callback
    /// client.
    pub fn new(repo: Arc<dyn PaymentRepository>, callback: Arc<dyn CallbackClient>) -> Self {
        Self { repo, callback }
    }

    /// Creates a `WAITING` payment with a freshly generated transaction
    /// ID, retrying on a generation collision.
    #[tracing::instrument(skip(self, order_id, total_amount))]
    pub async fn process_payment(
        &self,
        order_id: uuid::Uuid,
        total_amount: &Money,
    ) -> Result<Payment, PaymentError> {
        metrics::counter!("payment_process_total").increment(1);

        for _ in 0..MAX_ID_GENERATION_ATTEMPTS {
            let transaction_id = txid::generate();
            match self.repo.create(order_id, &transaction_id, total_amount).await {
                Ok(payment) => return Ok(payment),
                Err(PaymentError::IdGenerationExhausted { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(PaymentError::IdGenerationExhausted {
            attempts: MAX_ID_GENERATION_ATTEMPTS,
        })
    }

    /// Finalizes a payment against the caller's submitted amount, then
    /// posts the callback.
    ///
    /// Idempotent: a payment no longer `WAITING` is returned unchanged
    /// without re-triggering the callback. The local status write always
    /// commits before the callback is attempted; a callback failure is
    /// surfaced to the caller but does not roll back the status — retries
    /// are the caller's responsibility and the callback is safe to run
    /// more than once on the order side.
    #[tracing::instrument(skip(self, submitted_amount))]
    pub async fn update_payment(
        &self,
        transaction_id: &str,
        submitted_amount: &Money,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .repo
            .find_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(transaction_id.to_string()))?;

        if payment.status != PaymentStatus::Waiting {
            return Ok(payment);
        }

        if payment.total_amount.currency_code != submitted_amount.currency_code {
            return Err(PaymentError::CurrencyMismatch {
                stored: payment.total_amount.currency_code.clone(),
                submitted: submitted_amount.currency_code.clone(),
            });
        }

        let new_status = if payment.total_amount.units == submitted_amount.units {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Failed
        };

        let updated = self.repo.set_status(transaction_id, new_status).await?;

        metrics::counter!("payment_finalized_total", "status" => new_status.as_str()).increment(1);

        self.callback
            .callback_transaction(transaction_id, new_status)
            .await
            .map_err(|e| PaymentError::Storage(e.to_string()))?;

        Ok(updated)
    }

    /// Rolls a `WAITING` payment back to `CANCELLED`.
    #[tracing::instrument(skip(self))]
    pub async fn rollback_payment(&self, transaction_id: &str) -> Result<Payment, PaymentError> {
        let payment = self
            .repo
            .find_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(transaction_id.to_string()))?;

        if payment.status != PaymentStatus::Waiting {
            return Err(PaymentError::NotWaiting {
                transaction_id: transaction_id.to_string(),
            });
        }

        self.repo.set_status(transaction_id, PaymentStatus::Cancelled).await
    }

    /// Reads a payment by transaction ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment(&self, transaction_id: &str) -> Result<Payment, PaymentError> {
        self.repo
            .find_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(transaction_id.to_string()))
    }

    /// Returns every `WAITING` payment older than `threshold_seconds`, for
    /// the expiry sweeper.
    pub async fn find_expired_waiting(
        &self,
        threshold_seconds: i64,
    ) -> Result<Vec<Payment>, PaymentError> {
        self.repo.find_expired_waiting(threshold_seconds).await
    }

    /// Sweeps a single expired payment to `status` and posts its callback.
    /// Used only by the expiry sweeper, which has already established the
    /// payment is `WAITING`.
    #[tracing::instrument(skip(self))]
    pub async fn expire_payment(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> Result<(), PaymentError> {
        self.repo.set_status(transaction_id, status).await?;
        self.callback
            .callback_transaction(transaction_id, status)
            .await
            .map_err(|e| PaymentError::Storage(e.to_string()))
    }
}
