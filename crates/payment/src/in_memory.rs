//! In-memory payment repository, for tests and benches.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::Money;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::PaymentError;
use crate::models::{Payment, PaymentStatus};
use crate::repository::PaymentRepository;

/// In-memory payment store, keyed by transaction ID.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: Mutex<HashMap<String, Payment>>,
}

impl InMemoryPaymentRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(
        &self,
        order_id: Uuid,
        transaction_id: &str,
        total_amount: &Money,
    ) -> Result<Payment, PaymentError> {
        let mut payments = self.payments.lock().await;
        if payments.contains_key(transaction_id) {
            return Err(PaymentError::IdGenerationExhausted { attempts: 1 });
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            order_id,
            transaction_id: transaction_id.to_string(),
            status: PaymentStatus::Waiting,
            total_amount: total_amount.clone(),
            created_at: now,
            updated_at: now,
        };
        payments.insert(transaction_id.to_string(), payment.clone());
        Ok(payment)
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, PaymentError> {
        let payments = self.payments.lock().await;
        Ok(payments.get(transaction_id).cloned())
    }

    async fn set_status(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> Result<Payment, PaymentError> {
        let mut payments = self.payments.lock().await;
        let payment = payments
            .get_mut(transaction_id)
            .ok_or_else(|| PaymentError::NotFound(transaction_id.to_string()))?;
        payment.status = status;
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }

    async fn find_expired_waiting(
        &self,
        threshold_seconds: i64,
    ) -> Result<Vec<Payment>, PaymentError> {
        let payments = self.payments.lock().await;
        let now = Utc::now();
        Ok(payments
            .values()
            .filter(|p| {
                p.status == PaymentStatus::Waiting
                    && (now - p.created_at).num_seconds() > threshold_seconds
            })
            .cloned()
            .collect())
    }
}
