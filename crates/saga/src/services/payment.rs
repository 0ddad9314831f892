//! Payment gateway trait, its HTTP implementation, and an in-memory double
//! for tests.
//!
//! Like the warehouse gateway, the payment service is reached over RPC.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::error::SagaError;

/// Gateway to the payment service's transaction-creation operation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initiates a payment for the order's total, returning the generated
    /// transaction ID.
    async fn process_payment(
        &self,
        order_id: AggregateId,
        total_amount: &Money,
    ) -> Result<String, SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    transactions: HashMap<String, (AggregateId, Money)>,
    next_id: u32,
    fail_on_process: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on the next `process_payment` call.
    pub fn set_fail_on_process(&self, fail: bool) {
        self.state.write().unwrap().fail_on_process = fail;
    }

    /// Returns the number of transactions created.
    pub fn transaction_count(&self) -> usize {
        self.state.read().unwrap().transactions.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn process_payment(
        &self,
        order_id: AggregateId,
        total_amount: &Money,
    ) -> Result<String, SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_process {
            return Err(SagaError::PaymentService("payment declined".to_string()));
        }

        state.next_id += 1;
        let transaction_id = format!("TXN{:05}", state.next_id);
        state
            .transactions
            .insert(transaction_id.clone(), (order_id, total_amount.clone()));

        Ok(transaction_id)
    }
}

#[derive(Debug, Serialize)]
struct ProcessPaymentRequest {
    order_id: AggregateId,
    total_amount: Money,
}

#[derive(Debug, Deserialize)]
struct ProcessPaymentResponse {
    transaction_id: String,
}

/// `PaymentGateway` over HTTP, talking to the payment-service binary.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    /// Creates a new gateway against `base_url` (e.g.
    /// `http://payment-service:8082`).
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[tracing::instrument(skip(self, total_amount))]
    async fn process_payment(
        &self,
        order_id: AggregateId,
        total_amount: &Money,
    ) -> Result<String, SagaError> {
        let response = self
            .client
            .post(format!("{}/payments", self.base_url))
            .json(&ProcessPaymentRequest {
                order_id,
                total_amount: total_amount.clone(),
            })
            .send()
            .await
            .map_err(|e| SagaError::PaymentService(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SagaError::PaymentService(body));
        }

        let parsed: ProcessPaymentResponse = response
            .json()
            .await
            .map_err(|e| SagaError::PaymentService(e.to_string()))?;

        Ok(parsed.transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn process_payment_returns_a_transaction_id() {
        let gateway = InMemoryPaymentGateway::new();
        let order_id = AggregateId::new();

        let txn = gateway
            .process_payment(order_id, &Money::new(5000, "USD"))
            .await
            .unwrap();

        assert!(txn.starts_with("TXN"));
        assert_eq!(gateway.transaction_count(), 1);
    }

    #[tokio::test]
    async fn process_payment_can_be_configured_to_fail() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_process(true);

        let result = gateway
            .process_payment(AggregateId::new(), &Money::new(5000, "USD"))
            .await;

        assert!(result.is_err());
        assert_eq!(gateway.transaction_count(), 0);
    }
}
