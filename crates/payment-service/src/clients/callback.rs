//! `CallbackClient` over HTTP, talking to the order-service binary.

use async_trait::async_trait;
use payment::{CallbackClient, CallbackError, PaymentStatus};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CallbackTransactionRequest<'a> {
    transaction_id: &'a str,
    payment_status: &'static str,
}

/// Posts `CallbackTransaction(transactionId, status)` to the order service's
/// `/orders/callback` endpoint.
#[derive(Clone)]
pub struct HttpCallbackClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCallbackClient {
    /// Creates a new client against `base_url` (e.g.
    /// `http://order-service:3000`).
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CallbackClient for HttpCallbackClient {
    #[tracing::instrument(skip(self))]
    async fn callback_transaction(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> Result<(), CallbackError> {
        let response = self
            .client
            .post(format!("{}/orders/callback", self.base_url))
            .json(&CallbackTransactionRequest {
                transaction_id,
                payment_status: status.as_str(),
            })
            .send()
            .await
            .map_err(|e| CallbackError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }

        if response.status().is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallbackError::Rejected(body));
        }

        let body = response.text().await.unwrap_or_default();
        Err(CallbackError::Transport(body))
    }
}
