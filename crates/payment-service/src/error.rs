//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use payment::PaymentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Payment domain error.
    Payment(PaymentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Payment(err) => payment_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match &err {
        PaymentError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        PaymentError::CurrencyMismatch { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        PaymentError::NotWaiting { .. } => (StatusCode::CONFLICT, err.to_string()),
        PaymentError::IdGenerationExhausted { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        PaymentError::Storage(msg) => {
            tracing::error!(error = %msg, "payment storage error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}
