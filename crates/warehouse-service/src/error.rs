//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use warehouse::WarehouseError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Warehouse domain error.
    Warehouse(WarehouseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Warehouse(err) => warehouse_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn warehouse_error_to_response(err: WarehouseError) -> (StatusCode, String) {
    match &err {
        WarehouseError::EmptyStock { .. } | WarehouseError::InsufficientStock { .. } => {
            (StatusCode::PRECONDITION_FAILED, err.to_string())
        }
        WarehouseError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        WarehouseError::Storage(msg) => {
            tracing::error!(error = %msg, "warehouse storage error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<WarehouseError> for ApiError {
    fn from(err: WarehouseError) -> Self {
        ApiError::Warehouse(err)
    }
}
