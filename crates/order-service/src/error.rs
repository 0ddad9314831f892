//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::MoneyError;
use domain::cart::CartError;
use domain::{DomainError, OrderError};
use event_store::EventStoreError;
use saga::SagaError;

use crate::clients::{CatalogError, StockClientError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The caller reused an idempotency key with a different request body,
    /// or the order index backing store failed.
    Conflict(String),
    /// Missing or malformed `x-user-id` header.
    Unauthenticated(String),
    /// Caller is authenticated but not the owner of the requested resource.
    Forbidden(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Saga execution error.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Order(order_err) => match order_err {
            OrderError::InvalidStateTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
            OrderError::AlreadyCreated => (StatusCode::CONFLICT, err.to_string()),
            OrderError::InvalidQuantity { .. }
            | OrderError::NoItems
            | OrderError::CurrencyMismatch { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        DomainError::Cart(cart_err) => match cart_err {
            CartError::ExceedsAvailableStock { .. } => (StatusCode::CONFLICT, err.to_string()),
            CartError::ProductNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            // An empty cart has nothing to check out; treated as "no cart
            // to act on" rather than a malformed request.
            CartError::Empty => (StatusCode::NOT_FOUND, err.to_string()),
            CartError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        },
        DomainError::AggregateNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::OrderIndex(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        SagaError::OrderNotReady(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SagaError::InvalidState { .. } => (StatusCode::CONFLICT, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Domain(DomainError::Cart(err))
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(msg) => ApiError::NotFound(msg),
            CatalogError::Transport(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<StockClientError> for ApiError {
    fn from(err: StockClientError) -> Self {
        match err {
            StockClientError::Transport(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<MoneyError> for ApiError {
    fn from(err: MoneyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
