//! HTTP API server with observability for the payment ledger.
//!
//! Wires a `PaymentRepository` (in-memory or Postgres) and a
//! `CallbackClient` behind a `PaymentService` facade and one Axum router:
//! transaction creation, finalization, rollback, and lookup.

pub mod clients;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::PaymentService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(service: Arc<PaymentService>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/payments", post(routes::payments::process))
        .route("/payments/{transaction_id}", get(routes::payments::get))
        .route("/payments/{transaction_id}/update", post(routes::payments::update))
        .route("/payments/{transaction_id}/rollback", post(routes::payments::rollback))
        .with_state(service)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
