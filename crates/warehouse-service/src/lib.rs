//! HTTP API server with observability for the warehouse stock ledger.
//!
//! Wires a `WarehouseRepository` (in-memory or Postgres) behind a
//! `WarehouseService` facade and one Axum router: stock lookup,
//! reservation lifecycle (`reserve`/`release`/`confirm`), and the
//! directory/admin operations (`transfer`, `set_status`, `by_shop`).

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use warehouse::WarehouseService;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(service: Arc<WarehouseService>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/stocks", get(routes::stocks::get))
        .route("/reservations", post(routes::reservations::reserve))
        .route("/reservations/{order_id}/release", post(routes::reservations::release))
        .route("/reservations/{order_id}/confirm", post(routes::reservations::confirm))
        .route("/transfers", post(routes::warehouses::transfer))
        .route("/warehouses/{id}/status", post(routes::warehouses::set_status))
        .route("/shops/{shop_id}/warehouses", get(routes::warehouses::by_shop))
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
