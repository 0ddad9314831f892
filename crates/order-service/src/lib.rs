//! HTTP API server with observability for the checkout saga orchestrator.
//!
//! Wires the order aggregate's event store, the saga coordinator, the cart
//! and order-index repositories, and the `OrderListView` read model behind
//! one Axum router, and spawns the expiry sweeper alongside it.

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod routes;
pub mod sweeper;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{CartRepository, InMemoryCartRepository, InMemoryOrderIndex, OrderIndex, OrderService};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{OrderListView, Projection, ProjectionProcessor};
use saga::{InMemoryPaymentGateway, InMemoryWarehouseGateway, PaymentGateway, SagaCoordinator, WarehouseGateway};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use clients::{CatalogClient, InMemoryCatalogClient, InMemoryStockClient, WarehouseStockClient};

/// Shared application state for every route handler.
///
/// Generic over the event store and the two saga collaborators so the same
/// router wiring serves both the in-memory default state and a production
/// deployment backed by Postgres and the real warehouse/payment services.
pub struct AppState<S, W, P>
where
    S: EventStore,
    W: WarehouseGateway,
    P: PaymentGateway,
{
    pub order_service: OrderService<S>,
    pub saga_coordinator: SagaCoordinator<S, W, P>,
    /// Kept alongside the saga coordinator so the expiry sweeper can call
    /// `release_stock` directly without going through a saga run.
    pub warehouse: W,
    pub order_index: Arc<dyn OrderIndex>,
    pub cart_repository: Arc<dyn CartRepository>,
    pub catalog_client: Arc<dyn CatalogClient>,
    pub stock_client: Arc<dyn WarehouseStockClient>,
    pub order_list: OrderListView,
    pub event_store: S,
    /// Delivers newly-appended events to `order_list`. Run after every
    /// mutating call (including the saga's own `mark_stock_reserved`/`fail`
    /// writes, which happen outside any route handler) so a response
    /// always reflects the order's just-written state.
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, W, P>(state: Arc<AppState<S, W, P>>, metrics_handle: PrometheusHandle) -> Router
where
    S: EventStore + Clone + 'static,
    W: WarehouseGateway + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, W, P>))
        .route("/orders", get(routes::orders::list::<S, W, P>))
        .route("/orders/{id}", get(routes::orders::get::<S, W, P>))
        .route(
            "/orders/callback",
            post(routes::orders::callback_transaction::<S, W, P>),
        )
        .route("/cart/items", post(routes::cart::add_item::<S, W, P>))
        .route("/cart", get(routes::cart::get_cart::<S, W, P>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: an in-memory warehouse gateway and
/// payment gateway, an in-memory order index, cart repository, and catalog
/// client. Suited to local development and as the base for integration
/// tests, which seed the in-memory collaborators directly.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
) -> Arc<AppState<S, InMemoryWarehouseGateway, InMemoryPaymentGateway>> {
    let warehouse = InMemoryWarehouseGateway::new();
    let payment = InMemoryPaymentGateway::new();

    let order_service = OrderService::new(event_store.clone());
    let saga_coordinator = SagaCoordinator::new(event_store.clone(), warehouse.clone(), payment);

    let order_list = OrderListView::new();

    let mut processor = ProjectionProcessor::new(event_store.clone());
    processor.register(Box::new(order_list.clone()) as Box<dyn Projection>);
    let projection_processor = Arc::new(processor);

    Arc::new(AppState {
        order_service,
        saga_coordinator,
        warehouse,
        order_index: Arc::new(InMemoryOrderIndex::new()),
        cart_repository: Arc::new(InMemoryCartRepository::new()),
        catalog_client: Arc::new(InMemoryCatalogClient::new()),
        stock_client: Arc::new(InMemoryStockClient::new()),
        order_list,
        event_store,
        projection_processor,
    })
}
