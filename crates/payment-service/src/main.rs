//! Payment service entry point.

use std::sync::Arc;

use payment::{InMemoryPaymentRepository, PaymentRepository, PaymentService, PostgresPaymentRepository};
use payment_service::clients::callback::HttpCallbackClient;
use payment_service::config::Config;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(?config, "loaded configuration");

    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let repo: Arc<dyn PaymentRepository> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let repo = PostgresPaymentRepository::new(pool);
            repo.run_migrations().await.expect("failed to run migrations");
            Arc::new(repo)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, running with an in-memory payment repository");
            Arc::new(InMemoryPaymentRepository::new())
        }
    };

    let callback = Arc::new(HttpCallbackClient::new(
        reqwest::Client::new(),
        config.order_service_url.clone(),
    ));

    let service = Arc::new(PaymentService::new(repo, callback));

    tokio::spawn(payment::sweeper::run(
        (*service).clone(),
        config.payment_sweep_threshold.as_secs() as i64,
    ));

    let app = payment_service::create_app(service, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting payment service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
