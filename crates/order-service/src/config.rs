//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string for the event store, cart,
///   and order-index tables (no default; required to run against Postgres).
/// - `WAREHOUSE_SERVICE_URL` — base URL of the warehouse service (default:
///   `"http://localhost:8081"`)
/// - `PAYMENT_SERVICE_URL` — base URL of the payment service (default:
///   `"http://localhost:8082"`)
/// - `ORDER_SWEEP_TICK_SECS` — sweeper tick interval (default: 10)
/// - `ORDER_SWEEP_THRESHOLD_SECS` — age threshold past which a
///   `PENDING`/`STOCK_RESERVED` order is swept (default: 180, i.e. 3 min)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub warehouse_service_url: String,
    pub payment_service_url: String,
    pub sweep_interval: Duration,
    pub max_time_to_be_expired: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            warehouse_service_url: std::env::var("WAREHOUSE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            payment_service_url: std::env::var("PAYMENT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),
            sweep_interval: std::env::var("ORDER_SWEEP_TICK_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(10)),
            max_time_to_be_expired: std::env::var("ORDER_SWEEP_THRESHOLD_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(180)),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            warehouse_service_url: "http://localhost:8081".to_string(),
            payment_service_url: "http://localhost:8082".to_string(),
            sweep_interval: Duration::from_secs(10),
            max_time_to_be_expired: Duration::from_secs(180),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.sweep_interval, Duration::from_secs(10));
        assert_eq!(config.max_time_to_be_expired, Duration::from_secs(180));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }
}
