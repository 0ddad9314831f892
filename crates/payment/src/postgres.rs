//! PostgreSQL-backed payment repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Money;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::PaymentError;
use crate::models::{Payment, PaymentStatus};
use crate::repository::PaymentRepository;

fn db_err(e: sqlx::Error) -> PaymentError {
    PaymentError::Storage(e.to_string())
}

fn row_to_payment(row: PgRow) -> Result<Payment, PaymentError> {
    let status_str: String = row.try_get("status").map_err(db_err)?;
    let units: i64 = row.try_get("total_amount_units").map_err(db_err)?;
    let currency: String = row.try_get("total_amount_currency").map_err(db_err)?;

    Ok(Payment {
        id: row.try_get("id").map_err(db_err)?,
        order_id: row.try_get("order_id").map_err(db_err)?,
        transaction_id: row.try_get("transaction_id").map_err(db_err)?,
        status: status_str
            .parse()
            .map_err(|_| PaymentError::Storage(format!("invalid payment status: {status_str}")))?,
        total_amount: Money::new(units, currency),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(db_err)?,
    })
}

/// PostgreSQL-backed payment store.
#[derive(Clone)]
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    /// Creates a new repository backed by `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the crate-local database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn create(
        &self,
        order_id: Uuid,
        transaction_id: &str,
        total_amount: &Money,
    ) -> Result<Payment, PaymentError> {
        let row = sqlx::query(
            "INSERT INTO payments \
             (id, order_id, transaction_id, status, total_amount_units, total_amount_currency) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, order_id, transaction_id, status, total_amount_units, \
                       total_amount_currency, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(transaction_id)
        .bind(PaymentStatus::Waiting.as_str())
        .bind(total_amount.units)
        .bind(&total_amount.currency_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_e) = e
                && db_e.is_unique_violation()
            {
                return PaymentError::IdGenerationExhausted { attempts: 1 };
            }
            db_err(e)
        })?;

        row_to_payment(row)
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, PaymentError> {
        let row = sqlx::query(
            "SELECT id, order_id, transaction_id, status, total_amount_units, \
             total_amount_currency, created_at, updated_at \
             FROM payments WHERE transaction_id = $1",
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(row_to_payment).transpose()
    }

    async fn set_status(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> Result<Payment, PaymentError> {
        let row = sqlx::query(
            "UPDATE payments SET status = $1, updated_at = now() WHERE transaction_id = $2 \
             RETURNING id, order_id, transaction_id, status, total_amount_units, \
                       total_amount_currency, created_at, updated_at",
        )
        .bind(status.as_str())
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| PaymentError::NotFound(transaction_id.to_string()))?;

        row_to_payment(row)
    }

    async fn find_expired_waiting(
        &self,
        threshold_seconds: i64,
    ) -> Result<Vec<Payment>, PaymentError> {
        let rows = sqlx::query(
            "SELECT id, order_id, transaction_id, status, total_amount_units, \
             total_amount_currency, created_at, updated_at \
             FROM payments \
             WHERE status = 'WAITING' AND created_at < now() - make_interval(secs => $1)",
        )
        .bind(threshold_seconds as f64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(row_to_payment).collect()
    }
}
