//! Idempotency-key lookup for `CreateOrder`.
//!
//! Orders are event-sourced, but idempotency-key lookup needs to be a
//! simple point read keyed on `(user_id, idempotency_key)` rather than a
//! replay — so it lives in a small plain table alongside the event store,
//! not as an aggregate.

use async_trait::async_trait;
use common::{AggregateId, UserId};
use sqlx::PgPool;

/// Looks up and records the order created for a given idempotency key.
#[async_trait]
pub trait OrderIndex: Send + Sync {
    /// Returns the order ID already created for this `(user_id,
    /// idempotency_key)` pair, if `CreateOrder` was already called with it.
    async fn find(
        &self,
        user_id: UserId,
        idempotency_key: &str,
    ) -> Result<Option<AggregateId>, String>;

    /// Records that `order_id` was created for this `(user_id,
    /// idempotency_key)` pair. Must be called in the same transaction as
    /// the order's initial event append.
    async fn record(
        &self,
        user_id: UserId,
        idempotency_key: &str,
        order_id: AggregateId,
    ) -> Result<(), String>;
}

/// In-memory order index, for tests.
#[derive(Debug, Default)]
pub struct InMemoryOrderIndex {
    entries: tokio::sync::Mutex<std::collections::HashMap<(UserId, String), AggregateId>>,
}

impl InMemoryOrderIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderIndex for InMemoryOrderIndex {
    async fn find(
        &self,
        user_id: UserId,
        idempotency_key: &str,
    ) -> Result<Option<AggregateId>, String> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&(user_id, idempotency_key.to_string())).copied())
    }

    async fn record(
        &self,
        user_id: UserId,
        idempotency_key: &str,
        order_id: AggregateId,
    ) -> Result<(), String> {
        let mut entries = self.entries.lock().await;
        entries
            .entry((user_id, idempotency_key.to_string()))
            .or_insert(order_id);
        Ok(())
    }
}

/// PostgreSQL-backed order index, keyed by a unique `(user_id,
/// idempotency_key)` constraint.
#[derive(Clone)]
pub struct PostgresOrderIndex {
    pool: PgPool,
}

impl PostgresOrderIndex {
    /// Creates a new index backed by `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderIndex for PostgresOrderIndex {
    async fn find(
        &self,
        user_id: UserId,
        idempotency_key: &str,
    ) -> Result<Option<AggregateId>, String> {
        let row: Option<(uuid::Uuid,)> = sqlx::query_as(
            "SELECT order_id FROM order_index WHERE user_id = $1 AND idempotency_key = $2",
        )
        .bind(user_id.as_uuid())
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.to_string())?;

        Ok(row.map(|(id,)| AggregateId::from_uuid(id)))
    }

    async fn record(
        &self,
        user_id: UserId,
        idempotency_key: &str,
        order_id: AggregateId,
    ) -> Result<(), String> {
        sqlx::query(
            "INSERT INTO order_index (user_id, idempotency_key, order_id) \
             VALUES ($1, $2, $3) ON CONFLICT (user_id, idempotency_key) DO NOTHING",
        )
        .bind(user_id.as_uuid())
        .bind(idempotency_key)
        .bind(order_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| e.to_string())?;

        Ok(())
    }
}
