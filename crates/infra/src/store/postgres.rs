//! Postgres-backed order store.
//!
//! Orders are persisted document-style: scalar columns for the fields the
//! queries touch, plus the full tracking history as JSONB. `save` is an
//! upsert on the primary key, which is what gives the service its
//! per-document atomicity.
//!
//! Uses the SQLx runtime query API; rows are rehydrated through
//! [`Order::from_parts`] so corrupt records surface as `StoreError::Corrupt`
//! instead of leaking invalid entities into the domain.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::instrument;

use ordertrack_core::{CustomerId, OrderId};
use ordertrack_orders::{
    Order, OrderSearchQuery, OrderStatus, SortDirection, SortField, TrackingEvent,
};
use ordertrack_tracking::{OrderStore, StoreError};

const SELECT_COLUMNS: &str = "id, customer_id, status, created_at, updated_at, history";

/// Postgres order store.
///
/// Thread-safe via the SQLx connection pool; cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the orders table and the index backing the stale scan.
    ///
    /// Idempotent; called once at startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id          TEXT PRIMARY KEY,
                customer_id TEXT        NOT NULL,
                status      TEXT        NOT NULL,
                created_at  TIMESTAMPTZ NOT NULL,
                updated_at  TIMESTAMPTZ NOT NULL,
                history     JSONB       NOT NULL
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_orders_status_updated_at ON orders (status, updated_at)",
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;

        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.map(|r| order_from_row(&r)).transpose()
    }

    #[instrument(skip(self, order), fields(order_id = %order.id(), status = %order.status()))]
    async fn save(&self, order: &Order) -> Result<Order, StoreError> {
        let history = serde_json::to_value(order.history())
            .map_err(|e| StoreError::Backend(format!("history serialization failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, created_at, updated_at, history)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                customer_id = EXCLUDED.customer_id,
                status      = EXCLUDED.status,
                updated_at  = EXCLUDED.updated_at,
                history     = EXCLUDED.history
            "#,
        )
        .bind(order.id().as_str())
        .bind(order.customer_id().as_str())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(history)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save", e))?;

        Ok(order.clone())
    }

    #[instrument(skip(self))]
    async fn find_shipped_before(&self, before: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE status = $1 AND updated_at < $2"
        ))
        .bind(OrderStatus::Shipped.as_str())
        .bind(before)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_shipped_before", e))?;

        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self, query))]
    async fn find_by_query(&self, query: &OrderSearchQuery) -> Result<Vec<Order>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM orders WHERE TRUE"));

        if let Some(needle) = query.order_id_contains() {
            qb.push(" AND id ILIKE ");
            qb.push_bind(like_pattern(needle));
        }
        if let Some(needle) = query.customer_id_contains() {
            qb.push(" AND customer_id ILIKE ");
            qb.push_bind(like_pattern(needle));
        }
        if let Some(status) = query.status() {
            qb.push(" AND status = ");
            qb.push_bind(status.as_str());
        }
        if let Some(from) = query.updated_from() {
            qb.push(" AND updated_at >= ");
            qb.push_bind(from);
        }
        if let Some(to) = query.updated_to() {
            qb.push(" AND updated_at <= ");
            qb.push_bind(to);
        }

        let column = match query.sort_by() {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        };
        let direction = match query.sort_dir() {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        // Secondary sort on id keeps paging deterministic for equal timestamps.
        qb.push(format!(" ORDER BY {column} {direction}, id ASC"));

        qb.push(" LIMIT ");
        qb.push_bind(i64::from(query.size()));
        qb.push(" OFFSET ");
        qb.push_bind(i64::from(query.page()) * i64::from(query.size()));

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_query", e))?;

        rows.iter().map(order_from_row).collect()
    }
}

/// `%needle%` with LIKE metacharacters in the needle escaped (the default
/// backslash escape applies).
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("order_from_row", e))?;
    let customer_id: String = row
        .try_get("customer_id")
        .map_err(|e| map_sqlx_error("order_from_row", e))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| map_sqlx_error("order_from_row", e))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| map_sqlx_error("order_from_row", e))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| map_sqlx_error("order_from_row", e))?;
    let history: serde_json::Value = row
        .try_get("history")
        .map_err(|e| map_sqlx_error("order_from_row", e))?;

    let history: Vec<TrackingEvent> = serde_json::from_value(history)
        .map_err(|e| StoreError::Corrupt(format!("order {id}: bad history json: {e}")))?;
    let status: OrderStatus = status
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("order {id}: {e}")))?;
    let order_id = OrderId::new(id.clone())
        .map_err(|e| StoreError::Corrupt(format!("order {id}: {e}")))?;
    let customer_id = CustomerId::new(customer_id)
        .map_err(|e| StoreError::Corrupt(format!("order {id}: {e}")))?;

    Order::from_parts(order_id, customer_id, status, created_at, updated_at, history)
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("{operation}: {e}"))
}


