//! Postgres-backed document store.
//!
//! All tables share a single `documents` relation keyed by `(tbl, id)` with
//! the record body in a JSONB column. Field-equality filters compile to a
//! `doc->>` comparison so they can be served from an expression index when
//! one exists.

use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{Document, Filter, Store, StoreError, assign_id};
use async_trait::async_trait;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with a small pool, matching the single-operator usage model.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates the backing relation if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                tbl TEXT NOT NULL,
                id UUID NOT NULL,
                doc JSONB NOT NULL,
                PRIMARY KEY (tbl, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Text form used for `doc->>field` comparisons.
fn filter_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get(&self, table: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT doc FROM documents WHERE tbl = $1 AND id = $2")
            .bind(table)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<serde_json::Value, _>("doc")))
    }

    async fn insert(&self, table: &str, mut doc: Document) -> Result<Uuid, StoreError> {
        let id = assign_id(&mut doc);
        sqlx::query(
            r#"
            INSERT INTO documents (tbl, id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (tbl, id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(table)
        .bind(id)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn patch(&self, table: &str, id: Uuid, partial: Document) -> Result<(), StoreError> {
        // Read-merge-write; the store promises no multi-row atomicity and a
        // single operator drives data management, so this is sufficient.
        let mut doc = self
            .get(table, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;

        if let (Some(target), Some(fields)) = (doc.as_object_mut(), partial.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }

        sqlx::query("UPDATE documents SET doc = $3 WHERE tbl = $1 AND id = $2")
            .bind(table)
            .bind(id)
            .bind(doc)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE tbl = $1 AND id = $2")
            .bind(table)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, table: &str, filter: Filter) -> Result<Vec<Document>, StoreError> {
        let rows = match &filter {
            Filter::All => {
                sqlx::query("SELECT doc FROM documents WHERE tbl = $1 ORDER BY id")
                    .bind(table)
                    .fetch_all(&self.pool)
                    .await?
            }
            Filter::Eq(field, value) => {
                sqlx::query(
                    "SELECT doc FROM documents WHERE tbl = $1 AND doc->>$2 = $3 ORDER BY id",
                )
                .bind(table)
                .bind(*field)
                .bind(filter_text(value))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|r| r.get::<serde_json::Value, _>("doc"))
            .collect())
    }

    async fn count(&self, table: &str, filter: Filter) -> Result<u64, StoreError> {
        let row = match &filter {
            Filter::All => {
                sqlx::query("SELECT COUNT(*) AS n FROM documents WHERE tbl = $1")
                    .bind(table)
                    .fetch_one(&self.pool)
                    .await?
            }
            Filter::Eq(field, value) => {
                sqlx::query("SELECT COUNT(*) AS n FROM documents WHERE tbl = $1 AND doc->>$2 = $3")
                    .bind(table)
                    .bind(*field)
                    .bind(filter_text(value))
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(row.get::<i64, _>("n") as u64)
    }
}
