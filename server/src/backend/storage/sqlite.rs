//! SQLite-backed [`DocumentStore`].
//!
//! Every collection shares one `documents` table keyed by
//! `(collection, id)`; the body column holds the document as JSON text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info};

use super::traits::{
    merge_documents, Batch, DocumentStore, PreconditionFailed, SetMode, StoredDocument, WriteOp,
};

/// SqliteDocumentStore manages database operations
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: Arc<SqlitePool>,
}

impl SqliteDocumentStore {
    /// Open (and create if missing) the database at `url`
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database {}", url);
            Sqlite::create_database(url)
                .await
                .with_context(|| format!("failed to create database {}", url))?;
        }

        let pool = SqlitePool::connect(url)
            .await
            .with_context(|| format!("failed to connect to {}", url))?;
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a private in-memory database for tests
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // One long-lived connection, otherwise each connection sees its own empty memory db
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::setup_schema(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn read_body(conn: &mut SqliteConnection, collection: &str, id: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(r) => {
                let text: String = r.get("body");
                let body = serde_json::from_str(&text)
                    .with_context(|| format!("corrupt document {}/{}", collection, id))?;
                Ok(Some(body))
            }
            None => Ok(None),
        }
    }

    async fn write_body(conn: &mut SqliteConnection, collection: &str, id: &str, body: &Value) -> Result<()> {
        let text = serde_json::to_string(body)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES (?, ?, ?)
            ON CONFLICT (collection, id)
            DO UPDATE SET body = excluded.body, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(text)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn apply(conn: &mut SqliteConnection, op: &WriteOp) -> Result<bool> {
        match op {
            WriteOp::Set { collection, id, body, mode } => {
                let body = match mode {
                    SetMode::Replace => body.clone(),
                    SetMode::Merge => match Self::read_body(conn, collection, id).await? {
                        Some(existing) => merge_documents(existing, body.clone()),
                        None => body.clone(),
                    },
                };
                Self::write_body(conn, collection, id, &body).await?;
                Ok(true)
            }
            WriteOp::Delete { collection, id } => {
                let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                    .bind(collection)
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
            WriteOp::Expect { collection, id, pointer, value } => {
                let current = Self::read_body(conn, collection, id).await?;
                let holds = current
                    .as_ref()
                    .and_then(|body| body.pointer(pointer))
                    .is_some_and(|found| found == value);
                if !holds {
                    debug!("Precondition {} failed on {}/{}", pointer, collection, id);
                    return Err(PreconditionFailed {
                        collection: collection.clone(),
                        id: id.clone(),
                        pointer: pointer.clone(),
                        expected: value.clone(),
                    }
                    .into());
                }
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        debug!("Listing collection {}", collection);
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ? ORDER BY ROWID")
            .bind(collection)
            .fetch_all(&*self.pool)
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for r in rows {
            let id: String = r.get("id");
            let text: String = r.get("body");
            let body = serde_json::from_str(&text)
                .with_context(|| format!("corrupt document {}/{}", collection, id))?;
            documents.push(StoredDocument { id, body });
        }
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        debug!("Reading {}/{}", collection, id);
        let mut conn = self.pool.acquire().await?;
        Self::read_body(&mut *conn, collection, id).await
    }

    async fn create(&self, collection: &str, body: Value) -> Result<String> {
        let id = self.new_id();
        debug!("Creating {}/{}", collection, id);
        let mut conn = self.pool.acquire().await?;
        Self::write_body(&mut *conn, collection, &id, &body).await?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, body: Value, mode: SetMode) -> Result<()> {
        debug!("Writing {}/{} ({:?})", collection, id, mode);
        let mut batch = Batch::new();
        batch.set(collection, id, body, mode);
        self.commit(batch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        debug!("Deleting {}/{}", collection, id);
        let mut conn = self.pool.acquire().await?;
        let op = WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        Self::apply(&mut *conn, &op).await
    }

    async fn commit(&self, batch: Batch) -> Result<()> {
        debug!("Committing batch of {} writes", batch.len());
        let mut tx = self.pool.begin().await?;
        for op in batch.ops() {
            Self::apply(&mut *tx, op).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
