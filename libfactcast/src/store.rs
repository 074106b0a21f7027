//! Fact store
//!
//! A single SQLite file mapping timestamp keys to fact bodies. Every
//! operation opens its own connection and closes it before returning; no
//! pool is kept between calls. There is no locking: one writer at a time is
//! assumed.

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StoreError};
use crate::types::{Fact, FactStatus, KEY_FORMAT};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct FactStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<SqliteConnection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::IoError)?;
            }
        }

        let mut conn = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .connect()
            .await
            .map_err(StoreError::SqlxError)?;

        MIGRATOR
            .run(&mut conn)
            .await
            .map_err(StoreError::MigrationError)?;

        Ok(conn)
    }

    async fn close(conn: SqliteConnection) -> Result<()> {
        conn.close().await.map_err(StoreError::SqlxError)?;
        Ok(())
    }

    /// Store `body` under a key derived from the current UTC second
    ///
    /// Two appends within the same second share a key; the later body
    /// replaces the earlier one and the record keeps its original position.
    pub async fn append(&self, body: &str) -> Result<String> {
        let now = self.clock.now();
        let key = now.format(KEY_FORMAT).to_string();

        let mut conn = self.open().await?;
        sqlx::query(
            r#"
            INSERT INTO facts (key, body, created_at, status)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                body = excluded.body,
                created_at = excluded.created_at,
                status = excluded.status
            "#,
        )
        .bind(&key)
        .bind(body)
        .bind(now.timestamp())
        .bind(FactStatus::Stored.as_str())
        .execute(&mut conn)
        .await
        .map_err(StoreError::SqlxError)?;
        Self::close(conn).await?;

        debug!(key = %key, "Stored fact");
        Ok(key)
    }

    /// Bodies in chronological order; `limit` keeps only the most recent ones
    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<String>> {
        Ok(self
            .entries(limit)
            .await?
            .into_iter()
            .map(|fact| fact.body)
            .collect())
    }

    /// Full records in chronological order; `limit` keeps only the most recent ones
    pub async fn entries(&self, limit: Option<usize>) -> Result<Vec<Fact>> {
        let mut conn = self.open().await?;

        let rows = match limit {
            None => {
                sqlx::query(
                    r#"
                    SELECT seq, key, body, created_at, status
                    FROM facts
                    ORDER BY seq ASC
                    "#,
                )
                .fetch_all(&mut conn)
                .await
            }
            Some(limit) => {
                sqlx::query(
                    r#"
                    SELECT seq, key, body, created_at, status FROM (
                        SELECT seq, key, body, created_at, status
                        FROM facts
                        ORDER BY seq DESC
                        LIMIT ?
                    )
                    ORDER BY seq ASC
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&mut conn)
                .await
            }
        }
        .map_err(StoreError::SqlxError)?;
        Self::close(conn).await?;

        Ok(rows.iter().map(fact_from_row).collect())
    }

    /// Body stored under exactly `key`
    pub async fn get(&self, key: &str) -> Result<String> {
        let mut conn = self.open().await?;
        let row = sqlx::query("SELECT body FROM facts WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut conn)
            .await
            .map_err(StoreError::SqlxError)?;
        Self::close(conn).await?;

        match row {
            Some(row) => Ok(row.get("body")),
            None => Err(StoreError::NotFound(key.to_string()).into()),
        }
    }

    /// Remove every fact; returns a confirmation message
    pub async fn clear(&self) -> Result<String> {
        let mut conn = self.open().await?;
        let removed = sqlx::query("DELETE FROM facts")
            .execute(&mut conn)
            .await
            .map_err(StoreError::SqlxError)?
            .rows_affected();
        Self::close(conn).await?;

        debug!(removed, "Cleared fact store");
        Ok(format!("Cleared {} fact(s)", removed))
    }

    /// Record how far the routine got with the fact under `key`
    pub async fn mark(&self, key: &str, status: FactStatus) -> Result<()> {
        let mut conn = self.open().await?;
        let updated = sqlx::query("UPDATE facts SET status = ? WHERE key = ?")
            .bind(status.as_str())
            .bind(key)
            .execute(&mut conn)
            .await
            .map_err(StoreError::SqlxError)?
            .rows_affected();
        Self::close(conn).await?;

        if updated == 0 {
            return Err(StoreError::NotFound(key.to_string()).into());
        }
        Ok(())
    }

    /// Facts whose routine run stopped before the chat notification
    pub async fn pending(&self) -> Result<Vec<Fact>> {
        let mut conn = self.open().await?;
        let rows = sqlx::query(
            r#"
            SELECT seq, key, body, created_at, status
            FROM facts
            WHERE status != ?
            ORDER BY seq ASC
            "#,
        )
        .bind(FactStatus::Notified.as_str())
        .fetch_all(&mut conn)
        .await
        .map_err(StoreError::SqlxError)?;
        Self::close(conn).await?;

        Ok(rows.iter().map(fact_from_row).collect())
    }

    /// Most recently stored fact
    pub async fn latest(&self) -> Result<Option<Fact>> {
        Ok(self.entries(Some(1)).await?.pop())
    }

    pub async fn len(&self) -> Result<usize> {
        let mut conn = self.open().await?;
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM facts")
            .fetch_one(&mut conn)
            .await
            .map_err(StoreError::SqlxError)?
            .get("count");
        Self::close(conn).await?;

        Ok(count as usize)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

fn fact_from_row(row: &SqliteRow) -> Fact {
    Fact {
        key: row.get("key"),
        body: row.get("body"),
        created_at: row.get("created_at"),
        status: FactStatus::from_db(&row.get::<String, _>("status")),
    }
}
