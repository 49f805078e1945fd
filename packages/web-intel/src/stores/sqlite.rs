//! SQLite storage implementation.
//!
//! A file-based storage backend using SQLite. Good for:
//! - Local development and the CLI's persistent cache
//! - Single-server deployments
//! - Testing with persistent data

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;

use crate::error::{CacheError, CacheResult};
use crate::traits::store::CacheStore;
use crate::types::record::{MetadataRecord, PageRecord};

fn unavailable(e: impl std::fmt::Display) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

/// SQLite-based page record store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://./web-intel.db?mode=rwc` - File-based, create if not exists
    pub async fn new(database_url: &str) -> CacheResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(unavailable)?;

        Self::with_pool(pool).await
    }

    /// Open (creating if needed) a database file.
    pub async fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(unavailable)?;

        Self::with_pool(pool).await
    }

    /// Create an in-memory SQLite store (for testing).
    ///
    /// Each connection to `:memory:` is its own database, so the pool is
    /// pinned to a single connection that is never reaped.
    pub async fn in_memory() -> CacheResult<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(unavailable)?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> CacheResult<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> CacheResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS page_records (
                url TEXT PRIMARY KEY,
                markdown TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    /// Close every pooled connection. Call once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, FromRow)]
struct PageRecordRow {
    url: String,
    markdown: String,
    metadata: String,
    created_at: String,
}

impl PageRecordRow {
    fn into_record(self) -> CacheResult<PageRecord> {
        let created_at = chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| CacheError::Unavailable(format!("Invalid date: {}", e)))?
            .with_timezone(&chrono::Utc);

        let metadata: MetadataRecord = serde_json::from_str(&self.metadata)
            .map_err(|e| CacheError::Unavailable(format!("Invalid metadata JSON: {}", e)))?;

        Ok(PageRecord {
            url: self.url,
            markdown: self.markdown,
            metadata,
            created_at,
        })
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn lookup(&self, url: &str) -> CacheResult<Option<PageRecord>> {
        let row = sqlx::query_as::<_, PageRecordRow>(
            "SELECT url, markdown, metadata, created_at FROM page_records WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(PageRecordRow::into_record).transpose()
    }

    async fn write(&self, record: &PageRecord) -> CacheResult<()> {
        let metadata = serde_json::to_string(&record.metadata).map_err(unavailable)?;

        let result = sqlx::query(
            r#"
            INSERT INTO page_records (url, markdown, metadata, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&record.url)
        .bind(&record.markdown)
        .bind(&metadata)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(CacheError::Conflict {
                url: record.url.clone(),
            });
        }

        Ok(())
    }
}
