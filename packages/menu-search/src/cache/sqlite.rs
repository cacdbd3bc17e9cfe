//! SQLite cache backend.
//!
//! A file-based backend for single-server deployments where cached
//! menu text should survive restarts. Enabled with the `sqlite`
//! cargo feature.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::time::Duration;

use crate::error::{CacheError, CacheResult};

use super::CacheBackend;

/// SQLite-backed TTL store.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// Create a cache with the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - in-memory (ephemeral)
    /// - `sqlite://menu_cache.db?mode=rwc` - file, create if missing
    pub async fn new(database_url: &str) -> CacheResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| CacheError::Backend(e.to_string().into()))?;

        let cache = Self { pool };
        cache.run_migrations().await?;
        Ok(cache)
    }

    /// In-memory SQLite cache (for testing).
    ///
    /// Uses a single pooled connection: each `:memory:` connection is
    /// its own database, so a larger pool would not share data.
    pub async fn in_memory() -> CacheResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CacheError::Backend(e.to_string().into()))?;
        let cache = Self { pool };
        cache.run_migrations().await?;
        Ok(cache)
    }

    async fn run_migrations(&self) -> CacheResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::Backend(e.to_string().into()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache(expires_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Backend(e.to_string().into()))?;
        Ok(())
    }

    /// Remove every expired entry; returns how many were deleted.
    pub async fn cleanup(&self) -> CacheResult<u64> {
        let result = sqlx::query("DELETE FROM cache WHERE expires_at < ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Backend(e.to_string().into()))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CacheBackend for SqliteCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let row = sqlx::query("SELECT value, expires_at FROM cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CacheError::Backend(e.to_string().into()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: i64 = row.get("expires_at");
        if expires_at < Utc::now().timestamp() {
            // Expired: evict lazily, report a miss.
            self.delete(key).await?;
            return Ok(None);
        }

        Ok(Some(row.get("value")))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;
        sqlx::query(
            "INSERT INTO cache (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::Backend(e.to_string().into()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        sqlx::query("DELETE FROM cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Backend(e.to_string().into()))?;
        Ok(())
    }
}
