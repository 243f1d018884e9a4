//! PostgreSQL-backed key-value store.
//!
//! Persistent keys live in one `kv_store` table. Compare-and-swap is a single
//! conditional statement, so concurrent servers sharing the database never
//! overwrite each other's collection writes. Session keys stay in memory.

use super::{DatabaseConfig, KeyValueStore, MemoryStore, Scope, StoreResult};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;

/// Key-value store persisted in PostgreSQL
#[derive(Debug)]
pub struct PgStore {
    pool: PgPool,
    session: MemoryStore,
}

impl PgStore {
    /// Connect a pool and make sure the `kv_store` table exists
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool (schema is not checked)
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            session: MemoryStore::new(),
        }
    }

    /// Create the backing table if it is missing
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, scope: Scope, key: &str) -> StoreResult<Option<String>> {
        if scope == Scope::Session {
            return self.session.get(scope, key).await;
        }

        let row = sqlx::query("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, scope: Scope, key: &str, value: String) -> StoreResult<()> {
        if scope == Scope::Session {
            return self.session.set(scope, key, value).await;
        }

        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (key)
             DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, scope: Scope, key: &str) -> StoreResult<()> {
        if scope == Scope::Session {
            return self.session.remove(scope, key).await;
        }

        sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        scope: Scope,
        key: &str,
        expected: Option<&str>,
        new: String,
    ) -> StoreResult<bool> {
        if scope == Scope::Session {
            return self
                .session
                .compare_and_swap(scope, key, expected, new)
                .await;
        }

        let result = match expected {
            Some(current) => {
                sqlx::query(
                    "UPDATE kv_store
                     SET value = $1, updated_at = NOW()
                     WHERE key = $2 AND value = $3",
                )
                .bind(new)
                .bind(key)
                .bind(current)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "INSERT INTO kv_store (key, value, updated_at)
                     VALUES ($1, $2, NOW())
                     ON CONFLICT (key) DO NOTHING",
                )
                .bind(key)
                .bind(new)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() == 1)
    }

    async fn clear_scope(&self, scope: Scope) -> StoreResult<()> {
        if scope == Scope::Session {
            return self.session.clear_scope(scope).await;
        }

        sqlx::query("DELETE FROM kv_store").execute(&self.pool).await?;
        Ok(())
    }
}
