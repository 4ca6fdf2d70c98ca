//! Database connection pool, migrations, transactions, and health check.
//!
//! The `Db` handle is constructed explicitly and shared behind an `Arc`;
//! it is the only shared resource the engine touches. Query functions in the
//! submodules take `&mut PgConnection` so they run inside whatever
//! transaction the engine opened.

pub mod event;
pub mod provider;
pub mod session;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};

/// Database handle. Owns the connection pool shared across all modules.
#[derive(Debug)]
pub struct Db {
    pool: PgPool,
    store: StoreConfig,
}

impl Db {
    /// Connect to Postgres with default pool settings.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, StoreConfig::default()).await
    }

    /// Connect to Postgres and create a connection pool.
    pub async fn connect_with(url: &str, store: StoreConfig) -> Result<Self> {
        let mut options: PgConnectOptions = url
            .parse()
            .map_err(|e| Error::Config(format!("invalid DATABASE_URL: {e}")))?;
        if let Some(ref schema) = store.schema {
            options = options.options([("search_path", schema.as_str())]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(store.max_connections)
            .acquire_timeout(store.acquire_timeout)
            .connect_with(options)
            .await?;
        Ok(Self { pool, store })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;
        Ok(())
    }

    /// Simple health check: run a SELECT 1.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Open a transaction with the configured statement and lock timeouts.
    ///
    /// Both limits are `SET LOCAL`, so they end with the transaction. Dropping
    /// the returned transaction without committing rolls it back.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('statement_timeout', $1, true), set_config('lock_timeout', $2, true)")
            .bind(format!("{}ms", self.store.statement_timeout.as_millis()))
            .bind(format!("{}ms", self.store.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// The underlying pool, for fixtures and out-of-band tooling.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
