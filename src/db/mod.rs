//! Persistence & tenancy.
//!
//! `Database` wraps the connection pool. Every repository method takes a
//! `TenantCtx` and folds `tenant_id = $n` into its `WHERE` clause itself —
//! there is no ambient/ORM-session tenant binding; each repository takes
//! the pool explicitly rather than reaching for a global, and every query
//! is tenant-scoped at the call site.

pub mod cas;
pub mod schema;
pub mod tenancy;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use tenancy::TenantCtx;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction. Every request handler owns exactly one of
    /// these from entry to response.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}
