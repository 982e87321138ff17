//! # atelier-db
//!
//! PostgreSQL media catalog for the atelier backend.
//!
//! This crate provides:
//! - Connection pool management
//! - The [`PgMediaRepository`] implementation of `atelier_core::MediaCatalog`
//! - Embedded schema migrations (behind the `migrations` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use atelier_db::Database;
//!
//! let db = Database::connect("postgres://localhost/atelier").await?;
//! let asset = db.media.get(asset_id).await?;
//! ```

pub mod media;
pub mod pool;

pub use media::PgMediaRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

use sqlx::PgPool;

use atelier_core::Result;

/// Handle bundling the pool and the repositories that share it.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    pub media: PgMediaRepository,
}

impl Database {
    /// Connect with environment-driven pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = pool::create_pool(database_url).await?;
        Ok(Self::from_pool(pool))
    }

    /// Build from an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        let media = PgMediaRepository::new(pool.clone());
        Self { pool, media }
    }

    /// Run embedded migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| atelier_core::Error::Database(e.into()))?;
        Ok(())
    }
}
