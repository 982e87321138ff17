//! Connection pool setup.
//!
//! Pool sizing is environment-driven (`ATELIER_DB_*`) with defaults tuned
//! for a single-instance portfolio backend: uploads hold a connection only
//! for the final catalog insert, so the pool stays small.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use atelier_core::{Error, Result};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Read overrides from the environment, falling back to defaults for
    /// unset or unparsable values:
    /// `ATELIER_DB_MAX_CONNECTIONS`, `ATELIER_DB_MIN_CONNECTIONS`,
    /// `ATELIER_DB_ACQUIRE_TIMEOUT_SECS`, `ATELIER_DB_IDLE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_connections: env_parse("ATELIER_DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_parse("ATELIER_DB_MIN_CONNECTIONS", defaults.min_connections),
            acquire_timeout: Duration::from_secs(env_parse(
                "ATELIER_DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )),
            idle_timeout: Duration::from_secs(env_parse(
                "ATELIER_DB_IDLE_TIMEOUT_SECS",
                defaults.idle_timeout.as_secs(),
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Connect with environment-driven configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::from_env()).await
}

/// Connect with an explicit configuration.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connection pool ready"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_from_env_overrides_and_ignores_garbage() {
        // All ATELIER_DB_* reads happen in this one test to keep the
        // process environment race-free under the parallel test runner.
        std::env::set_var("ATELIER_DB_MAX_CONNECTIONS", "25");
        std::env::set_var("ATELIER_DB_MIN_CONNECTIONS", "not-a-number");
        std::env::set_var("ATELIER_DB_IDLE_TIMEOUT_SECS", "90");

        let config = PoolConfig::from_env();
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.min_connections, 1); // garbage falls back
        assert_eq!(config.idle_timeout, Duration::from_secs(90));
        assert_eq!(config.acquire_timeout, Duration::from_secs(30)); // unset

        std::env::remove_var("ATELIER_DB_MAX_CONNECTIONS");
        std::env::remove_var("ATELIER_DB_MIN_CONNECTIONS");
        std::env::remove_var("ATELIER_DB_IDLE_TIMEOUT_SECS");
    }
}
