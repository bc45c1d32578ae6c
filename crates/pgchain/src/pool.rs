//! Connection pool utilities

use crate::config::PoolConfig;
use crate::error::{ChainError, ChainResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Create a connection pool from a [`PoolConfig`].
///
/// Uses `NoTls` and fast recycling. Checked-out `deadpool_postgres::Client`s implement
/// [`Gateway`](crate::Gateway) and can be passed straight to [`Command::go`](crate::Command::go).
///
/// # Example
///
/// ```ignore
/// let pool = pgchain::create_pool(&PoolConfig::from_env()?)?;
/// let client = pool.get().await?;
/// ```
pub fn create_pool(config: &PoolConfig) -> ChainResult<Pool> {
    let pg_config: tokio_postgres::Config = config
        .database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| ChainError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(mgr)
        .max_size(config.max_size)
        .build()
        .map_err(|e| ChainError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_url() {
        let err = create_pool(&PoolConfig::new("postgres://host:notaport/db")).unwrap_err();
        assert!(matches!(err, ChainError::Connection(_)));
    }
}
