//! Execution and pool configuration.

use std::time::Duration;

/// Options applied when a command is sent to a gateway.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Abort the gateway call after this long.
    pub query_timeout: Option<Duration>,
    /// Emit `tracing` debug events for executed SQL.
    pub log_sql: bool,
    /// Truncate logged SQL (in chars). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            log_sql: true,
            max_sql_length: Some(200),
        }
    }
}

impl ExecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set query timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = Some(duration);
        self
    }

    /// Enable or disable SQL logging.
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.chars().count() > max => {
                let cut: String = sql.chars().take(max).collect();
                format!("{cut}...").into()
            }
            _ => sql.into(),
        }
    }
}

/// Connection pool settings.
#[cfg(feature = "pool")]
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub database_url: String,
    pub max_size: usize,
}

#[cfg(feature = "pool")]
impl PoolConfig {
    /// Environment variable holding the connection string.
    pub const DATABASE_URL_ENV: &'static str = "DATABASE_URL";
    /// Environment variable overriding the pool size.
    pub const POOL_SIZE_ENV: &'static str = "PGCHAIN_POOL_SIZE";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 16,
        }
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Read `DATABASE_URL` and the optional `PGCHAIN_POOL_SIZE`.
    pub fn from_env() -> crate::ChainResult<Self> {
        let url = std::env::var(Self::DATABASE_URL_ENV).map_err(|_| {
            crate::ChainError::Connection(format!("{} is not set", Self::DATABASE_URL_ENV))
        })?;
        let mut config = Self::new(url);
        if let Ok(size) = std::env::var(Self::POOL_SIZE_ENV) {
            config.max_size = size.parse().map_err(|_| {
                crate::ChainError::Connection(format!(
                    "{} must be a positive integer, got '{}'",
                    Self::POOL_SIZE_ENV,
                    size
                ))
            })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_log_with_truncation() {
        let c = ExecConfig::default();
        assert!(c.log_sql);
        assert_eq!(c.max_sql_length, Some(200));
        assert!(c.query_timeout.is_none());
    }

    #[test]
    fn truncates_on_char_boundaries() {
        let c = ExecConfig::new().max_sql_length(3);
        assert_eq!(c.truncate_sql("SELECT"), "SEL...");
        assert_eq!(c.truncate_sql("été!"), "été...");
        assert_eq!(c.truncate_sql("abc"), "abc");
        assert_eq!(ExecConfig::new().no_truncate().truncate_sql("SELECT"), "SELECT");
    }

    #[test]
    fn builder_methods() {
        let c = ExecConfig::new()
            .timeout(Duration::from_secs(2))
            .log_sql(false);
        assert_eq!(c.query_timeout, Some(Duration::from_secs(2)));
        assert!(!c.log_sql);
    }

    #[cfg(feature = "pool")]
    #[test]
    fn pool_config_defaults() {
        let c = PoolConfig::new("postgres://localhost/dvdrental").max_size(4);
        assert_eq!(c.max_size, 4);
        assert_eq!(PoolConfig::new("x").max_size, 16);
    }
}
