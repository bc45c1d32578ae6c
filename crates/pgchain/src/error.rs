//! Error types for pgchain

use thiserror::Error;

/// Result type alias for pgchain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors recorded while a [`Command`](crate::Command) chain is being built.
///
/// The first one recorded sticks: every later call in the chain returns it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A SELECT item that is neither a column name nor a [`Field`](crate::Field).
    #[error(
        "found {found} as argument no. {position} in SELECT statement. only column names and fields are allowed arguments"
    )]
    InvalidSelectArgument { position: usize, found: &'static str },

    /// INSERT INTO without explicit columns and without an inline `(...)` list.
    #[error("INSERT INTO {entity} has no column list")]
    MissingColumns { entity: String },

    /// More insert columns than Postgres allows in one table.
    #[error("INSERT INTO declares {count} columns, Postgres allows at most {max}")]
    TooManyColumns { count: usize, max: usize },

    /// A VALUES tuple whose length differs from the insert column list.
    #[error("VALUES row no. {row} has {found} values, expected {expected}")]
    ArityMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Error types for building and executing commands
#[derive(Debug, Error)]
pub enum ChainError {
    /// Sticky error from the builder chain
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode or typed accessor error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl ChainError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Check if this error came from the builder chain
    pub fn is_build(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Parse a tokio_postgres error into a more specific ChainError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for ChainError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}
