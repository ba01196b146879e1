//! Error types for gqb

use thiserror::Error;

/// Result type alias for gqb operations
pub type GqbResult<T> = Result<T, GqbError>;

/// Error types for statement building, execution and decoding
#[derive(Debug, Error)]
pub enum GqbError {
    /// Statement configuration error, raised before any executor call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query execution error reported by tokio-postgres
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Execution error reported by any other executor
    #[error("Execution error: {0}")]
    Execution(String),

    /// Single-row retrieval found nothing
    #[error("no rows in result set")]
    NoRows,

    /// Requested column is not part of the row
    #[error("column '{0}' doesn't exist in result")]
    MissingColumn(String),

    /// Row value could not be coerced into the requested type
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl GqbError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.to_string(),
        }
    }

    /// Wrap an error reported by a custom executor
    pub fn execution(message: impl std::fmt::Display) -> Self {
        Self::Execution(message.to_string())
    }

    /// Check if this is the single-row "no rows" error
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a decode error (including a missing column)
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::MissingColumn(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for GqbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

/// Failure to coerce a [`Value`](crate::Value) into a static type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("value is null")]
    Null,

    #[error("cannot convert {from} to {to}")]
    Type {
        from: &'static str,
        to: &'static str,
    },

    #[error("{from} value {value} is out of range for {to}")]
    OutOfRange {
        from: &'static str,
        value: String,
        to: &'static str,
    },

    #[error("cannot parse {input:?} as {to}")]
    Parse { input: String, to: &'static str },
}
