//! Error types for MySQL operations.

use std::time::Duration;

use libdata_core::DataError;
use thiserror::Error;

/// Server error code for a duplicate unique or primary key.
pub const ER_DUP_ENTRY: u16 = 1062;

/// Result type for MySQL operations.
pub type MysqlResult<T> = Result<T, MysqlError>;

/// Error type for MySQL operations.
#[derive(Error, Debug)]
pub enum MysqlError {
    /// Opening the connection failed.
    #[error("Connection error: {0}")]
    Connection(#[source] mysql_async::Error),

    /// The server did not answer within the connect timeout.
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// An address option is missing or invalid.
    #[error("Configuration error: {key}: {message}")]
    Config { key: String, message: String },

    /// The shared runtime is unavailable or cannot be blocked on here.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// The connection was already disconnected.
    #[error("Connection is closed")]
    Closed,

    /// A unique or primary-key constraint rejected a row.
    #[error("Duplicate row in {table}: {message}")]
    Duplicate { table: String, message: String },
}

impl MysqlError {
    /// Create a configuration error.
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether the driver error is a duplicate-key rejection.
    pub fn is_duplicate_entry(err: &mysql_async::Error) -> bool {
        matches!(err, mysql_async::Error::Server(e) if e.code == ER_DUP_ENTRY)
    }

    /// Re-classify an error raised while inserting into `table`.
    pub fn on_insert(table: &str, err: MysqlError) -> Self {
        match err {
            Self::Mysql(e) if Self::is_duplicate_entry(&e) => Self::Duplicate {
                table: table.to_string(),
                message: e.to_string(),
            },
            other => other,
        }
    }
}

impl From<MysqlError> for DataError {
    fn from(err: MysqlError) -> Self {
        match err {
            MysqlError::Connection(e) => DataError::connection_with(crate::KIND, e),
            MysqlError::Timeout(after) => {
                DataError::connection(crate::KIND, format!("timed out after {after:?}"))
            }
            MysqlError::Mysql(e) => DataError::backend_with(crate::KIND, e),
            MysqlError::Config { key, message } => DataError::invalid_option(key, message),
            MysqlError::Runtime(msg) => DataError::backend(crate::KIND, msg),
            MysqlError::Closed => DataError::closed("query"),
            MysqlError::Duplicate { table, message } => {
                DataError::DuplicateTarget(format!("{table}: {message}"))
            }
        }
    }
}
