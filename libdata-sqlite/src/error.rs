//! Error types for SQLite operations.

use libdata_core::DataError;
use thiserror::Error;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Opening or initializing the database failed.
    #[error("Connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An address option is missing or invalid.
    #[error("Configuration error: {key}: {message}")]
    Config { key: String, message: String },

    /// A value cannot be stored in or read from SQLite.
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// A unique or primary-key constraint rejected a row.
    #[error("Duplicate row in {table}: {message}")]
    Duplicate { table: String, message: String },
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a type conversion error.
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    /// Whether the driver error is a unique or primary-key violation.
    pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
        match err {
            rusqlite::Error::SqliteFailure(e, _) => {
                e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }

    /// Re-classify a driver error raised while inserting into `table`.
    pub fn on_insert(table: &str, err: rusqlite::Error) -> Self {
        if Self::is_unique_violation(&err) {
            Self::Duplicate {
                table: table.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Sqlite(err)
        }
    }
}

impl From<SqliteError> for DataError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(e) => DataError::connection_with(crate::KIND, e),
            SqliteError::Sqlite(e) => DataError::backend_with(crate::KIND, e),
            SqliteError::Config { key, message } => DataError::invalid_option(key, message),
            SqliteError::TypeConversion(msg) => DataError::serialization(msg),
            SqliteError::Duplicate { table, message } => {
                DataError::DuplicateTarget(format!("{table}: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libdata_core::ErrorCode;

    #[test]
    fn test_error_display() {
        let err = SqliteError::config("table", "required");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_error_conversion() {
        let err: DataError = SqliteError::config("table", "required").into();
        assert_eq!(err.code(), ErrorCode::InvalidOption);

        let err: DataError = SqliteError::Connection(rusqlite::Error::InvalidQuery).into();
        assert!(err.is_retryable());

        let err: DataError = SqliteError::Duplicate {
            table: "users".into(),
            message: "UNIQUE constraint failed: users.id".into(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::DuplicateTarget);
    }

    #[test]
    fn test_unique_violation_detected() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t VALUES (1);")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES (1)", []).unwrap_err();
        assert!(SqliteError::is_unique_violation(&err));
        assert!(matches!(
            SqliteError::on_insert("t", err),
            SqliteError::Duplicate { .. }
        ));
    }
}
