//! Error types shared by every libdata backend.
//!
//! Errors fall into a few groups:
//! - Address errors: the address string or one of its parameters is malformed
//! - Registry errors: a scheme is unknown or registered twice
//! - Lifecycle errors: connecting failed, or a transaction operation was issued
//!   in the wrong state
//! - Document errors: reader/writer contract violations
//!
//! ```rust
//! use libdata_core::{DataError, ErrorCode};
//!
//! let err = DataError::connection("sqlite", "unable to open database file");
//! assert_eq!(err.code(), ErrorCode::Connection);
//! assert!(err.is_retryable());
//!
//! let err = DataError::KeyNotFound("42".into());
//! assert!(!err.is_retryable());
//! ```

use thiserror::Error;

use crate::client::ClientState;

/// Result type for libdata operations.
pub type DataResult<T> = Result<T, DataError>;

/// Boxed error carried as the source of connection and backend failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse error classification for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The address could not be decomposed.
    MalformedAddress,
    /// A query-string fragment is not a `name=value` pair.
    MalformedParameter,
    /// No constructor is registered for the scheme.
    UnsupportedScheme,
    /// The scheme was already registered.
    DuplicateScheme,
    /// Native connection setup or authentication failed.
    Connection,
    /// A lifecycle operation was called in the wrong state.
    InvalidState,
    /// The backend does not support the operation.
    UnsupportedOperation,
    /// Document index outside `[0, len)`.
    IndexOutOfRange,
    /// No document for the key.
    KeyNotFound,
    /// The write target already exists.
    DuplicateTarget,
    /// A typed option is unknown or has the wrong type.
    InvalidOption,
    /// A document does not have the shape the backend needs.
    InvalidDocument,
    /// The backend rejected an operation.
    Backend,
    /// Filesystem I/O failed.
    Io,
    /// Encoding or decoding a document failed.
    Serialization,
    /// Configuration could not be loaded.
    Config,
}

impl ErrorCode {
    /// Stable string form, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedAddress => "malformed_address",
            Self::MalformedParameter => "malformed_parameter",
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::DuplicateScheme => "duplicate_scheme",
            Self::Connection => "connection",
            Self::InvalidState => "invalid_state",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::KeyNotFound => "key_not_found",
            Self::DuplicateTarget => "duplicate_target",
            Self::InvalidOption => "invalid_option",
            Self::InvalidDocument => "invalid_document",
            Self::Backend => "backend",
            Self::Io => "io",
            Self::Serialization => "serialization",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by address parsing, dispatch, pooling and backends.
#[derive(Error, Debug)]
pub enum DataError {
    /// The address string has no usable URI structure.
    #[error("Malformed address \"{address}\": {message}")]
    MalformedAddress { address: String, message: String },

    /// A query fragment is not exactly one `name=value` pair.
    #[error("Invalid url parameter \"{0}\"")]
    MalformedParameter(String),

    /// No constructor registered for the scheme.
    #[error("Unsupported scheme \"{scheme}\" for {registry}")]
    UnsupportedScheme { registry: String, scheme: String },

    /// The scheme is already registered.
    #[error("Duplicated scheme \"{scheme}\" for {registry}")]
    DuplicateScheme { registry: String, scheme: String },

    /// Native connection setup failed.
    #[error("Connection error ({kind}): {message}")]
    Connection {
        kind: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A lifecycle operation is not valid in the current state.
    #[error("Cannot {operation} while the client is {state}")]
    InvalidState {
        state: ClientState,
        operation: &'static str,
    },

    /// The backend kind does not implement the operation.
    #[error("Backend \"{kind}\" does not support {operation}")]
    UnsupportedOperation { kind: String, operation: String },

    /// Document index outside the readable range.
    #[error("Index {index} out of range for {len} documents")]
    IndexOutOfRange { index: usize, len: usize },

    /// No document exists for the key.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The writer target already exists.
    #[error("Target already exists: {0}")]
    DuplicateTarget(String),

    /// An option is unrecognized or malformed.
    #[error("Invalid option '{key}': {message}")]
    InvalidOption { key: String, message: String },

    /// The document cannot be stored by this backend.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The backend rejected an operation.
    #[error("Backend error ({kind}): {message}")]
    Backend {
        kind: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// Create a malformed-address error; any password in `address` is masked.
    pub fn malformed_address(address: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self::MalformedAddress {
            address: crate::address::redact_text(address.as_ref()),
            message: message.into(),
        }
    }

    /// Create the error for `operation` on a writer that was closed.
    pub fn closed(operation: &'static str) -> Self {
        Self::InvalidState {
            state: ClientState::Idle,
            operation,
        }
    }

    /// Create a connection error without an underlying cause.
    pub fn connection(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error wrapping the driver's error.
    pub fn connection_with(
        kind: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            kind: kind.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a backend error without an underlying cause.
    pub fn backend(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error wrapping the driver's error.
    pub fn backend_with(
        kind: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            kind: kind.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(kind: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            kind: kind.into(),
            operation: operation.into(),
        }
    }

    /// Create an invalid-option error.
    pub fn invalid_option(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedAddress { .. } => ErrorCode::MalformedAddress,
            Self::MalformedParameter(_) => ErrorCode::MalformedParameter,
            Self::UnsupportedScheme { .. } => ErrorCode::UnsupportedScheme,
            Self::DuplicateScheme { .. } => ErrorCode::DuplicateScheme,
            Self::Connection { .. } => ErrorCode::Connection,
            Self::InvalidState { .. } => ErrorCode::InvalidState,
            Self::UnsupportedOperation { .. } => ErrorCode::UnsupportedOperation,
            Self::IndexOutOfRange { .. } => ErrorCode::IndexOutOfRange,
            Self::KeyNotFound(_) => ErrorCode::KeyNotFound,
            Self::DuplicateTarget(_) => ErrorCode::DuplicateTarget,
            Self::InvalidOption { .. } => ErrorCode::InvalidOption,
            Self::InvalidDocument(_) => ErrorCode::InvalidDocument,
            Self::Backend { .. } => ErrorCode::Backend,
            Self::Io(_) => ErrorCode::Io,
            Self::Serialization(_) => ErrorCode::Serialization,
            Self::Config(_) => ErrorCode::Config,
        }
    }

    /// Whether re-invoking the failed operation may succeed.
    ///
    /// Only connection failures qualify: the client is left `Idle` and the
    /// next operation performs a fresh connect.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Whether this error signals a programmer or configuration mistake.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MalformedAddress { .. }
                | Self::MalformedParameter(_)
                | Self::UnsupportedScheme { .. }
                | Self::DuplicateScheme { .. }
                | Self::InvalidOption { .. }
                | Self::Config(_)
        )
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::MalformedParameter("max_size".into());
        assert_eq!(err.to_string(), "Invalid url parameter \"max_size\"");

        let err = DataError::InvalidState {
            state: ClientState::Idle,
            operation: "commit",
        };
        assert_eq!(err.to_string(), "Cannot commit while the client is idle");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DataError::connection("kv", "refused").code(),
            ErrorCode::Connection
        );
        assert_eq!(
            DataError::IndexOutOfRange { index: 3, len: 3 }.code(),
            ErrorCode::IndexOutOfRange
        );
        assert_eq!(ErrorCode::DuplicateScheme.as_str(), "duplicate_scheme");
    }

    #[test]
    fn test_error_classification() {
        assert!(DataError::connection("kv", "refused").is_retryable());
        assert!(!DataError::backend("kv", "syntax").is_retryable());
        assert!(DataError::invalid_option("foo", "unrecognized option").is_configuration());
        assert!(!DataError::KeyNotFound("a".into()).is_configuration());
    }

    #[test]
    fn test_connection_source_is_kept() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = DataError::connection_with("kv", io);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("refused"));
    }
}
