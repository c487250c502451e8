//! Error types for filesystem access.

use std::io;

use libdata_core::DataError;
use thiserror::Error;

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

/// Error type for filesystem operations.
#[derive(Error, Debug)]
pub enum FsError {
    /// An operation on `path` failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// No file or directory at `path`.
    #[error("No such file or directory: '{0}'")]
    NotFound(String),

    /// The path leaves the filesystem root.
    #[error("Path '{0}' escapes the filesystem root")]
    Escape(String),

    /// The root does not exist or is not a directory.
    #[error("Root '{0}' is not a directory")]
    BadRoot(String),
}

impl FsError {
    /// Wrap an I/O error; `NotFound` becomes [`FsError::NotFound`].
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

impl From<FsError> for DataError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::Io { path, source } => {
                DataError::Io(io::Error::new(source.kind(), format!("{path}: {source}")))
            }
            FsError::NotFound(path) => DataError::KeyNotFound(path),
            err @ FsError::Escape(_) => DataError::backend(crate::KIND, err.to_string()),
            err @ FsError::BadRoot(_) => DataError::connection(crate::KIND, err.to_string()),
        }
    }
}
