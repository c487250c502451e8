//! Error types for document files.

use std::io;
use std::path::PathBuf;

use libdata_core::DataError;
use thiserror::Error;

/// Result type for file operations.
pub type FilesResult<T> = Result<T, FilesError>;

/// Error type for file operations.
#[derive(Error, Debug)]
pub enum FilesError {
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file is not valid JSON or JSON Lines.
    #[error("Invalid JSON in {}{}: {source}", .path.display(), line_suffix(.line))]
    Json {
        path: PathBuf,
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    /// A file is not valid YAML.
    #[error("Invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The output file already exists.
    #[error("File already exists: {}", .0.display())]
    Exists(PathBuf),

    /// The path is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A document cannot be written.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl FilesError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<FilesError> for DataError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::Io { path, source } if source.kind() == io::ErrorKind::AlreadyExists => {
                DataError::DuplicateTarget(path.display().to_string())
            }
            FilesError::Io { path, source } => {
                DataError::Io(io::Error::new(source.kind(), format!("{}: {source}", path.display())))
            }
            err @ (FilesError::Json { .. } | FilesError::Yaml { .. }) => {
                DataError::serialization(err.to_string())
            }
            FilesError::Exists(path) => DataError::DuplicateTarget(path.display().to_string()),
            FilesError::NotADirectory(path) => {
                DataError::invalid_option("path", format!("{} should be a directory", path.display()))
            }
            FilesError::InvalidDocument(msg) => DataError::InvalidDocument(msg),
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" line {l}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use libdata_core::ErrorCode;

    #[test]
    fn test_exists_is_duplicate_target() {
        let err: DataError = FilesError::Exists("/tmp/out.jsonl".into()).into();
        assert_eq!(err.code(), ErrorCode::DuplicateTarget);
        assert!(err.to_string().contains("/tmp/out.jsonl"));
    }

    #[test]
    fn test_json_error_mentions_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = FilesError::Json {
            path: "data.jsonl".into(),
            line: Some(3),
            source,
        };
        assert!(err.to_string().starts_with("Invalid JSON in data.jsonl line 3"));
        let err: DataError = err.into();
        assert_eq!(err.code(), ErrorCode::Serialization);
    }

    #[test]
    fn test_io_keeps_kind() {
        let source = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: DataError = FilesError::io("x.json", source).into();
        assert!(matches!(err, DataError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }
}
