//! SQLite backend for libdata.
//!
//! Registers the `sqlite` scheme for clients, readers and writers. Addresses
//! name the database file in the path and everything else in parameters:
//!
//! ```text
//! sqlite:///var/data/app.db?table=users&primary_key=user_id
//! sqlite::memory:
//! ```
//!
//! # Example
//!
//! ```rust
//! use libdata_core::{Backends, DocReader, DocWriter};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let url = format!("sqlite://{}?table=users", dir.path().join("app.db").display());
//!
//! let mut backends = Backends::new();
//! libdata_sqlite::register(&mut backends).unwrap();
//!
//! let mut writer = backends.writer(url.as_str()).unwrap();
//! writer.write(&json!({"id": 1, "name": "Alice"})).unwrap();
//! writer.close().unwrap();
//!
//! let mut reader = backends.reader(url.as_str()).unwrap();
//! assert_eq!(reader.len(), 1);
//! assert_eq!(reader.read("1").unwrap()["name"], "Alice");
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod reader;
pub mod types;
pub mod writer;

pub use client::SqliteClient;
pub use config::{DatabasePath, JournalMode, SqliteConfig, SynchronousMode};
pub use connection::{SqliteConnection, SqliteConnector};
pub use error::{SqliteError, SqliteResult};
pub use pool::{pool_for, pools, set_pool_size};
pub use reader::SqliteReader;
pub use writer::SqliteWriter;

use libdata_core::{Backends, DataResult, DocReader, DocWriter, Session};

/// Backend kind and scheme.
pub const KIND: &str = "sqlite";

/// Register the `sqlite` scheme in every registry of `backends`.
pub fn register(backends: &mut Backends) -> DataResult<()> {
    backends.clients.register_fn(KIND, |addr| {
        Ok(Box::new(SqliteClient::from_address(addr)?) as Box<dyn Session>)
    })?;
    backends.readers.register_fn(KIND, |addr| {
        Ok(Box::new(SqliteReader::from_address(addr)?) as Box<dyn DocReader>)
    })?;
    backends.writers.register_fn(KIND, |addr| {
        Ok(Box::new(SqliteWriter::from_address(addr)?) as Box<dyn DocWriter>)
    })?;
    Ok(())
}
