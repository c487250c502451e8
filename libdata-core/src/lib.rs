//! # libdata-core
//!
//! Shared infrastructure for libdata backends:
//! - Address parsing with chained schemes and literal-coerced parameters
//! - Scheme registries for readers, writers and clients
//! - A bounded, thread-safe pool of idle native connections
//! - A lazy client that connects on first use and pools its connection on close
//! - The document reader/writer contract
//!
//! ## Addresses
//!
//! ```rust
//! use libdata_core::Address;
//! use serde_json::json;
//!
//! let addr = Address::parse("mysql://root:pw@localhost:3306/shop/orders?autocommit=False").unwrap();
//! assert_eq!(addr.scheme(), "mysql");
//! assert_eq!(addr.database(), Some("shop"));
//! assert_eq!(addr.table(), Some("orders"));
//! assert_eq!(addr.param("autocommit"), Some(&json!(false)));
//! ```
//!
//! ## Writing a backend
//!
//! A backend implements [`Connector`] and [`NativeConnection`], keeps one
//! [`SharedPools`] for its kind, and registers constructors in a [`Backends`]
//! value:
//!
//! ```rust
//! use std::sync::{Arc, LazyLock};
//! use libdata_core::{
//!     Backends, Connector, DataResult, LazyClient, NativeConnection, Session, SharedPools,
//! };
//!
//! struct EchoConnection;
//!
//! impl NativeConnection for EchoConnection {
//!     fn close(self) -> DataResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! struct EchoConnector;
//!
//! impl Connector for EchoConnector {
//!     type Connection = EchoConnection;
//!
//!     fn kind(&self) -> &'static str {
//!         "echo"
//!     }
//!
//!     fn connect(&self) -> DataResult<EchoConnection> {
//!         Ok(EchoConnection)
//!     }
//! }
//!
//! static POOLS: LazyLock<SharedPools<EchoConnection>> =
//!     LazyLock::new(|| SharedPools::new("echo", 16));
//!
//! let mut backends = Backends::new();
//! backends
//!     .clients
//!     .register_fn("echo", |addr| {
//!         let pool = POOLS.pool_for(&addr.pool_key());
//!         Ok(Box::new(LazyClient::new(EchoConnector, pool)) as Box<dyn Session>)
//!     })
//!     .unwrap();
//!
//! let mut client = backends.client("echo://somewhere/").unwrap();
//! client.connect().unwrap();
//! client.close();
//! assert_eq!(POOLS.idle_count(), 1);
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod doc;
pub mod error;
pub mod logging;
pub mod options;
pub mod pool;
pub mod registry;

pub use address::{Address, IntoAddress, Parameters, coerce_literal, render_literal};
pub use client::{ClientState, Connector, LazyClient, NativeConnection, Session};
pub use config::{LibdataConfig, LoggingConfig, PoolConfig};
pub use doc::{DocReader, DocWriter, Document, Documents, MemoryReader};
pub use error::{BoxError, DataError, DataResult, ErrorCode};
pub use options::Options;
pub use pool::{ConnectionPool, DEFAULT_POOL_SIZE, PoolStats, Released, SharedPools};
pub use registry::{Backends, Constructor, Registry};
