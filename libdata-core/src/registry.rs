//! Scheme → constructor registries.
//!
//! A [`Registry`] maps the primary scheme of an address to a constructor.
//! [`Backends`] bundles the three registries an application dispatches
//! through: document readers, document writers and clients.
//!
//! ```rust
//! use libdata_core::doc::{DocReader, MemoryReader};
//! use libdata_core::registry::Registry;
//! use serde_json::json;
//!
//! let mut readers: Registry<Box<dyn DocReader>> = Registry::new("DocReader");
//! readers
//!     .register_fn("mem", |_addr| {
//!         Ok(Box::new(MemoryReader::new(vec![json!({"id": 1})])) as Box<dyn DocReader>)
//!     })
//!     .unwrap();
//!
//! let reader = readers.dispatch("mem:///anything").unwrap();
//! assert_eq!(reader.len(), 1);
//! assert!(readers.dispatch("nope:///x").is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::address::{Address, IntoAddress};
use crate::client::Session;
use crate::doc::{DocReader, DocWriter};
use crate::error::{DataError, DataResult};

/// A registered constructor.
pub type Constructor<T> = Arc<dyn Fn(&Address) -> DataResult<T> + Send + Sync>;

/// Registry of constructors keyed by lowercase scheme.
pub struct Registry<T> {
    name: &'static str,
    constructors: IndexMap<String, Constructor<T>>,
}

impl<T> Registry<T> {
    /// Create an empty registry. `name` appears in error messages.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            constructors: IndexMap::new(),
        }
    }

    /// Registry name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a constructor for `scheme`.
    pub fn register(&mut self, scheme: &str, constructor: Constructor<T>) -> DataResult<()> {
        let scheme = scheme.to_ascii_lowercase();
        if self.constructors.contains_key(&scheme) {
            return Err(DataError::DuplicateScheme {
                registry: self.name.to_string(),
                scheme,
            });
        }
        debug!(registry = self.name, scheme = %scheme, "Registered scheme");
        self.constructors.insert(scheme, constructor);
        Ok(())
    }

    /// Register a closure, returning the stored constructor.
    pub fn register_fn<F>(&mut self, scheme: &str, f: F) -> DataResult<Constructor<T>>
    where
        F: Fn(&Address) -> DataResult<T> + Send + Sync + 'static,
    {
        let constructor: Constructor<T> = Arc::new(f);
        self.register(scheme, Arc::clone(&constructor))?;
        Ok(constructor)
    }

    /// Look up the constructor for `scheme`.
    pub fn resolve(&self, scheme: &str) -> DataResult<Constructor<T>> {
        self.constructors
            .get(&scheme.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| DataError::UnsupportedScheme {
                registry: self.name.to_string(),
                scheme: scheme.to_string(),
            })
    }

    /// Parse the address if needed, resolve its primary scheme and construct.
    pub fn dispatch(&self, address: impl IntoAddress) -> DataResult<T> {
        let address = address.into_address()?;
        let constructor = self.resolve(address.scheme())?;
        debug!(registry = self.name, scheme = address.scheme(), "Dispatching");
        constructor(&address)
    }

    /// Whether `scheme` is registered.
    pub fn contains(&self, scheme: &str) -> bool {
        self.constructors
            .contains_key(&scheme.to_ascii_lowercase())
    }

    /// Registered schemes, in registration order.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Number of registered schemes.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("schemes", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The reader, writer and client registries of an application.
#[derive(Debug)]
pub struct Backends {
    /// Document reader constructors.
    pub readers: Registry<Box<dyn DocReader>>,
    /// Document writer constructors.
    pub writers: Registry<Box<dyn DocWriter>>,
    /// Client constructors.
    pub clients: Registry<Box<dyn Session>>,
}

impl Backends {
    /// Empty registries.
    pub fn new() -> Self {
        Self {
            readers: Registry::new("DocReader"),
            writers: Registry::new("DocWriter"),
            clients: Registry::new("Client"),
        }
    }

    /// Construct a reader for `address`.
    pub fn reader(&self, address: impl IntoAddress) -> DataResult<Box<dyn DocReader>> {
        self.readers.dispatch(address)
    }

    /// Construct a writer for `address`.
    pub fn writer(&self, address: impl IntoAddress) -> DataResult<Box<dyn DocWriter>> {
        self.writers.dispatch(address)
    }

    /// Construct a client for `address`.
    pub fn client(&self, address: impl IntoAddress) -> DataResult<Box<dyn Session>> {
        self.clients.dispatch(address)
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(addr: &Address) -> DataResult<String> {
        Ok(addr.to_url())
    }

    #[test]
    fn test_register_and_dispatch() {
        let mut registry: Registry<String> = Registry::new("Echo");
        registry.register("kv", Arc::new(echo)).unwrap();
        let url = registry.dispatch("kv://host:1234/").unwrap();
        assert!(url.starts_with("kv://host:1234"));
    }

    #[test]
    fn test_duplicate_scheme() {
        let mut registry: Registry<String> = Registry::new("Echo");
        registry.register("kv", Arc::new(echo)).unwrap();
        let err = registry.register("KV", Arc::new(echo)).unwrap_err();
        assert!(matches!(err, DataError::DuplicateScheme { ref scheme, .. } if scheme == "kv"));
        assert_eq!(err.to_string(), "Duplicated scheme \"kv\" for Echo");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unsupported_scheme() {
        let registry: Registry<String> = Registry::new("Echo");
        assert!(matches!(
            registry.dispatch("kv://host/").unwrap_err(),
            DataError::UnsupportedScheme { .. }
        ));
    }

    #[test]
    fn test_malformed_address_surfaces_before_resolve() {
        let mut registry: Registry<String> = Registry::new("Echo");
        registry.register("kv", Arc::new(echo)).unwrap();
        let err = registry.dispatch("kv://host/?a=1&broken").unwrap_err();
        assert!(matches!(err, DataError::MalformedParameter(_)));
    }

    #[test]
    fn test_register_fn_returns_constructor() {
        let mut registry: Registry<String> = Registry::new("Echo");
        let ctor = registry
            .register_fn("mem", |addr| Ok(addr.scheme().to_string()))
            .unwrap();
        let addr = Address::parse("mem:///x").unwrap();
        assert_eq!(ctor(&addr).unwrap(), "mem");
        assert!(Arc::ptr_eq(&ctor, &registry.resolve("mem").unwrap()));
    }

    #[test]
    fn test_chained_scheme_dispatches_on_outer() {
        let mut registry: Registry<String> = Registry::new("Echo");
        registry
            .register_fn("s3", |addr| Ok(addr.transport().to_string()))
            .unwrap();
        assert_eq!(registry.dispatch("s3+https://host/bucket/key").unwrap(), "https");
    }

    #[test]
    fn test_schemes_in_order() {
        let mut registry: Registry<String> = Registry::new("Echo");
        for scheme in ["json", "jsonl", "yaml"] {
            registry.register(scheme, Arc::new(echo)).unwrap();
        }
        assert_eq!(registry.schemes().collect::<Vec<_>>(), ["json", "jsonl", "yaml"]);
        assert!(registry.contains("JSON"));
    }
}
