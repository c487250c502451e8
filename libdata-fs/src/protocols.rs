//! Filesystem protocols available to `fs` clients.
//!
//! `file` and `local` are built in. Other protocols (object stores, remote
//! shares) plug in with [`register_protocol`]; the constructor receives the
//! decoded [`FsTarget`].

use std::sync::LazyLock;

use libdata_core::{DataResult, Registry};
use parking_lot::RwLock;
use tracing::debug;

use crate::filesystem::{FileSystem, LocalFileSystem};
use crate::target::FsTarget;

/// Registry of filesystem constructors keyed by protocol.
pub type FsProtocols = Registry<Box<dyn FileSystem>>;

/// Protocols served by [`LocalFileSystem`].
pub const LOCAL_PROTOCOLS: [&str; 2] = ["file", "local"];

static PROTOCOLS: LazyLock<RwLock<FsProtocols>> = LazyLock::new(|| {
    let mut protocols = FsProtocols::new("FileSystem");
    for protocol in LOCAL_PROTOCOLS {
        // The registry is empty, so these cannot collide.
        let _ = protocols.register_fn(protocol, |addr| {
            let target = FsTarget::from_address(addr);
            Ok(Box::new(LocalFileSystem::from_target(&target)?) as Box<dyn FileSystem>)
        });
    }
    RwLock::new(protocols)
});

/// Register a filesystem protocol.
pub fn register_protocol<F>(protocol: &str, f: F) -> DataResult<()>
where
    F: Fn(&FsTarget) -> DataResult<Box<dyn FileSystem>> + Send + Sync + 'static,
{
    PROTOCOLS
        .write()
        .register_fn(protocol, move |addr| f(&FsTarget::from_address(addr)))?;
    debug!(protocol, "Filesystem protocol registered");
    Ok(())
}

/// Registered protocol names.
pub fn protocols() -> Vec<String> {
    PROTOCOLS.read().schemes().map(str::to_string).collect()
}

/// Whether `protocol` is registered.
pub fn has_protocol(protocol: &str) -> bool {
    PROTOCOLS.read().contains(protocol)
}

/// Open the filesystem for `address`'s protocol.
pub fn open_filesystem(address: &libdata_core::Address) -> DataResult<Box<dyn FileSystem>> {
    let constructor = PROTOCOLS.read().resolve(address.scheme())?;
    constructor(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libdata_core::{Address, DataError};

    #[test]
    fn test_builtin_protocols() {
        assert!(has_protocol("file"));
        assert!(has_protocol("LOCAL"));
        assert!(!has_protocol("s3-test-unregistered"));
    }

    #[test]
    fn test_unknown_protocol() {
        let addr = Address::parse("nfs-test://host/share").unwrap();
        assert!(matches!(
            open_filesystem(&addr),
            Err(DataError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_register_protocol() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        register_protocol("memfs-test", move |target| {
            assert_eq!(target.protocol, "memfs-test");
            Ok(Box::new(LocalFileSystem::open(&root, false)?) as Box<dyn FileSystem>)
        })
        .unwrap();
        assert!(protocols().iter().any(|p| p == "memfs-test"));

        let fs = open_filesystem(&Address::parse("memfs-test://anything/").unwrap()).unwrap();
        assert_eq!(fs.protocol(), "file");
        assert!(register_protocol("memfs-test", |_| unreachable!()).is_err());
    }
}
