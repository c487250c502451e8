//! Pooled filesystem handles.

use std::fmt;

use libdata_core::{Address, Connector, DataResult, NativeConnection};
use tracing::debug;

use crate::filesystem::FileSystem;
use crate::protocols::open_filesystem;

/// An open filesystem, held by a client or idle in a pool.
pub struct FsConnection {
    fs: Box<dyn FileSystem>,
}

impl FsConnection {
    /// Wrap an open filesystem.
    pub fn new(fs: Box<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// The filesystem.
    pub fn filesystem(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }
}

impl NativeConnection for FsConnection {
    fn close(mut self) -> DataResult<()> {
        debug!(protocol = self.fs.protocol(), "Filesystem closed");
        self.fs.close()
    }
}

impl fmt::Debug for FsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsConnection")
            .field("protocol", &self.fs.protocol())
            .finish()
    }
}

/// Opens filesystems for one address through the protocol registry.
#[derive(Debug, Clone)]
pub struct FsConnector {
    address: Address,
}

impl FsConnector {
    /// Connector for `address`.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Address being connected to.
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl Connector for FsConnector {
    type Connection = FsConnection;

    fn kind(&self) -> &'static str {
        crate::KIND
    }

    fn connect(&self) -> DataResult<FsConnection> {
        let fs = open_filesystem(&self.address)?;
        debug!(address = %self.address.redacted(), "Filesystem opened");
        Ok(FsConnection::new(fs))
    }
}
