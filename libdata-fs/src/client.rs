//! Lazy filesystem client.

use std::any::Any;

use libdata_core::{Address, ClientState, DataError, DataResult, LazyClient, Session};

use crate::connection::{FsConnection, FsConnector};
use crate::filesystem::FileSystem;
use crate::pool::pool_for;
use crate::target::FsTarget;

/// A filesystem session that opens its filesystem on first use.
///
/// ```rust
/// use libdata_fs::FsClient;
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut fs = FsClient::open(&format!("file://{}", dir.path().display())).unwrap();
///
/// fs.write("test.txt", b"The first line").unwrap();
/// fs.append("test.txt", b"\nThe second line").unwrap();
/// assert_eq!(fs.list_dir("").unwrap(), vec!["test.txt"]);
/// assert_eq!(fs.read_to_string("test.txt").unwrap(), "The first line\nThe second line");
///
/// fs.remove("test.txt").unwrap();
/// assert!(!fs.exists("test.txt").unwrap());
/// fs.close();
/// ```
#[derive(Debug)]
pub struct FsClient {
    inner: LazyClient<FsConnector>,
    target: FsTarget,
}

impl FsClient {
    /// Create an idle client for an address string.
    pub fn open(address: &str) -> DataResult<Self> {
        Self::from_address(&Address::parse(address)?)
    }

    /// Create an idle client for a parsed address.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        Ok(Self {
            inner: LazyClient::new(FsConnector::new(address.clone()), pool_for(address)),
            target: FsTarget::from_address(address),
        })
    }

    /// Decoded target.
    pub fn target(&self) -> &FsTarget {
        &self.target
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClientState {
        self.inner.state()
    }

    /// Open the filesystem now.
    pub fn connect(&mut self) -> DataResult<()> {
        self.inner.connect().map(|_| ())
    }

    /// Return the filesystem to the pool.
    pub fn close(&mut self) {
        self.inner.close();
    }

    fn with_fs<R>(&mut self, f: impl FnOnce(&dyn FileSystem) -> DataResult<R>) -> DataResult<R> {
        self.inner
            .with_connection(|conn: &mut FsConnection| f(conn.filesystem()))
    }

    /// Entry names of a directory relative to the root.
    pub fn list_dir(&mut self, path: &str) -> DataResult<Vec<String>> {
        self.with_fs(|fs| fs.list_dir(path))
    }

    /// Contents of a file.
    pub fn read(&mut self, path: &str) -> DataResult<Vec<u8>> {
        self.with_fs(|fs| fs.read(path))
    }

    /// Contents of a UTF-8 text file.
    pub fn read_to_string(&mut self, path: &str) -> DataResult<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes)
            .map_err(|e| DataError::serialization(format!("{path} is not UTF-8: {e}")))
    }

    /// Create or overwrite a file.
    pub fn write(&mut self, path: &str, data: &[u8]) -> DataResult<()> {
        self.with_fs(|fs| fs.write(path, data))
    }

    /// Append to a file.
    pub fn append(&mut self, path: &str, data: &[u8]) -> DataResult<()> {
        self.with_fs(|fs| fs.append(path, data))
    }

    /// Remove a file or directory.
    pub fn remove(&mut self, path: &str) -> DataResult<()> {
        self.with_fs(|fs| fs.remove(path))
    }

    /// Whether `path` exists.
    pub fn exists(&mut self, path: &str) -> DataResult<bool> {
        self.with_fs(|fs| fs.exists(path))
    }
}

impl Session for FsClient {
    fn kind(&self) -> &'static str {
        crate::KIND
    }

    fn state(&self) -> ClientState {
        FsClient::state(self)
    }

    fn connect(&mut self) -> DataResult<()> {
        FsClient::connect(self)
    }

    fn start_transaction(&mut self) -> DataResult<()> {
        self.inner.start_transaction()
    }

    fn commit(&mut self) -> DataResult<()> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> DataResult<()> {
        self.inner.rollback()
    }

    fn close(&mut self) {
        FsClient::close(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(dir: &tempfile::TempDir) -> FsClient {
        FsClient::open(&format!("file://{}", dir.path().display())).unwrap()
    }

    #[test]
    fn test_lazy_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = FsClient::open(&format!(
            "file://{}/later?create=true",
            dir.path().display()
        ))
        .unwrap();
        assert_eq!(fs.state(), ClientState::Idle);
        assert!(!dir.path().join("later").exists());

        fs.list_dir("").unwrap();
        assert_eq!(fs.state(), ClientState::Active);
        assert!(dir.path().join("later").is_dir());
        fs.close();
        assert_eq!(fs.state(), ClientState::Idle);
    }

    #[test]
    fn test_handles_are_pooled() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = client(&dir);
        a.write("x.txt", b"1").unwrap();
        let pool = std::sync::Arc::clone(a.inner.pool());
        a.close();
        assert_eq!(pool.idle_count(), 1);

        let mut b = client(&dir);
        assert_eq!(b.read_to_string("x.txt").unwrap(), "1");
        assert_eq!(pool.idle_count(), 0);
        b.close();
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_missing_root_fails_on_connect() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = FsClient::open(&format!("file://{}/missing", dir.path().display())).unwrap();
        let err = fs.list_dir("").unwrap_err();
        assert!(matches!(err, DataError::Connection { .. }));
        assert_eq!(fs.state(), ClientState::Idle);
    }

    #[test]
    fn test_unknown_option_fails_on_connect() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = FsClient::open(&format!("file://{}?colour=red", dir.path().display())).unwrap();
        assert!(fs.connect().is_err());
    }

    #[test]
    fn test_transactions_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = client(&dir);
        let err = Session::start_transaction(&mut fs).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedOperation { .. }));
    }
}
