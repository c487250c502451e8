//! Registering a filesystem before anything else touches the registries.
//!
//! Kept in its own test binary so the registration below is the first
//! facade call of the process.

use libdata::fs::{FileSystem, FsClient, LocalFileSystem};
use libdata::{DataError, Session};
use pretty_assertions::assert_eq;

/// Test that the first facade call can register a filesystem protocol
#[test]
fn test_register_filesystem_first() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    libdata::register_filesystem("firstfs", move |_| {
        Ok(Box::new(LocalFileSystem::open(root.clone(), false)?) as Box<dyn FileSystem>)
    })
    .expect("first registration succeeds");

    assert!(libdata::backends().unwrap().clients.contains("firstfs"));

    let mut session = libdata::client("firstfs://store/data").unwrap();
    let fs = session.downcast_mut::<FsClient>().unwrap();
    fs.write("hello.txt", b"hi").unwrap();
    session.close();
    assert_eq!(std::fs::read(dir.path().join("hello.txt")).unwrap(), b"hi");

    let again = libdata::register_filesystem("FirstFS", |_| {
        Err(DataError::unsupported("firstfs", "never called"))
    });
    assert!(matches!(again, Err(DataError::DuplicateScheme { .. })));
}
