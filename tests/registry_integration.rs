//! Integration tests for the process-wide registries.

use std::sync::atomic::{AtomicUsize, Ordering};

use libdata::{ClientState, DataError, DocReader, Session};
use libdata_core::MemoryReader;
use pretty_assertions::assert_eq;
use serde_json::json;

/// Test registering a custom reader scheme
#[test]
fn test_register_reader() {
    libdata::register_reader("memtest", |addr| {
        let count = addr
            .param("count")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let docs = (0..count).map(|i| json!({"id": i})).collect();
        Ok(Box::new(MemoryReader::new(docs).with_key_field("id")) as Box<dyn DocReader>)
    })
    .unwrap();

    let mut reader = libdata::reader("memtest://anywhere/?count=3").unwrap();
    assert_eq!(reader.len(), 3);
    assert_eq!(reader.read("2").unwrap(), json!({"id": 2}));
}

/// Test that schemes are matched case-insensitively and cannot be registered twice
#[test]
fn test_duplicate_scheme() {
    libdata::register_reader("dupetest", |_| {
        Ok(Box::new(MemoryReader::new(Vec::new())) as Box<dyn DocReader>)
    })
    .unwrap();
    let err = libdata::register_reader("DupeTest", |_| {
        Ok(Box::new(MemoryReader::new(Vec::new())) as Box<dyn DocReader>)
    })
    .unwrap_err();
    assert!(matches!(err, DataError::DuplicateScheme { .. }));
}

/// Test that a constructor may use the registry itself
#[test]
fn test_reentrant_constructor() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    libdata::register_client("reentranttest", |_| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        libdata::client("sqlite::memory:")
    })
    .unwrap();

    let client = libdata::client("reentranttest://x/").unwrap();
    assert_eq!(client.kind(), "sqlite");
    assert_eq!(client.state(), ClientState::Idle);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

/// Test errors for schemes nobody registered
#[test]
fn test_unsupported_scheme() {
    let err = libdata::writer("yaml:///tmp/never.yaml").err().unwrap();
    assert!(matches!(
        err,
        DataError::UnsupportedScheme { ref scheme, .. } if scheme == "yaml"
    ));
    let err = libdata::client("json:///tmp/x.json").err().unwrap();
    assert!(matches!(err, DataError::UnsupportedScheme { .. }));
}

/// Test the client session downcast
#[test]
fn test_downcast_client() {
    let mut session: Box<dyn Session> = libdata::client("sqlite::memory:").unwrap();
    let sqlite = session
        .downcast_mut::<libdata::sqlite::SqliteClient>()
        .expect("sqlite client");
    sqlite
        .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")
        .unwrap();
    assert_eq!(session.state(), ClientState::Active);
    session.close();
    assert_eq!(session.state(), ClientState::Idle);
}

/// Test that the built-in MySQL scheme yields lazy clients and table readers
#[test]
fn test_mysql_scheme() {
    let mut session = libdata::client("mysql://app:pw@127.0.0.1:1/shop").unwrap();
    assert_eq!(session.kind(), "mysql");
    assert_eq!(session.state(), ClientState::Idle);
    let client = session
        .as_any_mut()
        .downcast_mut::<libdata::mysql::MysqlClient>()
        .unwrap();
    assert_eq!(client.config().database, "shop");

    assert!(matches!(
        libdata::reader("mysql://127.0.0.1:1/shop"),
        Err(DataError::InvalidOption { .. })
    ));
    assert!(matches!(
        libdata::writer("mysql://127.0.0.1:1/shop/users"),
        Err(DataError::UnsupportedScheme { .. })
    ));
}
