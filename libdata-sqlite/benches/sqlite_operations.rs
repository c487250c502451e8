//! Benchmarks for SQLite operations.

use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{Criterion, criterion_group, criterion_main};
use libdata_core::{DocReader, DocWriter};
use libdata_sqlite::{SqliteClient, SqliteConfig, SqliteReader, SqliteWriter};
use serde_json::json;

/// Counter for unique email addresses.
static EMAIL_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Create a test database with a users table in a temp directory.
fn setup_test_db() -> (SqliteConfig, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = SqliteConfig::file(temp_dir.path().join("test.db")).table("users");

    let mut client = SqliteClient::from_config(config.clone());
    client
        .execute_batch(
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                age INTEGER,
                active INTEGER DEFAULT 1
            );
            "#,
        )
        .unwrap();

    (config, temp_dir)
}

/// Insert sample users into the database.
fn insert_sample_users(config: &SqliteConfig, count: usize) {
    let mut writer = SqliteWriter::from_config(config.clone()).unwrap();
    for i in 0..count {
        writer
            .write(&json!({
                "name": format!("User {i}"),
                "email": format!("user{i}@example.com"),
                "age": 20 + (i % 50),
                "active": i % 2 == 0,
            }))
            .unwrap();
    }
    writer.close().unwrap();
}

/// Pooled vs fresh connection acquisition.
fn bench_connect(c: &mut Criterion) {
    let (config, _temp_dir) = setup_test_db();

    c.bench_function("client_connect_pooled", |b| {
        let mut client = SqliteClient::from_config(config.clone());
        b.iter(|| {
            client.connect().unwrap();
            client.close();
        });
    });

    c.bench_function("client_connect_fresh", |b| {
        b.iter(|| {
            let conn = libdata_sqlite::SqliteConnection::open(&config).unwrap();
            black_box(conn)
        });
    });
}

fn bench_insert(c: &mut Criterion) {
    let (config, _temp_dir) = setup_test_db();
    let mut client = SqliteClient::from_config(config);

    c.bench_function("single_insert", |b| {
        b.iter(|| {
            let counter = EMAIL_COUNTER.fetch_add(1, Ordering::SeqCst);
            let doc = json!({
                "name": format!("Test {counter}"),
                "email": format!("bench{counter}@example.com"),
                "age": 25,
            });
            black_box(client.insert("users", &doc).unwrap())
        });
    });
}

fn bench_read(c: &mut Criterion) {
    let (config, _temp_dir) = setup_test_db();
    insert_sample_users(&config, 100);

    let mut group = c.benchmark_group("read");

    group.bench_function("reader_open", |b| {
        b.iter(|| black_box(SqliteReader::from_config(config.clone()).unwrap()))
    });

    let mut reader = SqliteReader::from_config(config.clone()).unwrap();
    group.bench_function("reader_get", |b| {
        b.iter(|| black_box(reader.get(50).unwrap()))
    });

    group.bench_function("reader_iterate", |b| {
        b.iter(|| {
            let count = reader.iter().filter(|doc| doc.is_ok()).count();
            black_box(count)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_connect, bench_insert, bench_read);
criterion_main!(benches);
