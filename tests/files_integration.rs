//! Integration tests for the document file backends.

use std::fs;

use libdata::{DataError, DocReader};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Test JSON Lines written through the registry
#[test]
fn test_jsonl_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("jsonl://{}/out.jsonl", dir.path().display());

    let mut writer = libdata::writer(url.as_str()).unwrap();
    for i in 0..5 {
        writer.write(&json!({"id": format!("doc-{i}"), "n": i})).unwrap();
    }
    writer.close().unwrap();

    let mut reader = libdata::reader(url.as_str()).unwrap();
    let ns: Vec<_> = reader
        .iter()
        .map(|doc| doc.unwrap()["n"].as_i64().unwrap())
        .collect();
    assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    assert_eq!(reader.read("doc-3").unwrap()["n"], json!(3));

    let err = libdata::writer(url.as_str())
        .unwrap()
        .write(&json!({"id": "x"}))
        .unwrap_err();
    assert!(matches!(err, DataError::DuplicateTarget(_)));
}

/// Test a JSON array file with a custom key field
#[test]
fn test_json_key_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.json");
    fs::write(&path, r#"[{"name": "ada"}, {"name": "grace"}]"#).unwrap();

    let url = format!("json://{}?key_field=name", path.display());
    let mut reader = libdata::reader(url.as_str()).unwrap();
    assert_eq!(reader.read("grace").unwrap(), json!({"name": "grace"}));
}

/// Test a multi-document YAML stream
#[test]
fn test_yaml_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docs.yml");
    fs::write(&path, "id: 1\ntags: [a, b]\n---\nid: 2\ntags: []\n").unwrap();

    let mut reader = libdata::reader(format!("yml://{}", path.display()).as_str()).unwrap();
    assert_eq!(reader.len(), 2);
    assert_eq!(reader.get(0).unwrap(), json!({"id": 1, "tags": ["a", "b"]}));
}

/// Test a YAML directory written and read through the registry
#[test]
fn test_yamldir_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("yamldir://{}/cards", dir.path().display());

    let mut writer = libdata::writer(url.as_str()).unwrap();
    writer.write(&json!({"id": "alpha", "rank": 1})).unwrap();
    writer.write(&json!({"id": "beta", "rank": 2})).unwrap();
    writer.close().unwrap();
    assert!(dir.path().join("cards/alpha.yaml").is_file());

    let mut reader = libdata::reader(url.as_str()).unwrap();
    assert_eq!(reader.len(), 2);
    assert_eq!(reader.read("beta").unwrap()["rank"], json!(2));

    let indexed = format!("{url}?key_field=rank");
    let mut reader = libdata::reader(indexed.as_str()).unwrap();
    assert_eq!(reader.read("1").unwrap()["id"], json!("alpha"));
}

/// Test the directory reader on a missing directory
#[test]
fn test_yamldir_missing() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("yamldir://{}/nothing", dir.path().display());
    assert!(matches!(
        libdata::reader(url.as_str()),
        Err(DataError::InvalidOption { .. })
    ));
}
