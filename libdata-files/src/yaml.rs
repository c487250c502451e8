//! YAML files, including multi-document streams.

use std::fs;
use std::path::{Path, PathBuf};

use libdata_core::{Address, DataResult, DocReader, Document};
use serde::Deserialize;
use tracing::debug;

use crate::error::{FilesError, FilesResult};
use crate::loaded::LoadedDocuments;
use crate::options::FileReaderOptions;

/// Reads every document of a YAML file.
///
/// Each `---` separated document becomes one entry. A file holding a single
/// sequence yields its items instead. Empty documents are skipped.
#[derive(Debug)]
pub struct YamlReader {
    path: PathBuf,
    docs: LoadedDocuments,
}

impl YamlReader {
    /// Open a reader for `yaml:///path` or `yml:///path`.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        let opts = FileReaderOptions::from_address(address)?;
        Ok(Self::open(&opts.path, &opts.key_field)?)
    }

    /// Load `path`, indexing `read(key)` lookups on `key_field`.
    pub fn open(path: impl AsRef<Path>, key_field: &str) -> FilesResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FilesError::io(path, e))?;
        let docs = parse_stream(path, &content)?;
        debug!(path = %path.display(), docs = docs.len(), "YAML file loaded");
        Ok(Self {
            path: path.to_path_buf(),
            docs: LoadedDocuments::new(docs, key_field),
        })
    }

    /// File being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a YAML stream into documents.
pub fn parse_stream(path: &Path, content: &str) -> FilesResult<Vec<Document>> {
    let mut docs = Vec::new();
    for de in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(de).map_err(|source| yaml_error(path, source))?;
        if !value.is_null() {
            docs.push(to_document(path, value)?);
        }
    }
    if docs.len() == 1 && docs[0].is_array() {
        if let Some(Document::Array(items)) = docs.pop() {
            return Ok(items);
        }
    }
    Ok(docs)
}

/// Parse a file expected to hold exactly one YAML document.
pub fn parse_single(path: &Path, content: &str) -> FilesResult<Document> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|source| yaml_error(path, source))?;
    to_document(path, value)
}

/// Convert through `serde_json`, so mapping keys that are not strings are
/// rendered as text.
fn to_document(path: &Path, value: serde_yaml::Value) -> FilesResult<Document> {
    serde_json::to_value(stringify_keys(value)).map_err(|source| FilesError::Json {
        path: path.to_path_buf(),
        line: None,
        source,
    })
}

fn stringify_keys(value: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;

    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::String(s) => Value::String(s),
                        Value::Bool(b) => Value::String(b.to_string()),
                        Value::Number(n) => Value::String(n.to_string()),
                        Value::Null => Value::String("null".to_string()),
                        other => Value::String(
                            serde_yaml::to_string(&other)
                                .map(|s| s.trim_end().to_string())
                                .unwrap_or_default(),
                        ),
                    };
                    (key, stringify_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(stringify_keys).collect()),
        Value::Tagged(tagged) => stringify_keys(tagged.value),
        other => other,
    }
}

fn yaml_error(path: &Path, source: serde_yaml::Error) -> FilesError {
    FilesError::Yaml {
        path: path.to_path_buf(),
        source,
    }
}

impl DocReader for YamlReader {
    fn len(&self) -> usize {
        self.docs.len()
    }

    fn get(&mut self, index: usize) -> DataResult<Document> {
        self.docs.get(index)
    }

    fn read(&mut self, key: &str) -> DataResult<Document> {
        self.docs.read(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libdata_core::DataError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_multi_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "docs.yaml",
            "id: a\ntext: first\n---\nid: b\ntext: second\n---\n",
        );
        let mut reader = YamlReader::open(&path, "id").unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.read("b").unwrap(), json!({"id": "b", "text": "second"}));
    }

    #[test]
    fn test_sequence_expands() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.yml", "- id: 1\n- id: 2\n- id: 3\n");
        let mut reader = YamlReader::open(&path, "id").unwrap();
        assert_eq!(reader.len(), 3);
        assert_eq!(reader.get(2).unwrap(), json!({"id": 3}));
        assert_eq!(reader.read("1").unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_non_string_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "keys.yaml", "1: one\ntrue: yes\nnested:\n  2: two\n");
        let mut reader = YamlReader::open(&path, "id").unwrap();
        assert_eq!(
            reader.get(0).unwrap(),
            json!({"1": "one", "true": "yes", "nested": {"2": "two"}})
        );
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.yaml", "");
        let reader = YamlReader::open(&path, "id").unwrap();
        assert!(reader.is_empty());
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.yaml", "a: [1, 2\n");
        let err: DataError = YamlReader::open(&path, "id").unwrap_err().into();
        assert!(matches!(err, DataError::Serialization(_)));
    }
}
