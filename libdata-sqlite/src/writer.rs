//! Table writer.

use libdata_core::{Address, DataError, DataResult, DocWriter, Document};
use tracing::debug;

use crate::client::SqliteClient;
use crate::config::SqliteConfig;

/// Inserts documents as rows of one table.
///
/// The table is created from the first document when missing, with the
/// configured primary key. Inserting an existing key fails with
/// `DuplicateTarget` unless the address sets `replace=true`.
#[derive(Debug)]
pub struct SqliteWriter {
    client: SqliteClient,
    table: String,
    primary_key: String,
    replace: bool,
    table_checked: bool,
    closed: bool,
}

impl SqliteWriter {
    /// Open a writer for `sqlite:///path.db?table=...`.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        Self::from_config(SqliteConfig::from_address(address)?)
    }

    /// Open a writer for a configuration with a table.
    pub fn from_config(config: SqliteConfig) -> DataResult<Self> {
        let table = config.require_table()?.to_string();
        let primary_key = config.primary_key.clone();
        let replace = config.replace;
        Ok(Self {
            client: SqliteClient::from_config(config),
            table,
            primary_key,
            replace,
            table_checked: false,
            closed: false,
        })
    }

    fn ensure_table(&mut self, doc: &Document) -> DataResult<()> {
        if self.table_checked {
            return Ok(());
        }
        if !self.client.table_exists(&self.table)? {
            debug!(table = %self.table, "Creating table for writer");
            self.client
                .create_table_for(&self.table, doc, &self.primary_key)?;
        }
        self.table_checked = true;
        Ok(())
    }
}

impl DocWriter for SqliteWriter {
    fn write(&mut self, doc: &Document) -> DataResult<()> {
        if self.closed {
            return Err(DataError::closed("write"));
        }
        if !doc.is_object() {
            return Err(DataError::InvalidDocument(
                "expected a JSON object for a SQLite row".into(),
            ));
        }
        self.ensure_table(doc)?;
        if self.replace {
            self.client.upsert(&self.table, doc)?;
        } else {
            self.client.insert(&self.table, doc)?;
        }
        Ok(())
    }

    fn close(&mut self) -> DataResult<()> {
        self.closed = true;
        self.client.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::SqliteReader;
    use libdata_core::DocReader;
    use serde_json::json;

    fn config(dir: &tempfile::TempDir) -> SqliteConfig {
        SqliteConfig::file(dir.path().join("writer.db")).table("docs")
    }

    #[test]
    fn test_creates_table_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SqliteWriter::from_config(config(&dir)).unwrap();
        writer.write(&json!({"id": 2, "text": "world"})).unwrap();
        writer.write(&json!({"id": 1, "text": "hello"})).unwrap();
        writer.close().unwrap();

        let mut reader = SqliteReader::from_config(config(&dir)).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.get(0).unwrap()["text"], json!("hello"));
    }

    #[test]
    fn test_duplicate_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SqliteWriter::from_config(config(&dir)).unwrap();
        writer.write(&json!({"id": 1, "text": "a"})).unwrap();
        let err = writer.write(&json!({"id": 1, "text": "b"})).unwrap_err();
        assert!(matches!(err, DataError::DuplicateTarget(_)));
    }

    #[test]
    fn test_replace() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.replace = true;
        let mut writer = SqliteWriter::from_config(config.clone()).unwrap();
        writer.write(&json!({"id": 1, "text": "a"})).unwrap();
        writer.write(&json!({"id": 1, "text": "b"})).unwrap();
        writer.close().unwrap();

        let mut reader = SqliteReader::from_config(config).unwrap();
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.read("1").unwrap()["text"], json!("b"));
    }

    #[test]
    fn test_write_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SqliteWriter::from_config(config(&dir)).unwrap();
        writer.close().unwrap();
        assert!(writer.write(&json!({"id": 1})).is_err());
    }
}
