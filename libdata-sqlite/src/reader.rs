//! Table reader.

use libdata_core::doc::check_index;
use libdata_core::{Address, DataError, DataResult, DocReader, Document};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::client::SqliteClient;
use crate::config::SqliteConfig;
use crate::types::quote_ident;

/// Reads the rows of one table, ordered by primary key.
///
/// The key list is fetched once at construction; rows are fetched by key on
/// access, so a row deleted in the meantime reads as `KeyNotFound`.
#[derive(Debug)]
pub struct SqliteReader {
    client: SqliteClient,
    table: String,
    primary_key: String,
    keys: Vec<JsonValue>,
}

impl SqliteReader {
    /// Open a reader for `sqlite:///path.db?table=...`.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        Self::from_config(SqliteConfig::from_address(address)?)
    }

    /// Open a reader for a configuration with a table.
    pub fn from_config(config: SqliteConfig) -> DataResult<Self> {
        let table = config.require_table()?.to_string();
        let primary_key = config.primary_key.clone();
        let mut client = SqliteClient::from_config(config);

        let sql = format!(
            "SELECT {pk} FROM {table} ORDER BY {pk}",
            pk = quote_ident(&primary_key),
            table = quote_ident(&table)
        );
        let keys = client
            .query(&sql, &[])?
            .into_iter()
            .map(|mut row| row[primary_key.as_str()].take())
            .collect::<Vec<_>>();
        client.close();

        debug!(table = %table, rows = keys.len(), "SQLite reader opened");
        Ok(Self {
            client,
            table,
            primary_key,
            keys,
        })
    }

    /// Primary keys, in reading order.
    pub fn keys(&self) -> &[JsonValue] {
        &self.keys
    }

    fn fetch(&mut self, key: &JsonValue) -> DataResult<Document> {
        self.client
            .find(&self.table, &self.primary_key, key)?
            .ok_or_else(|| DataError::KeyNotFound(render_key(key)))
    }
}

fn render_key(key: &JsonValue) -> String {
    match key {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl DocReader for SqliteReader {
    fn len(&self) -> usize {
        self.keys.len()
    }

    fn get(&mut self, index: usize) -> DataResult<Document> {
        check_index(index, self.keys.len())?;
        let key = self.keys[index].clone();
        self.fetch(&key)
    }

    fn read(&mut self, key: &str) -> DataResult<Document> {
        self.fetch(&JsonValue::String(key.to_string()))
    }

    fn close(&mut self) -> DataResult<()> {
        self.client.close();
        Ok(())
    }
}
