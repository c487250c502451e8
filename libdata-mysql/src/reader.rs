//! Table reader.

use libdata_core::doc::check_index;
use libdata_core::{Address, DataError, DataResult, DocReader, Document};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::client::MysqlClient;
use crate::config::MysqlConfig;
use crate::types::quote_ident;

/// Reads the rows of one table, ordered by primary key.
///
/// Keys are listed once when the reader opens; rows are fetched one by one
/// on access through a pooled client.
#[derive(Debug)]
pub struct MysqlReader {
    client: MysqlClient,
    table: String,
    primary_key: String,
    keys: Vec<JsonValue>,
}

impl MysqlReader {
    /// Open a reader for `mysql://host/database/table`.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        Self::from_config(MysqlConfig::from_address(address)?)
    }

    /// Open a reader for a configuration with a table.
    pub fn from_config(config: MysqlConfig) -> DataResult<Self> {
        let table = config.require_table()?.to_string();
        let primary_key = config.primary_key.clone();
        let mut client = MysqlClient::from_config(config);

        let sql = format!(
            "SELECT {pk} FROM {table} ORDER BY {pk}",
            pk = quote_ident(&primary_key),
            table = quote_ident(&table)
        );
        let listed = client.query(&sql, &[]);
        client.close();
        let keys: Vec<JsonValue> = listed?
            .into_iter()
            .map(|mut row| row[primary_key.as_str()].take())
            .collect();

        debug!(table = %table, rows = keys.len(), "MySQL reader opened");
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
        let row = self.client.find(&self.table, &self.primary_key, key);
        self.client.close();
        row?.ok_or_else(|| DataError::KeyNotFound(render_key(key)))
    }
}

fn render_key(key: &JsonValue) -> String {
    match key {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl DocReader for MysqlReader {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_required() {
        let err = MysqlReader::from_config(MysqlConfig::new("shop")).unwrap_err();
        assert!(matches!(err, DataError::InvalidOption { ref key, .. } if key == "table"));
    }

    #[test]
    fn test_unreachable_server() {
        let address = Address::parse("mysql://root@127.0.0.1:1/shop/users?connect_timeout=2").unwrap();
        let err = MysqlReader::from_address(&address).unwrap_err();
        assert!(matches!(err, DataError::Connection { .. }), "{err}");
    }

    #[test]
    fn test_render_key() {
        assert_eq!(render_key(&json!("a-1")), "a-1");
        assert_eq!(render_key(&json!(42)), "42");
    }
}
