//! Lazy SQLite client.

use std::any::Any;
use std::sync::Arc;

use libdata_core::{
    Address, ClientState, DataError, DataResult, Document, LazyClient, Session,
};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::SqliteConfig;
use crate::connection::{SqliteConnection, SqliteConnector};
use crate::error::SqliteError;
use crate::pool::pool_for;
use crate::types::{column_type, quote_ident};

/// A SQLite session that connects on first use.
///
/// ```rust
/// use libdata_sqlite::SqliteClient;
/// use serde_json::json;
///
/// let mut client = SqliteClient::open("sqlite::memory:").unwrap();
/// client.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
///
/// client.start_transaction().unwrap();
/// client.insert("users", &json!({"id": 1, "name": "Alice"})).unwrap();
/// client.commit().unwrap();
///
/// let user = client.find("users", "id", &json!(1)).unwrap().unwrap();
/// assert_eq!(user["name"], "Alice");
/// ```
#[derive(Debug)]
pub struct SqliteClient {
    inner: LazyClient<SqliteConnector>,
    config: Arc<SqliteConfig>,
}

impl SqliteClient {
    /// Create an idle client for a `sqlite:` address.
    pub fn open(address: &str) -> DataResult<Self> {
        Self::from_address(&Address::parse(address)?)
    }

    /// Create an idle client for a parsed address.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        Ok(Self::from_config(SqliteConfig::from_address(address)?))
    }

    /// Create an idle client for a configuration.
    pub fn from_config(config: SqliteConfig) -> Self {
        let config = Arc::new(config);
        let pool = pool_for(&config);
        let connector = SqliteConnector::new(Arc::clone(&config));
        Self {
            inner: LazyClient::new(connector, pool),
            config,
        }
    }

    /// Client configuration.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClientState {
        self.inner.state()
    }

    /// Acquire a connection now.
    pub fn connect(&mut self) -> DataResult<()> {
        self.inner.connect().map(|_| ())
    }

    /// Begin a transaction.
    pub fn start_transaction(&mut self) -> DataResult<()> {
        self.inner.start_transaction()
    }

    /// Commit the open transaction.
    pub fn commit(&mut self) -> DataResult<()> {
        self.inner.commit()
    }

    /// Roll back the open transaction.
    pub fn rollback(&mut self) -> DataResult<()> {
        self.inner.rollback()
    }

    /// Return the connection to the pool.
    pub fn close(&mut self) {
        self.inner.close()
    }

    /// Run an operation against the native connection.
    pub fn with_connection<R>(
        &mut self,
        f: impl FnOnce(&mut SqliteConnection) -> DataResult<R>,
    ) -> DataResult<R> {
        self.inner.with_connection(f)
    }

    /// Execute a statement, returning the number of affected rows.
    pub fn execute(&mut self, sql: &str, params: &[JsonValue]) -> DataResult<usize> {
        self.with_connection(|conn| Ok(conn.execute(sql, params)?))
    }

    /// Execute several statements.
    pub fn execute_batch(&mut self, sql: &str) -> DataResult<()> {
        self.with_connection(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Run a query, returning every row.
    pub fn query(&mut self, sql: &str, params: &[JsonValue]) -> DataResult<Vec<Document>> {
        self.with_connection(|conn| Ok(conn.query(sql, params)?))
    }

    /// Run a query, returning the first row.
    pub fn query_one(&mut self, sql: &str, params: &[JsonValue]) -> DataResult<Option<Document>> {
        self.with_connection(|conn| Ok(conn.query_optional(sql, params)?))
    }

    /// Whether `table` exists.
    pub fn table_exists(&mut self, table: &str) -> DataResult<bool> {
        let row = self.query_one(
            "SELECT 1 AS found FROM sqlite_master WHERE type = 'table' AND name = ?1",
            &[JsonValue::String(table.to_string())],
        )?;
        Ok(row.is_some())
    }

    /// Create `table` with one column per field of `doc`.
    ///
    /// `primary_key` becomes the primary key when the document has it.
    pub fn create_table_for(
        &mut self,
        table: &str,
        doc: &Document,
        primary_key: &str,
    ) -> DataResult<()> {
        let fields = object_fields(doc)?;
        let columns: Vec<String> = fields
            .iter()
            .map(|(name, value)| {
                let mut column = format!("{} {}", quote_ident(name), column_type(value));
                if name.as_str() == primary_key {
                    column.push_str(" PRIMARY KEY");
                }
                column
            })
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table),
            columns.join(", ")
        );
        debug!(table, "Creating table from document");
        self.execute_batch(&sql)
    }

    /// Insert an object document as a row, returning its rowid.
    ///
    /// A unique or primary-key violation is reported as `DuplicateTarget`.
    pub fn insert(&mut self, table: &str, doc: &Document) -> DataResult<i64> {
        self.insert_row(table, doc, false)
    }

    /// Insert or replace an object document, returning its rowid.
    pub fn upsert(&mut self, table: &str, doc: &Document) -> DataResult<i64> {
        self.insert_row(table, doc, true)
    }

    /// Find the row whose `key_column` equals `key`.
    pub fn find(
        &mut self,
        table: &str,
        key_column: &str,
        key: &JsonValue,
    ) -> DataResult<Option<Document>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(key_column)
        );
        self.query_one(&sql, std::slice::from_ref(key))
    }

    /// Update the fields of `doc` on the row whose `key_column` equals `key`.
    pub fn update(
        &mut self,
        table: &str,
        key_column: &str,
        key: &JsonValue,
        doc: &Document,
    ) -> DataResult<usize> {
        let fields = object_fields(doc)?;
        if fields.is_empty() {
            return Ok(0);
        }
        let assignments: Vec<String> = fields
            .keys()
            .enumerate()
            .map(|(i, name)| format!("{} = ?{}", quote_ident(name), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(table),
            assignments.join(", "),
            quote_ident(key_column),
            fields.len() + 1
        );
        let mut params: Vec<JsonValue> = fields.values().cloned().collect();
        params.push(key.clone());
        self.execute(&sql, &params)
    }

    /// Delete the row whose `key_column` equals `key`.
    pub fn delete(&mut self, table: &str, key_column: &str, key: &JsonValue) -> DataResult<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(key_column)
        );
        self.execute(&sql, std::slice::from_ref(key))
    }

    fn insert_row(&mut self, table: &str, doc: &Document, replace: bool) -> DataResult<i64> {
        let fields = object_fields(doc)?;
        let columns: Vec<String> = fields.keys().map(|name| quote_ident(name)).collect();
        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{i}")).collect();
        let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
        let sql = if fields.is_empty() {
            format!("{verb} INTO {} DEFAULT VALUES", quote_ident(table))
        } else {
            format!(
                "{verb} INTO {} ({}) VALUES ({})",
                quote_ident(table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };
        let params: Vec<JsonValue> = fields.values().cloned().collect();

        self.with_connection(|conn| {
            conn.execute(&sql, &params).map_err(|e| match e {
                SqliteError::Sqlite(e) => SqliteError::on_insert(table, e),
                other => other,
            })?;
            Ok(conn.last_insert_rowid())
        })
    }
}

fn object_fields(doc: &Document) -> DataResult<&serde_json::Map<String, JsonValue>> {
    doc.as_object()
        .ok_or_else(|| DataError::InvalidDocument("expected a JSON object for a SQLite row".into()))
}

impl Session for SqliteClient {
    fn kind(&self) -> &'static str {
        crate::KIND
    }

    fn state(&self) -> ClientState {
        SqliteClient::state(self)
    }

    fn connect(&mut self) -> DataResult<()> {
        SqliteClient::connect(self)
    }

    fn start_transaction(&mut self) -> DataResult<()> {
        SqliteClient::start_transaction(self)
    }

    fn commit(&mut self) -> DataResult<()> {
        SqliteClient::commit(self)
    }

    fn rollback(&mut self) -> DataResult<()> {
        SqliteClient::rollback(self)
    }

    fn close(&mut self) {
        SqliteClient::close(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
