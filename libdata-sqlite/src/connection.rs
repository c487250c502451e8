//! SQLite connection wrapper.

use std::sync::Arc;
use std::time::Duration;

use libdata_core::{Connector, DataResult, Document, NativeConnection};
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};
use crate::types::{row_to_document, to_sqlite_value};

/// A native SQLite connection.
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Open a connection and apply the configuration's pragmas.
    pub fn open(config: &SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory(),
            DatabasePath::File(path) => Connection::open(path),
        }
        .map_err(SqliteError::Connection)?;

        conn.busy_timeout(Duration::from_millis(u64::from(config.busy_timeout_ms)))
            .map_err(SqliteError::Connection)?;
        conn.execute_batch(&config.init_sql())
            .map_err(SqliteError::Connection)?;

        debug!(path = %config.path.display(), "SQLite connection opened");
        Ok(Self { conn })
    }

    /// The underlying driver connection.
    pub fn inner(&self) -> &Connection {
        &self.conn
    }

    /// Execute a statement and return the number of affected rows.
    pub fn execute(&self, sql: &str, params: &[JsonValue]) -> SqliteResult<usize> {
        debug!(sql = %sql, "Executing statement");
        let values = params.iter().map(to_sqlite_value);
        Ok(self.conn.execute(sql, params_from_iter(values))?)
    }

    /// Execute several statements separated by semicolons.
    pub fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        debug!(sql = %sql, "Executing batch");
        Ok(self.conn.execute_batch(sql)?)
    }

    /// Execute a query and return all rows as documents.
    pub fn query(&self, sql: &str, params: &[JsonValue]) -> SqliteResult<Vec<Document>> {
        debug!(sql = %sql, "Executing query");
        let mut stmt = self.conn.prepare_cached(sql)?;
        let columns = column_names(&stmt);
        let values = params.iter().map(to_sqlite_value);
        let rows = stmt.query_map(params_from_iter(values), |row| row_to_document(row, &columns))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Execute a query and return the first row, if any.
    pub fn query_optional(&self, sql: &str, params: &[JsonValue]) -> SqliteResult<Option<Document>> {
        debug!(sql = %sql, "Executing query_optional");
        let mut stmt = self.conn.prepare_cached(sql)?;
        let columns = column_names(&stmt);
        let values = params.iter().map(to_sqlite_value);
        Ok(stmt
            .query_row(params_from_iter(values), |row| row_to_document(row, &columns))
            .optional()?)
    }

    /// Rowid of the most recent successful insert.
    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Whether a transaction is open on this connection.
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().iter().map(|s| s.to_string()).collect()
}

impl NativeConnection for SqliteConnection {
    fn close(self) -> DataResult<()> {
        trace!("Closing SQLite connection");
        self.conn
            .close()
            .map_err(|(_, e)| SqliteError::Sqlite(e).into())
    }

    fn begin(&mut self) -> DataResult<()> {
        Ok(self.execute_batch("BEGIN")?)
    }

    fn commit(&mut self) -> DataResult<()> {
        Ok(self.execute_batch("COMMIT")?)
    }

    fn rollback(&mut self) -> DataResult<()> {
        Ok(self.execute_batch("ROLLBACK")?)
    }

    fn reset(&mut self) -> DataResult<()> {
        if self.in_transaction() {
            self.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.conn.path())
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

/// Opens connections for one SQLite configuration.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    config: Arc<SqliteConfig>,
}

impl SqliteConnector {
    /// Create a connector.
    pub fn new(config: Arc<SqliteConfig>) -> Self {
        Self { config }
    }

    /// The configuration connections are opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }
}

impl Connector for SqliteConnector {
    type Connection = SqliteConnection;

    fn kind(&self) -> &'static str {
        crate::KIND
    }

    fn connect(&self) -> DataResult<SqliteConnection> {
        Ok(SqliteConnection::open(&self.config)?)
    }

    fn supports_transactions(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory() -> SqliteConnection {
        let conn = SqliteConnection::open(&SqliteConfig::memory()).unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, tags TEXT)")
            .unwrap();
        conn
    }

    #[test]
    fn test_execute_and_query() {
        let conn = memory();
        let n = conn
            .execute(
                "INSERT INTO t (id, name, tags) VALUES (?1, ?2, ?3)",
                &[json!(1), json!("a"), json!(["x", "y"])],
            )
            .unwrap();
        assert_eq!(n, 1);

        let rows = conn.query("SELECT * FROM t", &[]).unwrap();
        assert_eq!(rows, vec![json!({"id": 1, "name": "a", "tags": ["x", "y"]})]);
    }

    #[test]
    fn test_query_optional() {
        let conn = memory();
        assert_eq!(
            conn.query_optional("SELECT * FROM t WHERE id = ?1", &[json!(9)])
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_transaction_and_reset() {
        let mut conn = memory();
        conn.begin().unwrap();
        assert!(conn.in_transaction());
        conn.execute("INSERT INTO t (id) VALUES (1)", &[]).unwrap();
        conn.reset().unwrap();
        assert!(!conn.in_transaction());
        assert!(conn.query("SELECT * FROM t", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_connect_failure_is_connection_error() {
        let config = SqliteConfig::file("/nonexistent-dir/sub/app.db");
        let err = SqliteConnector::new(Arc::new(config)).connect().unwrap_err();
        assert!(err.is_retryable());
    }
}
