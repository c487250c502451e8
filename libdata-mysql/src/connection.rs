//! MySQL connection wrapper.

use std::sync::Arc;

use libdata_core::{Connector, DataResult, Document, NativeConnection};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Row};
use serde_json::Value as JsonValue;
use tracing::{debug, trace, warn};

use crate::config::MysqlConfig;
use crate::error::{MysqlError, MysqlResult};
use crate::runtime::{block_on, runtime};
use crate::types::{row_to_document, to_params};

/// A native MySQL connection driven by the shared runtime.
pub struct MysqlConnection {
    conn: Option<Conn>,
    in_transaction: bool,
}

impl MysqlConnection {
    /// Connect to the server named by `config`.
    pub fn open(config: &MysqlConfig) -> MysqlResult<Self> {
        let opts = config.to_opts();
        let timeout = config.connect_timeout;
        let conn = block_on(async move {
            let connecting = Conn::new(opts);
            let result = match timeout {
                Some(after) => tokio::time::timeout(after, connecting)
                    .await
                    .map_err(|_| MysqlError::Timeout(after))?,
                None => connecting.await,
            };
            result.map_err(MysqlError::Connection)
        })?;

        debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "MySQL connection opened"
        );
        Ok(Self {
            conn: Some(conn),
            in_transaction: false,
        })
    }

    fn conn(&mut self) -> MysqlResult<&mut Conn> {
        self.conn.as_mut().ok_or(MysqlError::Closed)
    }

    /// Execute a statement and return the number of affected rows.
    pub fn execute(&mut self, sql: &str, params: &[JsonValue]) -> MysqlResult<u64> {
        debug!(sql = %sql, "Executing statement");
        let params = to_params(params);
        let conn = self.conn()?;
        block_on(async move {
            conn.exec_drop(sql, params).await?;
            Ok(conn.affected_rows())
        })
    }

    /// Execute one or more statements without parameters.
    pub fn execute_batch(&mut self, sql: &str) -> MysqlResult<()> {
        debug!(sql = %sql, "Executing batch");
        let conn = self.conn()?;
        block_on(async move { Ok(conn.query_drop(sql).await?) })
    }

    /// Execute a query and return all rows as documents.
    pub fn query(&mut self, sql: &str, params: &[JsonValue]) -> MysqlResult<Vec<Document>> {
        debug!(sql = %sql, "Executing query");
        let params = to_params(params);
        let conn = self.conn()?;
        let rows: Vec<Row> = block_on(async move { Ok(conn.exec(sql, params).await?) })?;
        Ok(rows.into_iter().map(row_to_document).collect())
    }

    /// Execute a query and return the first row, if any.
    pub fn query_optional(&mut self, sql: &str, params: &[JsonValue]) -> MysqlResult<Option<Document>> {
        debug!(sql = %sql, "Executing query_optional");
        let params = to_params(params);
        let conn = self.conn()?;
        let row: Option<Row> = block_on(async move { Ok(conn.exec_first(sql, params).await?) })?;
        Ok(row.map(row_to_document))
    }

    /// Auto-increment id generated by the most recent insert.
    pub fn last_insert_id(&self) -> Option<u64> {
        self.conn.as_ref().and_then(|conn| conn.last_insert_id())
    }

    /// Whether a transaction is open on this connection.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

impl NativeConnection for MysqlConnection {
    fn close(mut self) -> DataResult<()> {
        trace!("Closing MySQL connection");
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        Ok(block_on(async move { Ok(conn.disconnect().await?) })?)
    }

    fn begin(&mut self) -> DataResult<()> {
        self.execute_batch("START TRANSACTION")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> DataResult<()> {
        self.execute_batch("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> DataResult<()> {
        self.execute_batch("ROLLBACK")?;
        self.in_transaction = false;
        Ok(())
    }

    fn reset(&mut self) -> DataResult<()> {
        if self.in_transaction {
            NativeConnection::rollback(self)?;
        }
        Ok(())
    }
}

impl Drop for MysqlConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        // The driver hands its socket back to the runtime that owns it.
        match runtime() {
            Ok(rt) => {
                let _guard = rt.enter();
                drop(conn);
            }
            Err(e) => warn!(error = %e, "Dropping MySQL connection without a runtime"),
        }
    }
}

impl std::fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlConnection")
            .field("connection_id", &self.conn.as_ref().map(|c| c.id()))
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

/// Opens connections for one MySQL configuration.
#[derive(Debug, Clone)]
pub struct MysqlConnector {
    config: Arc<MysqlConfig>,
}

impl MysqlConnector {
    /// Create a connector.
    pub fn new(config: Arc<MysqlConfig>) -> Self {
        Self { config }
    }

    /// The configuration connections are opened with.
    pub fn config(&self) -> &MysqlConfig {
        &self.config
    }
}

impl Connector for MysqlConnector {
    type Connection = MysqlConnection;

    fn kind(&self) -> &'static str {
        crate::KIND
    }

    fn connect(&self) -> DataResult<MysqlConnection> {
        Ok(MysqlConnection::open(&self.config)?)
    }

    fn supports_transactions(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable() -> MysqlConfig {
        MysqlConfig::new("shop")
            .endpoint("127.0.0.1", 1)
            .connect_timeout(Duration::from_secs(2))
    }

    #[test]
    fn test_connect_failure_is_retryable() {
        let err = MysqlConnector::new(Arc::new(unreachable()))
            .connect()
            .unwrap_err();
        assert!(err.is_retryable(), "{err}");
    }

    #[test]
    fn test_closed_connection() {
        let mut conn = MysqlConnection {
            conn: None,
            in_transaction: false,
        };
        assert!(matches!(conn.execute_batch("SELECT 1"), Err(MysqlError::Closed)));
        assert_eq!(conn.last_insert_id(), None);
        conn.reset().unwrap();
        conn.close().unwrap();
    }
}
