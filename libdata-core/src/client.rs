//! Lazy client lifecycle.
//!
//! A [`LazyClient`] is one logical session against a backend. It holds at
//! most one native connection, acquired on first use from the backend's
//! [`ConnectionPool`] (or freshly constructed on a pool miss) and handed back
//! to the pool when the client is closed or dropped.
//!
//! ```text
//!            connect / any operation           start_transaction
//!   Idle ───────────────────────────▶ Active ───────────────────▶ InTransaction
//!    ▲                                  ▲  ◀─────────────────────────┘
//!    │                                  │        commit / rollback
//!    └──────────── close (any state) ───┴──────────────────────────────
//! ```
//!
//! Backends plug in by implementing [`Connector`] (how to open a connection)
//! and [`NativeConnection`] (how to close it and, optionally, how to drive a
//! transaction on it).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{DataError, DataResult};
use crate::pool::{ConnectionPool, Released};

/// Lifecycle state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// No native connection held.
    Idle,
    /// A native connection is held, no transaction open.
    Active,
    /// A native connection is held inside an open transaction.
    InTransaction,
}

impl ClientState {
    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::InTransaction => "in transaction",
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend-native connection handle.
pub trait NativeConnection: Send + Sized {
    /// Close the connection for good.
    fn close(self) -> DataResult<()>;

    /// Open a transaction.
    fn begin(&mut self) -> DataResult<()> {
        Err(DataError::unsupported(
            std::any::type_name::<Self>(),
            "transactions",
        ))
    }

    /// Commit the open transaction.
    fn commit(&mut self) -> DataResult<()> {
        Err(DataError::unsupported(
            std::any::type_name::<Self>(),
            "transactions",
        ))
    }

    /// Roll back the open transaction.
    fn rollback(&mut self) -> DataResult<()> {
        Err(DataError::unsupported(
            std::any::type_name::<Self>(),
            "transactions",
        ))
    }

    /// Clear per-session state before the connection goes back to the pool.
    ///
    /// A failure means the connection is not reusable and it is closed
    /// instead of pooled.
    fn reset(&mut self) -> DataResult<()> {
        Ok(())
    }
}

/// Opens native connections for one connection target.
pub trait Connector: Send + Sync {
    /// Connection type produced.
    type Connection: NativeConnection;

    /// Backend kind, e.g. `"sqlite"`.
    fn kind(&self) -> &'static str;

    /// Open a new native connection.
    fn connect(&self) -> DataResult<Self::Connection>;

    /// Whether connections support begin/commit/rollback.
    fn supports_transactions(&self) -> bool {
        false
    }
}

/// A client that connects on first use and pools its connection on close.
pub struct LazyClient<C: Connector> {
    connector: C,
    pool: Arc<ConnectionPool<C::Connection>>,
    conn: Option<C::Connection>,
    in_transaction: bool,
}

impl<C: Connector> LazyClient<C> {
    /// Create an idle client. No connection is made.
    pub fn new(connector: C, pool: Arc<ConnectionPool<C::Connection>>) -> Self {
        Self {
            connector,
            pool,
            conn: None,
            in_transaction: false,
        }
    }

    /// Backend kind.
    pub fn kind(&self) -> &'static str {
        self.connector.kind()
    }

    /// The connector this client opens connections with.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// The pool this client draws from.
    pub fn pool(&self) -> &Arc<ConnectionPool<C::Connection>> {
        &self.pool
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClientState {
        match (&self.conn, self.in_transaction) {
            (None, _) => ClientState::Idle,
            (Some(_), false) => ClientState::Active,
            (Some(_), true) => ClientState::InTransaction,
        }
    }

    /// Whether a native connection is held.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Ensure a native connection is held: reuse a pooled one, else open one.
    pub fn connect(&mut self) -> DataResult<&mut C::Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => match self.pool.try_acquire() {
                Some(conn) => conn,
                None => {
                    debug!(kind = self.kind(), "Opening native connection");
                    self.connector.connect().map_err(|e| self.connect_error(e))?
                }
            },
        };
        Ok(self.conn.insert(conn))
    }

    /// Run an operation against the native connection, connecting first.
    pub fn with_connection<R>(
        &mut self,
        f: impl FnOnce(&mut C::Connection) -> DataResult<R>,
    ) -> DataResult<R> {
        let conn = self.connect()?;
        f(conn)
    }

    /// Open a transaction on the held connection.
    pub fn start_transaction(&mut self) -> DataResult<()> {
        if self.in_transaction {
            return Err(DataError::InvalidState {
                state: self.state(),
                operation: "start a transaction",
            });
        }
        if !self.connector.supports_transactions() {
            return Err(DataError::unsupported(self.kind(), "transactions"));
        }

        self.connect()?.begin()?;
        self.in_transaction = true;
        debug!(kind = self.kind(), "Transaction started");
        Ok(())
    }

    /// Commit the open transaction. On failure the transaction stays open.
    pub fn commit(&mut self) -> DataResult<()> {
        let conn = self.transaction_connection("commit")?;
        conn.commit()?;
        self.in_transaction = false;
        debug!(kind = self.kind(), "Transaction committed");
        Ok(())
    }

    /// Roll back the open transaction.
    ///
    /// On failure the connection is in an unknown state: it is closed and
    /// the client returns to `Idle`.
    pub fn rollback(&mut self) -> DataResult<()> {
        self.transaction_connection("rollback")?;
        self.in_transaction = false;

        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.rollback() {
            Ok(()) => {
                self.conn = Some(conn);
                debug!(kind = self.kind(), "Transaction rolled back");
                Ok(())
            }
            Err(e) => {
                self.discard(conn);
                Err(e)
            }
        }
    }

    /// Return the connection to the pool, closing it if the pool is full.
    ///
    /// An open transaction is rolled back first. Idempotent and infallible:
    /// close failures are logged.
    pub fn close(&mut self) {
        let in_transaction = std::mem::take(&mut self.in_transaction);
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        if in_transaction {
            if let Err(e) = conn.rollback() {
                warn!(kind = self.kind(), error = %e, "Rollback on close failed");
                self.discard(conn);
                return;
            }
        }
        if let Err(e) = conn.reset() {
            warn!(kind = self.kind(), error = %e, "Connection reset failed");
            self.discard(conn);
            return;
        }

        if let Released::Rejected(conn) = self.pool.release(conn) {
            debug!(kind = self.kind(), "Pool full, closing connection");
            self.discard(conn);
        }
    }

    /// Run `f`, then close the client on every exit path.
    pub fn scope<R>(&mut self, f: impl FnOnce(&mut Self) -> DataResult<R>) -> DataResult<R> {
        let result = f(self);
        self.close();
        result
    }

    fn transaction_connection(&mut self, operation: &'static str) -> DataResult<&mut C::Connection> {
        let state = self.state();
        match self.conn.as_mut() {
            Some(conn) if self.in_transaction => Ok(conn),
            _ => Err(DataError::InvalidState { state, operation }),
        }
    }

    fn connect_error(&self, err: DataError) -> DataError {
        match err {
            err @ DataError::Connection { .. } => err,
            other => DataError::Connection {
                kind: self.kind().to_string(),
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    fn discard(&self, conn: C::Connection) {
        if let Err(e) = conn.close() {
            warn!(kind = self.kind(), error = %e, "Failed to close connection");
        }
    }
}

impl<C: Connector> Drop for LazyClient<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: Connector> fmt::Debug for LazyClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyClient")
            .field("kind", &self.kind())
            .field("state", &self.state())
            .finish()
    }
}

/// Backend-independent view of a client, as returned by the client registry.
pub trait Session: Send {
    /// Backend kind.
    fn kind(&self) -> &'static str;

    /// Current lifecycle state.
    fn state(&self) -> ClientState;

    /// Acquire a native connection now instead of on first use.
    fn connect(&mut self) -> DataResult<()>;

    /// Open a transaction.
    fn start_transaction(&mut self) -> DataResult<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> DataResult<()>;

    /// Roll back the open transaction.
    fn rollback(&mut self) -> DataResult<()>;

    /// Release the native connection.
    fn close(&mut self);

    /// Access the concrete client for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Session {
    /// Downcast to the concrete client type.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl<C: Connector + 'static> Session for LazyClient<C> {
    fn kind(&self) -> &'static str {
        LazyClient::kind(self)
    }

    fn state(&self) -> ClientState {
        LazyClient::state(self)
    }

    fn connect(&mut self) -> DataResult<()> {
        LazyClient::connect(self).map(|_| ())
    }

    fn start_transaction(&mut self) -> DataResult<()> {
        LazyClient::start_transaction(self)
    }

    fn commit(&mut self) -> DataResult<()> {
        LazyClient::commit(self)
    }

    fn rollback(&mut self) -> DataResult<()> {
        LazyClient::rollback(self)
    }

    fn close(&mut self) {
        LazyClient::close(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
