//! Bounded cache of idle native connections.
//!
//! A [`ConnectionPool`] never creates or closes connections itself: callers
//! try to acquire an idle one and construct a fresh connection on a miss, and
//! they close whatever the pool rejects on release.
//!
//! ```rust
//! use libdata_core::pool::{ConnectionPool, Released};
//!
//! let pool = ConnectionPool::new("demo", 2);
//! assert!(pool.try_acquire().is_none());
//!
//! assert!(pool.release("a").is_accepted());
//! assert!(pool.release("b").is_accepted());
//! // Full: the third connection is handed back for the caller to close.
//! assert!(matches!(pool.release("c"), Released::Rejected("c")));
//!
//! assert_eq!(pool.idle_count(), 2);
//! assert!(pool.try_acquire().is_some());
//! ```
//!
//! [`SharedPools`] is the process-wide pool family of one backend kind. It
//! hands out one [`ConnectionPool`] per connection target, so two clients
//! only ever share connections opened with identical parameters.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace};

/// Default maximum number of idle connections per pool.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Outcome of [`ConnectionPool::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a rejected connection must be closed by the caller"]
pub enum Released<C> {
    /// The pool now holds the connection.
    Accepted,
    /// The pool is full; the connection is returned to the caller.
    Rejected(C),
}

impl<C> Released<C> {
    /// Whether the pool kept the connection.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// The rejected connection, if any.
    pub fn into_rejected(self) -> Option<C> {
        match self {
            Self::Accepted => None,
            Self::Rejected(conn) => Some(conn),
        }
    }
}

/// Statistics about pool usage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Acquisitions served from the idle set.
    pub hits: u64,
    /// Acquisitions that found the pool empty.
    pub misses: u64,
    /// Releases the pool kept.
    pub accepted: u64,
    /// Releases refused because the pool was full.
    pub rejected: u64,
}

/// A bounded, thread-safe cache of idle connections.
pub struct ConnectionPool<C> {
    kind: &'static str,
    idle: Mutex<Vec<C>>,
    max_size: AtomicUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl<C> ConnectionPool<C> {
    /// Create an empty pool holding at most `max_size` idle connections.
    pub fn new(kind: &'static str, max_size: usize) -> Self {
        Self {
            kind,
            idle: Mutex::new(Vec::with_capacity(max_size.min(DEFAULT_POOL_SIZE))),
            max_size: AtomicUsize::new(max_size),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Create an empty pool with [`DEFAULT_POOL_SIZE`].
    pub fn with_default_size(kind: &'static str) -> Self {
        Self::new(kind, DEFAULT_POOL_SIZE)
    }

    /// Backend kind this pool serves.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Take an idle connection, if any. Never blocks on I/O, never connects.
    pub fn try_acquire(&self) -> Option<C> {
        let conn = self.idle.lock().pop();
        if conn.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(kind = self.kind, "Reusing idle connection");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(kind = self.kind, "No idle connection");
        }
        conn
    }

    /// Offer a connection back to the pool.
    ///
    /// Returns [`Released::Rejected`] with the connection when the pool
    /// already holds `max_size` idle connections.
    pub fn release(&self, conn: C) -> Released<C> {
        let max_size = self.max_size.load(Ordering::Acquire);
        let mut idle = self.idle.lock();
        if idle.len() < max_size {
            idle.push(conn);
            drop(idle);
            self.accepted.fetch_add(1, Ordering::Relaxed);
            trace!(kind = self.kind, "Connection returned to pool");
            Released::Accepted
        } else {
            drop(idle);
            self.rejected.fetch_add(1, Ordering::Relaxed);
            trace!(kind = self.kind, max_size, "Pool full, rejecting connection");
            Released::Rejected(conn)
        }
    }

    /// Maximum number of idle connections.
    pub fn max_size(&self) -> usize {
        self.max_size.load(Ordering::Acquire)
    }

    /// Change the bound. Shrinking does not evict idle connections; it only
    /// affects later releases.
    pub fn set_max_size(&self, max_size: usize) {
        self.max_size.store(max_size, Ordering::Release);
    }

    /// Number of idle connections currently held.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Remove every idle connection, e.g. to close them at shutdown.
    pub fn drain(&self) -> Vec<C> {
        std::mem::take(&mut *self.idle.lock())
    }

    /// Usage counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

impl<C> std::fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("kind", &self.kind)
            .field("max_size", &self.max_size())
            .field("idle", &self.idle_count())
            .finish()
    }
}

/// The pools of one backend kind, one per connection target.
///
/// `max_size` is a kind-wide setting: changing it updates every existing
/// pool and becomes the bound of pools created later.
pub struct SharedPools<C> {
    kind: &'static str,
    max_size: AtomicUsize,
    pools: RwLock<HashMap<String, Arc<ConnectionPool<C>>>>,
}

impl<C> SharedPools<C> {
    /// Create an empty pool family.
    pub fn new(kind: &'static str, max_size: usize) -> Self {
        Self {
            kind,
            max_size: AtomicUsize::new(max_size),
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Backend kind.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Get (or create) the pool for a connection target.
    ///
    /// `target` is logged, so it must not carry secrets; see
    /// [`Address::pool_key`](crate::Address::pool_key).
    pub fn pool_for(&self, target: &str) -> Arc<ConnectionPool<C>> {
        if let Some(pool) = self.pools.read().get(target) {
            return Arc::clone(pool);
        }

        let mut pools = self.pools.write();
        Arc::clone(pools.entry(target.to_string()).or_insert_with(|| {
            let max_size = self.max_size.load(Ordering::Acquire);
            info!(kind = self.kind, max_size, "Connection pool created");
            debug!(kind = self.kind, target, "Pool target registered");
            Arc::new(ConnectionPool::new(self.kind, max_size))
        }))
    }

    /// Kind-wide maximum idle size.
    pub fn max_size(&self) -> usize {
        self.max_size.load(Ordering::Acquire)
    }

    /// Set the kind-wide maximum idle size.
    pub fn set_max_size(&self, max_size: usize) {
        self.max_size.store(max_size, Ordering::Release);
        for pool in self.pools.read().values() {
            pool.set_max_size(max_size);
        }
        debug!(kind = self.kind, max_size, "Pool size updated");
    }

    /// Number of targets with a pool.
    pub fn target_count(&self) -> usize {
        self.pools.read().len()
    }

    /// Total idle connections across all targets.
    pub fn idle_count(&self) -> usize {
        self.pools.read().values().map(|p| p.idle_count()).sum()
    }

    /// Remove every idle connection of every target.
    pub fn drain(&self) -> Vec<C> {
        self.pools
            .read()
            .values()
            .flat_map(|p| p.drain())
            .collect()
    }
}

impl<C> std::fmt::Debug for SharedPools<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPools")
            .field("kind", &self.kind)
            .field("max_size", &self.max_size())
            .field("targets", &self.target_count())
            .finish()
    }
}
