//! Process-wide connection pools for SQLite.
//!
//! File-based databases share one pool per database file (and pragma set).
//! In-memory databases are private to their connection, so each client gets
//! a pool that accepts nothing: its connection is closed with the client.

use std::sync::{Arc, LazyLock};

use libdata_core::{ConnectionPool, DEFAULT_POOL_SIZE, SharedPools};

use crate::config::SqliteConfig;
use crate::connection::SqliteConnection;

static POOLS: LazyLock<SharedPools<SqliteConnection>> =
    LazyLock::new(|| SharedPools::new(crate::KIND, DEFAULT_POOL_SIZE));

/// The SQLite pool family.
pub fn pools() -> &'static SharedPools<SqliteConnection> {
    &POOLS
}

/// Set the maximum number of idle connections per database.
pub fn set_pool_size(max_size: usize) {
    POOLS.set_max_size(max_size);
}

/// The pool a client with this configuration draws from.
pub fn pool_for(config: &SqliteConfig) -> Arc<ConnectionPool<SqliteConnection>> {
    if config.path.is_memory() {
        Arc::new(ConnectionPool::new(crate::KIND, 0))
    } else {
        POOLS.pool_for(&config.pool_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_pools_are_private() {
        let config = SqliteConfig::memory();
        let a = pool_for(&config);
        let b = pool_for(&config);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.max_size(), 0);
    }

    #[test]
    fn test_file_pools_are_shared() {
        let config = SqliteConfig::file("/tmp/libdata-pool-test.db");
        let a = pool_for(&config);
        let b = pool_for(&config.clone().table("other"));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
