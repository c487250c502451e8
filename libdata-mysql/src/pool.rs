//! Process-wide connection pools for MySQL.
//!
//! Clients share one pool per server, database and account.

use std::sync::{Arc, LazyLock};

use libdata_core::{ConnectionPool, DEFAULT_POOL_SIZE, SharedPools};

use crate::config::MysqlConfig;
use crate::connection::MysqlConnection;

static POOLS: LazyLock<SharedPools<MysqlConnection>> =
    LazyLock::new(|| SharedPools::new(crate::KIND, DEFAULT_POOL_SIZE));

/// The MySQL pool family.
pub fn pools() -> &'static SharedPools<MysqlConnection> {
    &POOLS
}

/// Set the maximum number of idle connections per database.
pub fn set_pool_size(max_size: usize) {
    POOLS.set_max_size(max_size);
}

/// The pool a client with this configuration draws from.
pub fn pool_for(config: &MysqlConfig) -> Arc<ConnectionPool<MysqlConnection>> {
    POOLS.pool_for(&config.pool_key())
}
