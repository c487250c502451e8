//! The runtime that drives the async driver for blocking callers.
//!
//! Every MySQL connection in the process is polled on one small
//! multi-threaded runtime, so connections can move between pools and
//! threads freely. [`block_on`] must not be called from async code.

use std::future::Future;
use std::io;
use std::sync::LazyLock;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::{MysqlError, MysqlResult};

static RUNTIME: LazyLock<io::Result<Runtime>> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("libdata-mysql")
        .enable_all()
        .build()
});

/// The shared runtime.
pub fn runtime() -> MysqlResult<&'static Runtime> {
    RUNTIME
        .as_ref()
        .map_err(|e| MysqlError::Runtime(format!("cannot start runtime: {e}")))
}

/// Run `future` to completion on the shared runtime.
pub fn block_on<T>(future: impl Future<Output = MysqlResult<T>>) -> MysqlResult<T> {
    if Handle::try_current().is_ok() {
        return Err(MysqlError::Runtime(
            "blocking MySQL calls cannot run inside an async runtime".into(),
        ));
    }
    runtime()?.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on() {
        assert_eq!(block_on(async { Ok(7) }).unwrap(), 7);
    }

    #[test]
    fn test_nested_block_on_is_an_error() {
        let nested = runtime()
            .unwrap()
            .block_on(async { block_on(async { Ok(()) }) });
        assert!(matches!(nested, Err(MysqlError::Runtime(_))));
    }
}
