//! Logging setup.
//!
//! libdata logs through `tracing` and never installs a subscriber on its own.
//! Applications either install their own, or call [`init`] once at startup to
//! get one configured from the environment:
//!
//! - `LIBDATA_DEBUG=true|1|yes` - debug-level logging
//! - `LIBDATA_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `LIBDATA_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Installing the subscriber needs the `tracing-subscriber` feature; without
//! it [`init`] only records the request.
//!
//! ```rust,no_run
//! use libdata_core::logging;
//!
//! logging::init();
//! ```
//!
//! Levels used inside libdata: `debug` for parsing, dispatch and lifecycle
//! transitions, `trace` for pool hits and releases, `info` for pool creation,
//! `warn` for best-effort close failures.

use std::env;
use std::sync::{Once, OnceLock};

static INIT: Once = Once::new();
static INSTALLED: OnceLock<(&'static str, &'static str)> = OnceLock::new();

/// Environment variable enabling debug logging.
pub const DEBUG_ENV: &str = "LIBDATA_DEBUG";
/// Environment variable selecting the log level.
pub const LEVEL_ENV: &str = "LIBDATA_LOG_LEVEL";
/// Environment variable selecting the output format.
pub const FORMAT_ENV: &str = "LIBDATA_LOG_FORMAT";

/// Whether `LIBDATA_DEBUG` asks for debug logging.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Normalize a level name; `None` for anything unrecognized.
pub fn parse_level(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Normalize a format name, defaulting to `json`.
pub fn parse_format(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "pretty" => "pretty",
        "compact" => "compact",
        _ => "json",
    }
}

/// Configured log level: `LIBDATA_LOG_LEVEL`, else `debug` when
/// `LIBDATA_DEBUG` is set, else `warn`.
pub fn get_log_level() -> &'static str {
    env::var(LEVEL_ENV)
        .ok()
        .and_then(|level| parse_level(&level))
        .unwrap_or(if is_debug_enabled() { "debug" } else { "warn" })
}

/// Configured log format from `LIBDATA_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var(FORMAT_ENV)
        .map(|f| parse_format(&f))
        .unwrap_or("json")
}

/// Install a subscriber configured from the environment.
///
/// Does nothing unless `LIBDATA_DEBUG` or `LIBDATA_LOG_LEVEL` is set.
/// Subsequent calls are no-ops.
pub fn init() {
    if !is_debug_enabled() && env::var(LEVEL_ENV).is_err() {
        return;
    }
    install(get_log_level(), get_log_format());
}

/// Install a subscriber with an explicit level and format, e.g. from
/// [`LoggingConfig`](crate::config::LoggingConfig).
pub fn init_with(level: &str, format: &str) {
    let level = parse_level(level).unwrap_or("warn");
    install(level, parse_format(format));
}

/// Install a debug-level subscriber.
///
/// # Safety
///
/// This sets `LIBDATA_DEBUG`, which is unsafe in multi-threaded programs.
/// Call it before spawning threads.
pub fn init_debug() {
    // SAFETY: Only called at program startup before threads are spawned.
    unsafe {
        env::set_var(DEBUG_ENV, "true");
    }
    init();
}

/// Level and format chosen by the first successful `init*` call.
pub fn installed() -> Option<(&'static str, &'static str)> {
    INSTALLED.get().copied()
}

fn install(level: &'static str, format: &'static str) {
    INIT.call_once(|| {
        let _ = INSTALLED.set((level, format));
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "libdata={level},libdata_core={level},libdata_sqlite={level},\
                 libdata_files={level},libdata_fs={level},libdata_mysql={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };
            if installed.is_ok() {
                tracing::info!(level, format, "libdata logging initialized");
            }
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            let _ = (level, format);
        }
    });
}
