//! File-based configuration.
//!
//! ```toml
//! [pool]
//! max_size = 16
//!
//! [pool.backends]
//! sqlite = 8
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use std::collections::HashMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DataError, DataResult};
use crate::pool::DEFAULT_POOL_SIZE;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "LIBDATA_CONFIG";

/// libdata configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibdataConfig {
    /// Connection pool sizing
    pub pool: PoolConfig,

    /// Logging
    pub logging: LoggingConfig,
}

/// Connection pool sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum idle connections per backend kind
    pub max_size: usize,

    /// Per-kind overrides, e.g. `sqlite = 8`
    pub backends: HashMap<String, usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_SIZE,
            backends: HashMap::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level (trace, debug, info, warn, error)
    pub level: String,

    /// Format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "json".to_string(),
        }
    }
}

impl LibdataConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> DataResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> DataResult<Self> {
        toml::from_str(content).map_err(|e| DataError::Config(e.to_string()))
    }

    /// Load the file named by `LIBDATA_CONFIG`, or defaults when unset.
    pub fn from_env() -> DataResult<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> DataResult<String> {
        toml::to_string_pretty(self).map_err(|e| DataError::Config(e.to_string()))
    }

    /// Pool size for a backend kind.
    pub fn pool_size_for(&self, kind: &str) -> usize {
        self.pool
            .backends
            .get(kind)
            .copied()
            .unwrap_or(self.pool.max_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = LibdataConfig::default();
        assert_eq!(config.pool.max_size, 16);
        assert_eq!(config.pool_size_for("sqlite"), 16);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse() {
        let config = LibdataConfig::from_toml(
            r#"
            [pool]
            max_size = 4

            [pool.backends]
            sqlite = 8

            [logging]
            format = "compact"
            "#,
        )
        .unwrap();
        assert_eq!(config.pool_size_for("sqlite"), 8);
        assert_eq!(config.pool_size_for("file"), 4);
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_empty_is_default() {
        assert_eq!(LibdataConfig::from_toml("").unwrap(), LibdataConfig::default());
    }

    #[test]
    fn test_invalid() {
        let err = LibdataConfig::from_toml("[pool]\nmax_size = \"lots\"").unwrap_err();
        assert!(matches!(err, DataError::Config(_)));
    }

    #[test]
    fn test_roundtrip() {
        let mut config = LibdataConfig::default();
        config.pool.backends.insert("file".into(), 2);
        let text = config.to_toml().unwrap();
        assert_eq!(LibdataConfig::from_toml(&text).unwrap(), config);
    }
}
