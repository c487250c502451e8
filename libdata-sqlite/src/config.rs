//! SQLite configuration built from an address.
//!
//! Supported address forms:
//! - `sqlite:///absolute/path/app.db`
//! - `sqlite:relative/path/app.db`
//! - `sqlite::memory:` or `sqlite:///:memory:`
//!
//! Options: `table`, `primary_key` (default `id`), `busy_timeout` (ms,
//! default 5000), `foreign_keys` (default true), `journal_mode`,
//! `synchronous`, `replace` (default false).

use std::path::{Path, PathBuf};

use libdata_core::{Address, Options};

use crate::error::{SqliteError, SqliteResult};

/// Database location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database, private to its connection.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Path string for SQLite.
    pub fn display(&self) -> String {
        match self {
            Self::Memory => ":memory:".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

/// SQLite synchronous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronousMode {
    /// Synchronous OFF - Fastest but unsafe.
    Off,
    /// Synchronous NORMAL - Good balance.
    Normal,
    /// Synchronous FULL - Safe but slower.
    Full,
    /// Synchronous EXTRA - Maximum safety.
    Extra,
}

impl SynchronousMode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "normal" => Some(Self::Normal),
            "full" => Some(Self::Full),
            "extra" => Some(Self::Extra),
            _ => None,
        }
    }

    /// Get the SQLite pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// DELETE - Default mode, deletes journal after transaction.
    Delete,
    /// TRUNCATE - Truncates journal instead of deleting.
    Truncate,
    /// PERSIST - Keep journal file, zero out on commit.
    Persist,
    /// MEMORY - Keep journal in memory.
    Memory,
    /// WAL - Write-Ahead Logging.
    Wal,
    /// OFF - No journal.
    Off,
}

impl JournalMode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "delete" => Some(Self::Delete),
            "truncate" => Some(Self::Truncate),
            "persist" => Some(Self::Persist),
            "memory" => Some(Self::Memory),
            "wal" => Some(Self::Wal),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    /// Get the SQLite pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database location.
    pub path: DatabasePath,
    /// Table used by readers and writers.
    pub table: Option<String>,
    /// Primary-key column used by readers and writers.
    pub primary_key: String,
    /// Enable foreign keys.
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Journal mode, left at the database default when unset.
    pub journal_mode: Option<JournalMode>,
    /// Synchronous mode, left at the database default when unset.
    pub synchronous: Option<SynchronousMode>,
    /// Writers upsert instead of failing on existing keys.
    pub replace: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            table: None,
            primary_key: "id".to_string(),
            foreign_keys: true,
            busy_timeout_ms: 5000,
            journal_mode: None,
            synchronous: None,
            replace: false,
        }
    }
}

impl SqliteConfig {
    /// Configuration for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Configuration for a file-based database.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Build a configuration from a `sqlite:` address.
    pub fn from_address(address: &Address) -> SqliteResult<Self> {
        let path = match address.local_path().as_deref() {
            None => {
                return Err(SqliteError::config("path", "database path is required"));
            }
            Some(":memory:") | Some("/:memory:") => DatabasePath::Memory,
            Some(path) => DatabasePath::File(PathBuf::from(path)),
        };

        let mut opts = Options::from_address(address);
        let mut config = Self {
            path,
            ..Default::default()
        };
        config.table = opts.take_string("table").map_err(option_error)?;
        if let Some(pk) = opts.take_string("primary_key").map_err(option_error)? {
            config.primary_key = pk;
        }
        if let Some(fk) = opts.take_bool("foreign_keys").map_err(option_error)? {
            config.foreign_keys = fk;
        }
        if let Some(ms) = opts.take_u64("busy_timeout").map_err(option_error)? {
            config.busy_timeout_ms = u32::try_from(ms)
                .map_err(|_| SqliteError::config("busy_timeout", "value too large"))?;
        }
        if let Some(mode) = opts.take_string("journal_mode").map_err(option_error)? {
            config.journal_mode = Some(JournalMode::parse(&mode).ok_or_else(|| {
                SqliteError::config("journal_mode", format!("unknown mode {mode:?}"))
            })?);
        }
        if let Some(mode) = opts.take_string("synchronous").map_err(option_error)? {
            config.synchronous = Some(SynchronousMode::parse(&mode).ok_or_else(|| {
                SqliteError::config("synchronous", format!("unknown mode {mode:?}"))
            })?);
        }
        if let Some(replace) = opts.take_bool("replace").map_err(option_error)? {
            config.replace = replace;
        }
        opts.finish().map_err(option_error)?;

        Ok(config)
    }

    /// The configured table, or a configuration error.
    pub fn require_table(&self) -> SqliteResult<&str> {
        self.table
            .as_deref()
            .ok_or_else(|| SqliteError::config("table", "a table is required"))
    }

    /// Key of the pool this configuration's connections belong to.
    ///
    /// Connections are only interchangeable when opened on the same file
    /// with the same pragmas.
    pub fn pool_key(&self) -> String {
        format!(
            "{}|fk={}|busy={}|journal={}|sync={}",
            self.path.display(),
            self.foreign_keys,
            self.busy_timeout_ms,
            self.journal_mode.map_or("", |m| m.as_pragma()),
            self.synchronous.map_or("", |m| m.as_pragma()),
        )
    }

    /// Initialization SQL run on every new connection.
    pub fn init_sql(&self) -> String {
        let mut sql = String::new();

        sql.push_str(&format!(
            "PRAGMA foreign_keys = {};\n",
            if self.foreign_keys { "ON" } else { "OFF" }
        ));

        if let Some(mode) = self.journal_mode {
            sql.push_str(&format!("PRAGMA journal_mode = {};\n", mode.as_pragma()));
        }

        if let Some(mode) = self.synchronous {
            sql.push_str(&format!("PRAGMA synchronous = {};\n", mode.as_pragma()));
        }

        sql
    }

    /// Set the table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the primary-key column.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Set the journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = Some(mode);
        self
    }
}

fn option_error(err: libdata_core::DataError) -> SqliteError {
    match err {
        libdata_core::DataError::InvalidOption { key, message } => SqliteError::config(key, message),
        other => SqliteError::config("options", other.to_string()),
    }
}
