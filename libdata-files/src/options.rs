//! Options accepted by the file backends.

use std::path::PathBuf;

use libdata_core::{Address, DataError, DataResult, Options};

/// Default field used to look documents up by key.
pub const DEFAULT_KEY_FIELD: &str = "id";

/// Options of single-file readers (`json`, `jsonl`, `yaml`, `yml`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReaderOptions {
    /// File to read.
    pub path: PathBuf,
    /// Field used by `read(key)`.
    pub key_field: String,
    /// Report load progress. JSON readers only; defaults to true there.
    pub verbose: bool,
}

impl FileReaderOptions {
    /// Extract YAML reader options. Unknown parameters are rejected.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        Self::extract(address, false)
    }

    /// Extract JSON reader options, which also accept `verbose`.
    pub fn for_json(address: &Address) -> DataResult<Self> {
        Self::extract(address, true)
    }

    fn extract(address: &Address, with_verbose: bool) -> DataResult<Self> {
        let path = require_path(address)?;
        let mut opts = Options::from_address(address);
        check_encoding(&mut opts)?;
        let key_field = opts
            .take_string("key_field")?
            .unwrap_or_else(|| DEFAULT_KEY_FIELD.to_string());
        let verbose = if with_verbose {
            opts.take_bool("verbose")?.unwrap_or(true)
        } else {
            false
        };
        opts.finish()?;
        Ok(Self {
            path,
            key_field,
            verbose,
        })
    }
}

/// Options of single-file writers (`json`, `jsonl`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWriterOptions {
    /// File to write.
    pub path: PathBuf,
    /// Overwrite an existing file instead of failing.
    pub replace: bool,
}

impl FileWriterOptions {
    /// Extract from an address. Unknown parameters are rejected.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        let path = require_path(address)?;
        let mut opts = Options::from_address(address);
        check_encoding(&mut opts)?;
        let replace = opts.take_bool("replace")?.unwrap_or(false);
        opts.finish()?;
        Ok(Self { path, replace })
    }
}

/// Options of the YAML directory reader (`yamldir`, `ymldir`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlDirReaderOptions {
    /// Directory to read.
    pub path: PathBuf,
    /// Field used by `read(key)`; lookups go by file name when unset.
    pub key_field: Option<String>,
    /// Descend into subdirectories.
    pub recursive: bool,
}

impl YamlDirReaderOptions {
    /// Extract from an address. Unknown parameters are rejected.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        let path = require_path(address)?;
        let mut opts = Options::from_address(address);
        check_encoding(&mut opts)?;
        let key_field = opts.take_string("key_field")?;
        let recursive = opts.take_bool("recursive")?.unwrap_or(true);
        opts.finish()?;
        Ok(Self {
            path,
            key_field,
            recursive,
        })
    }
}

/// Indentation used by YAML output unless `indent` says otherwise.
pub const DEFAULT_INDENT: usize = 2;

/// Options of the YAML directory writer (`yamldir`, `ymldir`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlDirWriterOptions {
    /// Directory to write into; created when missing.
    pub path: PathBuf,
    /// Field naming each document's file.
    pub id_field: String,
    /// Overwrite existing files instead of failing.
    pub replace: bool,
    /// Spaces per nesting level, 2 to 9.
    pub indent: usize,
    /// Preferred line width; long strings are folded to fit. Unbounded when unset.
    pub width: Option<usize>,
}

impl YamlDirWriterOptions {
    /// Extract from an address. Unknown parameters are rejected.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        let path = require_path(address)?;
        let mut opts = Options::from_address(address);
        check_encoding(&mut opts)?;
        let id_field = opts
            .take_string("id_field")?
            .unwrap_or_else(|| DEFAULT_KEY_FIELD.to_string());
        let replace = opts.take_bool("replace")?.unwrap_or(false);
        let indent = match opts.take_usize("indent")? {
            None => DEFAULT_INDENT,
            Some(n @ 2..=9) => n,
            Some(n) => {
                return Err(DataError::invalid_option(
                    "indent",
                    format!("{n} is outside 2..=9"),
                ));
            }
        };
        let width = match opts.take_usize("width")? {
            None => None,
            Some(n) if n > indent * 2 => Some(n),
            Some(n) => {
                return Err(DataError::invalid_option(
                    "width",
                    format!("{n} leaves no room after indentation"),
                ));
            }
        };
        opts.finish()?;
        Ok(Self {
            path,
            id_field,
            replace,
            indent,
            width,
        })
    }
}

fn require_path(address: &Address) -> DataResult<PathBuf> {
    address
        .local_path()
        .map(PathBuf::from)
        .ok_or_else(|| DataError::invalid_option("path", "a file path is required"))
}

/// Files are read and written as UTF-8 only.
fn check_encoding(opts: &mut Options) -> DataResult<()> {
    match opts.take_string("encoding")? {
        None => Ok(()),
        Some(enc) if matches!(enc.to_ascii_lowercase().as_str(), "utf-8" | "utf8") => Ok(()),
        Some(enc) => Err(DataError::invalid_option(
            "encoding",
            format!("unsupported encoding {enc:?}, only UTF-8 is supported"),
        )),
    }
}
