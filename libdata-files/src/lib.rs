//! # libdata-files
//!
//! Document readers and writers over local files:
//!
//! | Scheme | Reader | Writer |
//! |--------|--------|--------|
//! | `json`, `jsonl` | [`JsonReader`] | [`JsonWriter`] |
//! | `yaml`, `yml` | [`YamlReader`] | |
//! | `yamldir`, `ymldir` | [`YamlDirReader`] | [`YamlDirWriter`] |
//!
//! ```rust
//! use libdata_core::Backends;
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let url = format!("jsonl://{}/notes.jsonl", dir.path().display());
//!
//! let mut backends = Backends::new();
//! libdata_files::register(&mut backends).unwrap();
//!
//! let mut writer = backends.writer(url.as_str()).unwrap();
//! writer.write(&json!({"id": "n1", "text": "hello"})).unwrap();
//! writer.close().unwrap();
//!
//! let mut reader = backends.reader(url.as_str()).unwrap();
//! assert_eq!(reader.read("n1").unwrap()["text"], json!("hello"));
//! ```

pub mod error;
pub mod json;
pub mod loaded;
pub mod options;
pub mod yaml;
pub mod yaml_dir;
pub mod yaml_layout;

pub use error::{FilesError, FilesResult};
pub use json::{JsonReader, JsonWriter};
pub use loaded::LoadedDocuments;
pub use options::{
    DEFAULT_INDENT, DEFAULT_KEY_FIELD, FileReaderOptions, FileWriterOptions, YamlDirReaderOptions,
    YamlDirWriterOptions,
};
pub use yaml::YamlReader;
pub use yaml_dir::{YamlDirReader, YamlDirWriter};
pub use yaml_layout::YamlLayout;

use libdata_core::{Backends, DataResult, DocReader, DocWriter};

/// Schemes read as JSON or JSON Lines.
pub const JSON_SCHEMES: [&str; 2] = ["json", "jsonl"];
/// Schemes read as YAML streams.
pub const YAML_SCHEMES: [&str; 2] = ["yaml", "yml"];
/// Schemes read as directories of YAML files.
pub const YAML_DIR_SCHEMES: [&str; 2] = ["yamldir", "ymldir"];

/// Register every file scheme in `backends`.
pub fn register(backends: &mut Backends) -> DataResult<()> {
    for scheme in JSON_SCHEMES {
        backends.readers.register_fn(scheme, |addr| {
            Ok(Box::new(JsonReader::from_address(addr)?) as Box<dyn DocReader>)
        })?;
        backends.writers.register_fn(scheme, |addr| {
            Ok(Box::new(JsonWriter::from_address(addr)?) as Box<dyn DocWriter>)
        })?;
    }
    for scheme in YAML_SCHEMES {
        backends.readers.register_fn(scheme, |addr| {
            Ok(Box::new(YamlReader::from_address(addr)?) as Box<dyn DocReader>)
        })?;
    }
    for scheme in YAML_DIR_SCHEMES {
        backends.readers.register_fn(scheme, |addr| {
            Ok(Box::new(YamlDirReader::from_address(addr)?) as Box<dyn DocReader>)
        })?;
        backends.writers.register_fn(scheme, |addr| {
            Ok(Box::new(YamlDirWriter::from_address(addr)?) as Box<dyn DocWriter>)
        })?;
    }
    Ok(())
}
