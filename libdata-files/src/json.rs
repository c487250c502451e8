//! JSON and JSON Lines files.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use libdata_core::{Address, DataError, DataResult, DocReader, DocWriter, Document};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{FilesError, FilesResult};
use crate::loaded::LoadedDocuments;
use crate::options::{FileReaderOptions, FileWriterOptions};

/// Lines between two progress events of a verbose JSON Lines load.
pub const PROGRESS_EVERY: usize = 10_000;

/// Reads every document of a JSON or JSON Lines file.
///
/// A file holding one JSON array yields its items; a file holding any other
/// single JSON value yields that value. Anything else is read as JSON Lines,
/// one document per non-blank line.
///
/// With `verbose` set (the address default), loading reports progress as
/// `info` events every [`PROGRESS_EVERY`] lines.
#[derive(Debug)]
pub struct JsonReader {
    path: PathBuf,
    docs: LoadedDocuments,
}

impl JsonReader {
    /// Open a reader for `json:///path` or `jsonl:///path`.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        let opts = FileReaderOptions::for_json(address)?;
        Ok(Self::load(&opts.path, &opts.key_field, opts.verbose)?)
    }

    /// Load `path` quietly, indexing `read(key)` lookups on `key_field`.
    pub fn open(path: impl AsRef<Path>, key_field: &str) -> FilesResult<Self> {
        Self::load(path, key_field, false)
    }

    /// Load `path`, reporting progress when `verbose`.
    pub fn load(path: impl AsRef<Path>, key_field: &str, verbose: bool) -> FilesResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FilesError::io(path, e))?;
        let docs = parse_documents(path, &content, verbose)?;
        if verbose {
            info!(path = %path.display(), docs = docs.len(), "JSON file loaded");
        } else {
            debug!(path = %path.display(), docs = docs.len(), "JSON file loaded");
        }
        Ok(Self {
            path: path.to_path_buf(),
            docs: LoadedDocuments::new(docs, key_field),
        })
    }

    /// File being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a whole-file JSON value, falling back to JSON Lines.
pub fn parse_documents(path: &Path, content: &str, verbose: bool) -> FilesResult<Vec<Document>> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(value) => Ok(vec![value]),
        Err(_) => parse_lines(path, content, verbose),
    }
}

fn parse_lines(path: &Path, content: &str, verbose: bool) -> FilesResult<Vec<Document>> {
    let mut docs = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if verbose && i > 0 && i % PROGRESS_EVERY == 0 {
            info!(path = %path.display(), lines = i, docs = docs.len(), "Reading JSON Lines");
        }
        if line.trim().is_empty() {
            continue;
        }
        let doc = serde_json::from_str(line).map_err(|source| FilesError::Json {
            path: path.to_path_buf(),
            line: Some(i + 1),
            source,
        })?;
        docs.push(doc);
    }
    Ok(docs)
}

impl DocReader for JsonReader {
    fn len(&self) -> usize {
        self.docs.len()
    }

    fn get(&mut self, index: usize) -> DataResult<Document> {
        self.docs.get(index)
    }

    fn read(&mut self, key: &str) -> DataResult<Document> {
        self.docs.read(key)
    }
}

/// Writes documents as JSON Lines.
///
/// The file is created on the first write. An existing file is an error
/// unless `replace` is set, in which case it is truncated. Writing after
/// [`close`](DocWriter::close) fails with `InvalidState`.
#[derive(Debug)]
pub struct JsonWriter {
    path: PathBuf,
    replace: bool,
    out: Option<BufWriter<File>>,
    closed: bool,
}

impl JsonWriter {
    /// Open a writer for `json:///path` or `jsonl:///path`.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        let opts = FileWriterOptions::from_address(address)?;
        Ok(Self::new(opts.path, opts.replace))
    }

    /// Create a writer; nothing touches the disk until the first write.
    pub fn new(path: impl Into<PathBuf>, replace: bool) -> Self {
        Self {
            path: path.into(),
            replace,
            out: None,
            closed: false,
        }
    }

    fn output(&mut self) -> FilesResult<&mut BufWriter<File>> {
        let out = match self.out.take() {
            Some(out) => out,
            None => {
                let file = open_output(&self.path, self.replace)?;
                debug!(path = %self.path.display(), "JSON Lines output opened");
                BufWriter::new(file)
            }
        };
        Ok(self.out.insert(out))
    }
}

fn open_output(path: &Path, replace: bool) -> FilesResult<File> {
    let mut options = OpenOptions::new();
    options.write(true);
    if replace {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    options.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            FilesError::Exists(path.to_path_buf())
        } else {
            FilesError::io(path, e)
        }
    })
}

impl DocWriter for JsonWriter {
    fn write(&mut self, doc: &Document) -> DataResult<()> {
        if self.closed {
            return Err(DataError::closed("write"));
        }
        let path = self.path.clone();
        let out = self.output()?;
        serde_json::to_writer(&mut *out, doc)?;
        out.write_all(b"\n").map_err(|e| FilesError::io(&path, e))?;
        Ok(())
    }

    fn close(&mut self) -> DataResult<()> {
        self.closed = true;
        if let Some(mut out) = self.out.take() {
            out.flush().map_err(|e| FilesError::io(&self.path, e))?;
        }
        Ok(())
    }
}

impl Drop for JsonWriter {
    fn drop(&mut self) {
        if let Some(mut out) = self.out.take() {
            let _ = out.flush();
        }
    }
}
