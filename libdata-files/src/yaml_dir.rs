//! Directories holding one YAML document per file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use libdata_core::doc::{check_index, key_of};
use libdata_core::{Address, DataError, DataResult, DocReader, DocWriter, Document};
use tracing::{debug, trace};

use crate::error::{FilesError, FilesResult};
use crate::options::{YamlDirReaderOptions, YamlDirWriterOptions};
use crate::yaml::parse_single;
use crate::yaml_layout::YamlLayout;

/// Reads a directory of YAML files, one document per file.
///
/// Files are listed once, sorted by path. `read(key)` resolves `<key>.yaml`
/// (then `<key>.yml`) relative to the directory, or, when a key field is
/// configured, looks the key up in an index built on first use.
#[derive(Debug)]
pub struct YamlDirReader {
    root: PathBuf,
    files: Vec<PathBuf>,
    key_field: Option<String>,
    index: Option<HashMap<String, usize>>,
}

impl YamlDirReader {
    /// Open a reader for `yamldir:///path`.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        let opts = YamlDirReaderOptions::from_address(address)?;
        Ok(Self::open(&opts.path, opts.key_field, opts.recursive)?)
    }

    /// List the files under `root`.
    pub fn open(
        root: impl AsRef<Path>,
        key_field: Option<String>,
        recursive: bool,
    ) -> FilesResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(FilesError::NotADirectory(root.to_path_buf()));
        }
        let mut files = Vec::new();
        collect_files(root, recursive, &mut files)?;
        files.sort();
        debug!(root = %root.display(), files = files.len(), "YAML directory listed");
        Ok(Self {
            root: root.to_path_buf(),
            files,
            key_field,
            index: None,
        })
    }

    /// Files in reading order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn load(&self, path: &Path) -> FilesResult<Document> {
        trace!(path = %path.display(), "Loading YAML document");
        let content = fs::read_to_string(path).map_err(|e| FilesError::io(path, e))?;
        parse_single(path, &content)
    }

    fn read_by_name(&self, key: &str) -> DataResult<Document> {
        if !is_file_stem(key) {
            return Err(DataError::KeyNotFound(key.to_string()));
        }
        for ext in ["yaml", "yml"] {
            let path = self.root.join(format!("{key}.{ext}"));
            if path.is_file() {
                return Ok(self.load(&path)?);
            }
        }
        Err(DataError::KeyNotFound(key.to_string()))
    }

    fn build_index(&self, field: &str) -> FilesResult<HashMap<String, usize>> {
        let mut index = HashMap::with_capacity(self.files.len());
        for (i, path) in self.files.iter().enumerate() {
            if let Some(key) = key_of(&self.load(path)?, field) {
                index.entry(key).or_insert(i);
            }
        }
        debug!(root = %self.root.display(), keys = index.len(), field, "YAML directory indexed");
        Ok(index)
    }
}

/// Whether `name` names a file directly inside the directory.
fn is_file_stem(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\', '\0']) && name != "." && name != ".."
}

fn collect_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> FilesResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| FilesError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| FilesError::io(dir, e))?.path();
        if path.is_dir() {
            if recursive {
                collect_files(&path, recursive, out)?;
            }
        } else {
            out.push(path);
        }
    }
    Ok(())
}

impl DocReader for YamlDirReader {
    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&mut self, index: usize) -> DataResult<Document> {
        check_index(index, self.files.len())?;
        Ok(self.load(&self.files[index])?)
    }

    fn read(&mut self, key: &str) -> DataResult<Document> {
        let Some(field) = self.key_field.clone() else {
            return self.read_by_name(key);
        };
        if self.index.is_none() {
            self.index = Some(self.build_index(&field)?);
        }
        let i = self
            .index
            .as_ref()
            .and_then(|index| index.get(key))
            .copied()
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))?;
        Ok(self.load(&self.files[i])?)
    }
}

/// Writes each document to `<id>.yaml` inside a directory.
#[derive(Debug)]
pub struct YamlDirWriter {
    root: PathBuf,
    id_field: String,
    replace: bool,
    layout: YamlLayout,
    created: bool,
    closed: bool,
}

impl YamlDirWriter {
    /// Open a writer for `yamldir:///path`.
    pub fn from_address(address: &Address) -> DataResult<Self> {
        let opts = YamlDirWriterOptions::from_address(address)?;
        Ok(Self::new(opts.path, opts.id_field, opts.replace).with_layout(YamlLayout {
            indent: opts.indent,
            width: opts.width,
        }))
    }

    /// Create a writer; the directory is created on the first write.
    pub fn new(root: impl Into<PathBuf>, id_field: impl Into<String>, replace: bool) -> Self {
        Self {
            root: root.into(),
            id_field: id_field.into(),
            replace,
            layout: YamlLayout::default(),
            created: false,
            closed: false,
        }
    }

    /// Use `layout` for every file written.
    pub fn with_layout(mut self, layout: YamlLayout) -> Self {
        self.layout = layout;
        self
    }

    fn target(&self, doc: &Document) -> FilesResult<PathBuf> {
        if !doc.is_object() {
            return Err(FilesError::InvalidDocument(
                "only objects can be written to a YAML directory".to_string(),
            ));
        }
        let id = match doc.get(&self.id_field) {
            Some(value) if value.is_string() || value.is_number() => key_of(doc, &self.id_field),
            _ => None,
        };
        let id = id.ok_or_else(|| {
            FilesError::InvalidDocument(format!(
                "field '{}' must hold a string or a number",
                self.id_field
            ))
        })?;
        if !is_file_stem(&id) {
            return Err(FilesError::InvalidDocument(format!(
                "{id:?} cannot be used as a file name"
            )));
        }
        Ok(self.root.join(format!("{id}.yaml")))
    }
}

impl DocWriter for YamlDirWriter {
    fn write(&mut self, doc: &Document) -> DataResult<()> {
        if self.closed {
            return Err(DataError::closed("write"));
        }
        let path = self.target(doc)?;
        if !self.created {
            fs::create_dir_all(&self.root).map_err(|e| FilesError::io(&self.root, e))?;
            self.created = true;
        }
        if !self.replace && path.exists() {
            return Err(FilesError::Exists(path).into());
        }
        let content = self.layout.render(doc).map_err(|source| FilesError::Yaml {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, content).map_err(|e| FilesError::io(&path, e))?;
        trace!(path = %path.display(), "YAML document written");
        Ok(())
    }

    fn close(&mut self) -> DataResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_write_then_read_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cards");

        let mut writer = YamlDirWriter::new(&root, "id", false);
        writer.write(&json!({"id": "b", "n": 2})).unwrap();
        writer.write(&json!({"id": "a", "n": 1})).unwrap();
        writer.write(&json!({"id": 7, "n": 7})).unwrap();
        writer.close().unwrap();

        let mut reader = YamlDirReader::open(&root, None, true).unwrap();
        assert_eq!(reader.len(), 3);
        assert_eq!(reader.get(0).unwrap(), json!({"id": 7, "n": 7}));
        assert_eq!(reader.get(1).unwrap(), json!({"id": "a", "n": 1}));
        assert_eq!(reader.read("b").unwrap()["n"], json!(2));
        assert!(matches!(reader.read("zzz"), Err(DataError::KeyNotFound(_))));
    }

    #[test]
    fn test_read_by_key_field() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.yml"), "name: first\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/two.yaml"), "name: second\n").unwrap();

        let mut reader = YamlDirReader::open(dir.path(), Some("name".into()), true).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.read("second").unwrap(), json!({"name": "second"}));

        let flat = YamlDirReader::open(dir.path(), None, false).unwrap();
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn test_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = YamlDirReader::open(dir.path().join("missing"), None, true).unwrap_err();
        assert!(matches!(err, FilesError::NotADirectory(_)));
    }

    #[test]
    fn test_duplicate_and_replace() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = YamlDirWriter::new(dir.path(), "id", false);
        writer.write(&json!({"id": "x", "v": 1})).unwrap();
        assert!(matches!(
            writer.write(&json!({"id": "x", "v": 2})),
            Err(DataError::DuplicateTarget(_))
        ));

        let mut writer = YamlDirWriter::new(dir.path(), "id", true);
        writer.write(&json!({"id": "x", "v": 3})).unwrap();
        let mut reader = YamlDirReader::open(dir.path(), None, true).unwrap();
        assert_eq!(reader.read("x").unwrap()["v"], json!(3));
    }

    #[test]
    fn test_read_by_name_stays_inside() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cards");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("inside.yaml"), "v: 1\n").unwrap();
        fs::write(dir.path().join("outside.yaml"), "v: secret\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/deep.yaml"), "v: deep\n").unwrap();

        let mut reader = YamlDirReader::open(&root, None, true).unwrap();
        assert_eq!(reader.read("inside").unwrap(), json!({"v": 1}));
        let outside = dir.path().join("outside");
        for key in [
            "../outside",
            "..\\outside",
            "../sub/deep",
            "..",
            ".",
            "",
            outside.to_str().unwrap(),
        ] {
            assert!(
                matches!(reader.read(key), Err(DataError::KeyNotFound(_))),
                "key {key:?}"
            );
        }
    }

    #[test]
    fn test_write_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = YamlDirWriter::new(dir.path(), "id", true);
        writer.write(&json!({"id": "kept", "v": 1})).unwrap();
        writer.close().unwrap();

        let err = writer.write(&json!({"id": "late", "v": 2})).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidState {
                operation: "write",
                ..
            }
        ));
        assert!(!dir.path().join("late.yaml").exists());
        assert!(dir.path().join("kept.yaml").is_file());
    }

    #[test]
    fn test_layout_from_address() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("yamldir://{}?indent=4&width=40", dir.path().display());
        let mut writer = YamlDirWriter::from_address(&Address::parse(&url).unwrap()).unwrap();
        let doc = json!({
            "id": "card",
            "meta": {"summary": "a fairly long sentence that will not fit in forty columns"}
        });
        writer.write(&doc).unwrap();
        writer.close().unwrap();

        let text = fs::read_to_string(dir.path().join("card.yaml")).unwrap();
        assert!(text.contains("\n    summary: "), "{text}");
        assert!(text.lines().all(|l| l.chars().count() <= 40), "{text}");

        let mut reader = YamlDirReader::open(dir.path(), None, true).unwrap();
        assert_eq!(reader.read("card").unwrap(), doc);
    }

    #[test]
    fn test_invalid_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = YamlDirWriter::new(dir.path(), "id", false);
        for doc in [
            json!({"name": "no id"}),
            json!({"id": ["list"]}),
            json!({"id": "../escape"}),
            json!("scalar"),
        ] {
            assert!(matches!(
                writer.write(&doc),
                Err(DataError::InvalidDocument(_))
            ));
        }
    }
}
