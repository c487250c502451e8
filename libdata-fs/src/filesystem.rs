//! The filesystem contract and its local implementation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use libdata_core::{DataResult, Options};
use tracing::{debug, trace};

use crate::error::{FsError, FsResult};
use crate::target::FsTarget;

/// A filesystem rooted at some directory.
///
/// All paths are relative to the root; the empty path names the root itself.
pub trait FileSystem: Send {
    /// Protocol name, e.g. `"file"`.
    fn protocol(&self) -> &str;

    /// Names of the entries of a directory, sorted.
    fn list_dir(&self, path: &str) -> DataResult<Vec<String>>;

    /// Whole contents of a file.
    fn read(&self, path: &str) -> DataResult<Vec<u8>>;

    /// Create or overwrite a file.
    fn write(&self, path: &str, data: &[u8]) -> DataResult<()>;

    /// Append to a file, creating it when missing.
    fn append(&self, path: &str, data: &[u8]) -> DataResult<()>;

    /// Remove a file, or a directory with everything below it.
    fn remove(&self, path: &str) -> DataResult<()>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &str) -> DataResult<bool>;

    /// Release the underlying resources.
    fn close(&mut self) -> DataResult<()> {
        Ok(())
    }
}

/// A directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    /// Open `root`; it must be an existing directory unless `create` is set.
    pub fn open(root: impl Into<PathBuf>, create: bool) -> FsResult<Self> {
        let root = root.into();
        if create {
            fs::create_dir_all(&root).map_err(|e| FsError::io(root.display().to_string(), e))?;
        }
        if !root.is_dir() {
            return Err(FsError::BadRoot(root.display().to_string()));
        }
        debug!(root = %root.display(), "Local filesystem opened");
        Ok(Self { root })
    }

    /// Open the root named by `target`. Accepts one option, `create`.
    pub fn from_target(target: &FsTarget) -> DataResult<Self> {
        let mut opts: Options = target.options();
        let create = opts.take_bool("create")?.unwrap_or(false);
        opts.finish()?;
        Ok(Self::open(target.local_root(), create)?)
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path under the root.
    fn resolve(&self, path: &str) -> FsResult<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(FsError::Escape(path.to_string()));
                }
            }
        }
        Ok(resolved)
    }
}

impl FileSystem for LocalFileSystem {
    fn protocol(&self) -> &str {
        "file"
    }

    fn list_dir(&self, path: &str) -> DataResult<Vec<String>> {
        let dir = self.resolve(path)?;
        let entries = fs::read_dir(&dir).map_err(|e| FsError::io(path, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FsError::io(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, path: &str) -> DataResult<Vec<u8>> {
        let file = self.resolve(path)?;
        trace!(path, "Reading file");
        Ok(fs::read(file).map_err(|e| FsError::io(path, e))?)
    }

    fn write(&self, path: &str, data: &[u8]) -> DataResult<()> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::io(path, e))?;
        }
        trace!(path, bytes = data.len(), "Writing file");
        Ok(fs::write(file, data).map_err(|e| FsError::io(path, e))?)
    }

    fn append(&self, path: &str, data: &[u8]) -> DataResult<()> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::io(path, e))?;
        }
        trace!(path, bytes = data.len(), "Appending to file");
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .map_err(|e| FsError::io(path, e))?;
        Ok(out.write_all(data).map_err(|e| FsError::io(path, e))?)
    }

    fn remove(&self, path: &str) -> DataResult<()> {
        let target = self.resolve(path)?;
        if target == self.root {
            return Err(FsError::Escape(path.to_string()).into());
        }
        let result = if target.is_dir() {
            fs::remove_dir_all(&target)
        } else {
            fs::remove_file(&target)
        };
        Ok(result.map_err(|e| FsError::io(path, e))?)
    }

    fn exists(&self, path: &str) -> DataResult<bool> {
        Ok(self.resolve(path)?.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libdata_core::DataError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_append_read() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::open(dir.path(), false).unwrap();

        fs.write("notes/test.txt", b"The first line\nThe second line").unwrap();
        fs.append("notes/test.txt", b"\nThe third line").unwrap();
        let text = String::from_utf8(fs.read("notes/test.txt").unwrap()).unwrap();
        assert_eq!(text, "The first line\nThe second line\nThe third line");

        assert_eq!(fs.list_dir("").unwrap(), vec!["notes".to_string()]);
        assert_eq!(fs.list_dir("notes").unwrap(), vec!["test.txt".to_string()]);

        fs.remove("notes/test.txt").unwrap();
        assert!(!fs.exists("notes/test.txt").unwrap());
        assert!(fs.exists("notes").unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::open(dir.path(), false).unwrap();
        assert!(matches!(fs.read("nope.txt"), Err(DataError::KeyNotFound(_))));
        assert!(fs.remove("nope.txt").is_err());
    }

    #[test]
    fn test_escape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::open(dir.path(), false).unwrap();
        for path in ["../outside.txt", "/etc/passwd", "a/../../b"] {
            assert!(fs.read(path).is_err(), "path {path}");
            assert!(fs.write(path, b"x").is_err(), "path {path}");
        }
        assert!(fs.remove("").is_err());
    }

    #[test]
    fn test_root_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            LocalFileSystem::open(&missing, false),
            Err(FsError::BadRoot(_))
        ));
        LocalFileSystem::open(&missing, true).unwrap();
        assert!(missing.is_dir());
    }
}
