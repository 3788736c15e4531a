//! File-based storage backend for persistent storage.

use crate::backend::{validate_target, StorageBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Extension given to every blob file.
const BLOB_EXTENSION: &str = "tbl";

/// A directory-backed storage backend.
///
/// Each target is stored as `<dir>/<target>.tbl`. Writes go to a temporary
/// file first and are renamed into place, so a reader never observes a
/// partially written blob.
///
/// # Example
///
/// ```no_run
/// use tabula_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("./snapshots")).unwrap();
/// backend.put("users", b"...").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    /// Serializes writers so temp files never collide.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Opens a backend rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or `dir` is not
    /// a directory.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        if !dir.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{target}.{BLOB_EXTENSION}"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, target: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_target(target)?;
        match fs::read(self.blob_path(target)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, target: &str, data: &[u8]) -> StorageResult<()> {
        validate_target(target)?;
        let _guard = self.write_lock.lock();

        let final_path = self.blob_path(target);
        let temp_path = self.dir.join(format!(".{target}.tmp"));
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &final_path)?;
        tracing::debug!(target_name = target, bytes = data.len(), "blob written");
        Ok(())
    }

    fn remove(&self, target: &str) -> StorageResult<bool> {
        validate_target(target)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(self.blob_path(target)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn targets(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_target(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_open_creates_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("snapshots");

        let backend = FileBackend::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(backend.dir(), root.as_path());
    }

    #[test]
    fn file_put_and_get() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put("users", b"hello world").unwrap();
        assert_eq!(backend.get("users").unwrap(), Some(b"hello world".to_vec()));
    }

    #[test]
    fn file_get_missing_is_none() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("nothing").unwrap(), None);
    }

    #[test]
    fn file_put_replaces() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put("a", b"first").unwrap();
        backend.put("a", b"second").unwrap();
        assert_eq!(backend.get("a").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn file_remove() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put("a", b"x").unwrap();
        assert!(backend.remove("a").unwrap());
        assert!(!backend.remove("a").unwrap());
        assert_eq!(backend.get("a").unwrap(), None);
    }

    #[test]
    fn file_targets_ignore_foreign_files() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put("b", b"").unwrap();
        backend.put("a", b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        assert_eq!(backend.targets().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn file_persists_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let backend = FileBackend::open(dir.path()).unwrap();
            backend.put("state", b"persistent").unwrap();
        }
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("state").unwrap(), Some(b"persistent".to_vec()));
    }

    #[test]
    fn file_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert!(matches!(
            backend.put("../escape", b""),
            Err(StorageError::InvalidTarget(_))
        ));
    }
}
