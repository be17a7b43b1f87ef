//! Byte storage used for levels and saves.
//!
//! The game never touches the filesystem directly; it goes through
//! [`Storage`], which only knows about whole files. [`FsStorage`] is the real
//! implementation rooted at the data directory, [`MemStorage`] keeps
//! everything in a map and backs the tests.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Io { path: path.to_path_buf(), source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Whole-file storage. Paths are relative to the store's root.
pub trait Storage {
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, StoreError>;

    /// Replace the file's contents, creating parent directories as needed.
    fn write_all(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError>;

    fn delete(&mut self, path: &Path) -> Result<(), StoreError>;

    /// File names (not paths) directly inside `dir`, dotfiles skipped, sorted.
    fn list_files(&self, dir: &Path) -> Result<Vec<String>, StoreError>;
}

// ══════════════════════════════════════════════════════════════
// Filesystem
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStorage { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Storage for FsStorage {
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        let full = self.resolve(path);
        std::fs::read(&full).map_err(|e| StoreError::from_io(&full, e))
    }

    fn write_all(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::from_io(parent, e))?;
        }
        std::fs::write(&full, bytes).map_err(|e| StoreError::from_io(&full, e))
    }

    fn delete(&mut self, path: &Path) -> Result<(), StoreError> {
        let full = self.resolve(path);
        std::fs::remove_file(&full).map_err(|e| StoreError::from_io(&full, e))
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<String>, StoreError> {
        let full = self.resolve(dir);
        let entries = std::fs::read_dir(&full).map_err(|e| StoreError::from_io(&full, e))?;
        let mut names = vec![];
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::from_io(&full, e))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

// ══════════════════════════════════════════════════════════════
// In-memory
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct MemStorage {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemStorage {
    pub fn new() -> Self {
        MemStorage::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), bytes.into());
        self
    }
}

impl Storage for MemStorage {
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write_all(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> Result<(), StoreError> {
        self.files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<String>, StoreError> {
        let names: Vec<String> = self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.starts_with('.'))
            .collect();
        if names.is_empty() {
            return Err(StoreError::NotFound(dir.to_path_buf()));
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_write_creates_parents_and_lists() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FsStorage::new(tmp.path());
        store.write_all(Path::new("games/a/ongoing/bob.bin"), b"x").unwrap();
        store.write_all(Path::new("games/a/ongoing/.hidden"), b"y").unwrap();
        store.write_all(Path::new("games/a/ongoing/alice.bin"), b"z").unwrap();

        let names = store.list_files(Path::new("games/a/ongoing")).unwrap();
        assert_eq!(names, vec!["alice.bin".to_string(), "bob.bin".to_string()]);
        assert_eq!(store.read_all(Path::new("games/a/ongoing/bob.bin")).unwrap(), b"x");
    }

    #[test]
    fn fs_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FsStorage::new(tmp.path());
        assert!(store.read_all(Path::new("nope.bin")).unwrap_err().is_not_found());
        assert!(store.delete(Path::new("nope.bin")).unwrap_err().is_not_found());
        assert!(store.list_files(Path::new("nodir")).unwrap_err().is_not_found());
    }

    #[test]
    fn mem_lists_direct_children_only() {
        let store = MemStorage::new()
            .with_file("levels/one.dat", "a")
            .with_file("levels/two.dat", "b")
            .with_file("levels/deep/three.dat", "c");
        assert_eq!(
            store.list_files(Path::new("levels")).unwrap(),
            vec!["one.dat".to_string(), "two.dat".to_string()],
        );
    }

    #[test]
    fn mem_delete_then_read_fails() {
        let mut store = MemStorage::new().with_file("a.bin", "1");
        store.delete(Path::new("a.bin")).unwrap();
        assert!(store.read_all(Path::new("a.bin")).unwrap_err().is_not_found());
    }
}
