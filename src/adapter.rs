//! # Storage Adapter
//!
//! The engine never touches a filesystem or any other byte store directly;
//! every read and write goes through a [`StorageAdapter`] — the single
//! injected capability the core requires.
//!
//! Two implementations ship: [`MemoryAdapter`] for tests and ephemeral
//! projects, and [`FileAdapter`] rooted at a directory on disk. Neither may
//! refuse writes under `.store/blobs/` — the blob store owns that prefix
//! exclusively, but the adapter itself stays general-purpose so archive
//! extraction can write blobs back into it directly.

use crate::error::{EngineError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A byte-blob key/value capability. Keys are forward-slash-separated
/// strings; the adapter is byte-exact and performs no transcoding.
pub trait StorageAdapter {
    /// Reads the bytes stored at `key`. Fails with
    /// [`EngineError::NotFound`] if the key does not exist.
    fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Writes `data` at `key`, creating any intermediate namespaces as
    /// needed. Overwriting an existing key is permitted.
    fn write(&mut self, key: &str, data: &[u8]) -> Result<()>;

    /// Deletes `key`. A missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Returns whether `key` currently exists.
    fn exists(&self, key: &str) -> bool;

    /// Lists every key that starts with `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// An in-process, in-memory storage adapter. Useful for tests and for
/// projects that are never persisted outside of an archive.
#[derive(Debug, Default, Clone)]
pub struct MemoryAdapter {
    storage: BTreeMap<String, Vec<u8>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryAdapter {
    fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.storage
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                key: key.to_string(),
            })
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<()> {
        self.storage.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.storage.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.storage.contains_key(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .storage
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// A filesystem-backed storage adapter rooted at `base_path`.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    base_path: PathBuf,
}

impl FileAdapter {
    /// Creates (if needed) and roots an adapter at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

impl StorageAdapter for FileAdapter {
    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.full_path(key);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotFound {
                    key: key.to_string(),
                }
            } else {
                EngineError::Io(e)
            }
        })
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.full_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        let path = self.full_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.full_path(key).exists()
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let root = self.full_path(prefix);
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        collect_files(&root, &self.base_path, &mut out)?;
        Ok(out)
    }
}

fn collect_files(dir: &Path, base: &Path, out: &mut Vec<String>) -> Result<()> {
    if dir.is_file() {
        if let Ok(rel) = dir.strip_prefix(base) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, base, out)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_adapter_roundtrip() {
        let mut a = MemoryAdapter::new();
        a.write("foo/bar", b"hello").unwrap();
        assert!(a.exists("foo/bar"));
        assert_eq!(a.read("foo/bar").unwrap(), b"hello");
    }

    #[test]
    fn memory_adapter_missing_key_is_not_found() {
        let a = MemoryAdapter::new();
        let err = a.read("nope").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn memory_adapter_delete_is_not_an_error_when_missing() {
        let mut a = MemoryAdapter::new();
        assert!(a.delete("nope").is_ok());
    }

    #[test]
    fn memory_adapter_list_by_prefix() {
        let mut a = MemoryAdapter::new();
        a.write(".store/blobs/sha256-aaa", b"1").unwrap();
        a.write(".store/blobs/sha256-bbb", b"2").unwrap();
        a.write("content/readme.md", b"3").unwrap();
        let mut keys = a.list(".store/blobs/").unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                ".store/blobs/sha256-aaa".to_string(),
                ".store/blobs/sha256-bbb".to_string()
            ]
        );
    }

    #[test]
    fn file_adapter_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = FileAdapter::new(dir.path()).unwrap();
        a.write(".store/blobs/sha256-xyz", b"payload").unwrap();
        assert!(a.exists(".store/blobs/sha256-xyz"));
        assert_eq!(a.read(".store/blobs/sha256-xyz").unwrap(), b"payload");
    }

    #[test]
    fn file_adapter_list_recurses_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = FileAdapter::new(dir.path()).unwrap();
        a.write(".store/blobs/sha256-aaa", b"1").unwrap();
        a.write(".store/blobs/sha256-bbb", b"2").unwrap();
        let keys = a.list(".store/blobs").unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn file_adapter_no_restricted_prefix() {
        // No adapter may whitelist or reject the .store/blobs/ prefix.
        let dir = tempfile::tempdir().unwrap();
        let mut a = FileAdapter::new(dir.path()).unwrap();
        assert!(a.write(".store/blobs/sha256-anything", b"x").is_ok());
    }
}
