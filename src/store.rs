//! # Content-Addressed Blob Store
//!
//! Maps a content address `sha256-<hex>` to its bytes via an injected
//! [`StorageAdapter`], deduplicating on write. This is the component where
//! identical file bodies — across versions and across paths — collapse to
//! a single stored object: a rename-then-checkpoint writes zero new blobs.
//!
//! The store owns the reserved prefix `.store/blobs/` exclusively; no
//! other component may write there.

use crate::adapter::StorageAdapter;
use crate::error::{EngineError, Result};
use crate::hasher;
use tracing::debug;

const PREFIX: &str = ".store/";

fn full_key(content_ref: &str) -> String {
    format!("{PREFIX}{content_ref}")
}

/// Reads the bytes for `content_ref` through `adapter`. Fails with
/// [`EngineError::NotFound`] if the blob is missing.
///
/// A free function rather than a `BlobStore` method so read-only callers
/// (history lookups, integrity verification) can operate over a shared
/// `&impl StorageAdapter` without needing a mutable borrow just to read.
pub fn get(adapter: &impl StorageAdapter, content_ref: &str) -> Result<Vec<u8>> {
    let key = full_key(content_ref);
    adapter.read(&key).map_err(|e| match e {
        EngineError::NotFound { .. } => EngineError::NotFound {
            key: content_ref.to_string(),
        },
        other => other,
    })
}

/// Returns whether a blob for `content_ref` exists in `adapter`.
pub fn has(adapter: &impl StorageAdapter, content_ref: &str) -> bool {
    adapter.exists(&full_key(content_ref))
}

/// Lists every content ref currently stored under `.store/blobs/` in
/// `adapter`.
pub fn list_blobs(adapter: &impl StorageAdapter) -> Result<Vec<String>> {
    let prefix = format!("{PREFIX}blobs/");
    let keys = adapter.list(&prefix)?;
    Ok(keys
        .into_iter()
        .filter_map(|k| k.strip_prefix(PREFIX).map(|s| s.to_string()))
        .collect())
}

/// A deduplicating, hash-keyed object store over an injected adapter.
///
/// Only [`BlobStore::put`] needs a mutable adapter borrow; its read-only
/// methods are thin wrappers around the free functions above so they also
/// work through a shared reference (see [`get`], [`has`], [`list_blobs`]).
pub struct BlobStore<'a, A: StorageAdapter> {
    adapter: &'a mut A,
}

impl<'a, A: StorageAdapter> BlobStore<'a, A> {
    pub fn new(adapter: &'a mut A) -> Self {
        Self { adapter }
    }

    /// Computes the SHA-256 of `bytes`, writes it under `.store/` unless a
    /// blob with that content address already exists, and returns the
    /// content reference (`blobs/sha256-<hex>`). Writing an
    /// already-present blob is a no-op and idempotent.
    pub fn put(&mut self, bytes: &[u8]) -> Result<String> {
        let digest = hasher::hash_bytes(bytes);
        let content_ref = hasher::content_ref(&digest);
        let key = full_key(&content_ref);

        if self.adapter.exists(&key) {
            debug!(content_ref = %content_ref, "blob deduplicated");
            return Ok(content_ref);
        }

        self.adapter.write(&key, bytes)?;
        debug!(content_ref = %content_ref, bytes = bytes.len(), "blob stored");
        Ok(content_ref)
    }

    /// Reads the bytes for `content_ref`. Fails with
    /// [`EngineError::NotFound`] if the blob is missing.
    pub fn get(&self, content_ref: &str) -> Result<Vec<u8>> {
        get(self.adapter, content_ref)
    }

    /// Returns whether a blob for `content_ref` exists.
    pub fn has(&self, content_ref: &str) -> bool {
        has(self.adapter, content_ref)
    }

    /// Lists every content ref currently stored under `.store/blobs/`.
    pub fn list_blobs(&self) -> Result<Vec<String>> {
        list_blobs(self.adapter)
    }
}
