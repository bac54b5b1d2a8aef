//! # Checkpoint Engine
//!
//! Atomically promotes a working set to a new immutable version: hashes
//! each staged file, writes new blobs through the [`BlobStore`], builds the
//! file-state snapshot, links the new version to the current head, and
//! reconciles the file map. All hashing and storage happens before the
//! single manifest mutation that advances head, so a failure midway never
//! leaves the manifest half-advanced — it may leave unreferenced blobs in
//! the store, which is harmless garbage, never a correctness problem.

use crate::adapter::StorageAdapter;
use crate::error::Result;
use crate::hasher;
use crate::manifest::{self, FileEntry, FileState, Manifest, VersionRecord};
use crate::store::BlobStore;
use serde_json::Map;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::info;

/// Computes the content-addressed id for a prospective version from its
/// parent, message, author, timestamp, and serialized file-states. Using a
/// deterministic hash rather than a random id means identical checkpoint
/// inputs always produce the same version id.
pub fn compute_version_id(
    parent_id: Option<&str>,
    message: &str,
    author: &str,
    timestamp: &str,
    file_states: &BTreeMap<String, FileState>,
) -> Result<String> {
    let serialized = serde_json::to_string(file_states)?;
    let mut hasher = Sha256::new();
    hasher.update(parent_id.unwrap_or("").as_bytes());
    hasher.update(b"\0");
    hasher.update(message.as_bytes());
    hasher.update(b"\0");
    hasher.update(author.as_bytes());
    hasher.update(b"\0");
    hasher.update(timestamp.as_bytes());
    hasher.update(b"\0");
    hasher.update(serialized.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Promotes `working_set` to a new version on `manifest`, storing any new
/// blobs through `adapter`. Returns the new version id. An empty working
/// set is legal and produces a version with empty file-states.
pub fn save_checkpoint(
    manifest: &mut Manifest,
    adapter: &mut impl StorageAdapter,
    working_set: &BTreeMap<String, Vec<u8>>,
    message: &str,
    author: &str,
    now: &str,
) -> Result<String> {
    let mut store = BlobStore::new(adapter);

    // Step 1-2: hash and store every staged file, building file-states.
    let mut file_states = BTreeMap::new();
    for (path, bytes) in working_set {
        let content_ref = store.put(bytes)?;
        file_states.insert(path.clone(), FileState { content_ref });
    }

    // Step 3: compute the deterministic version id.
    let parent_id = if manifest.refs.head.is_empty() {
        None
    } else {
        Some(manifest.refs.head.as_str())
    };
    let version_id =
        compute_version_id(parent_id, message, author, now, &file_states)?;

    // Step 4: append the version record.
    manifest.version_history.push(VersionRecord {
        id: version_id.clone(),
        parent_id: parent_id.map(|s| s.to_string()),
        message: message.to_string(),
        author: author.to_string(),
        timestamp: now.to_string(),
        file_states,
        extra: Map::new(),
    });

    // Step 5: advance head.
    manifest.refs.head = version_id.clone();

    // Step 6: reconcile the file map to exactly the working-set paths.
    manifest
        .file_map
        .retain(|path, _| working_set.contains_key(path));
    for path in working_set.keys() {
        manifest
            .file_map
            .entry(path.clone())
            .or_insert_with(|| FileEntry {
                inode_id: uuid::Uuid::new_v4().to_string(),
                kind: manifest::classify_path(path),
                created: now.to_string(),
                modified: now.to_string(),
            });
    }

    // Step 7: back-fill any pending rename log entries.
    for entry in manifest.rename_log.iter_mut() {
        if entry.version_id.is_empty() {
            entry.version_id = version_id.clone();
        }
    }

    // Step 8: update last-modified.
    manifest.metadata.last_modified = now.to_string();

    info!(version = %version_id, files = working_set.len(), "checkpoint saved");

    Ok(version_id)
}

/// Computes only the SHA-256 hash a path's bytes would receive at
/// checkpoint time, without writing anything — used by the restore engine
/// to decide whether a working-set entry already matches a target blob.
pub fn would_hash_to(bytes: &[u8], content_ref: &str) -> bool {
    let digest = hasher::hash_bytes(bytes);
    hasher::digest_from_content_ref(content_ref) == Some(digest.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryAdapter;

    fn working_set(pairs: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
        pairs
            .iter()
            .map(|(p, b)| (p.to_string(), b.to_vec()))
            .collect()
    }

    #[test]
    fn checkpoint_advances_head_and_records_file_states() {
        let mut manifest = Manifest::new("Demo", "t0");
        let mut adapter = MemoryAdapter::new();
        let ws = working_set(&[("README.md", b"# Demo")]);

        let id = save_checkpoint(&mut manifest, &mut adapter, &ws, "init", "alice", "t1").unwrap();

        assert_eq!(manifest.refs.head, id);
        assert_eq!(manifest.version_history.len(), 1);
        let v = &manifest.version_history[0];
        assert_eq!(v.parent_id, None);
        assert!(v.file_states.contains_key("README.md"));
    }

    #[test]
    fn second_checkpoint_links_to_first_as_parent() {
        let mut manifest = Manifest::new("Demo", "t0");
        let mut adapter = MemoryAdapter::new();
        let ws1 = working_set(&[("a.txt", b"1")]);
        let v1 = save_checkpoint(&mut manifest, &mut adapter, &ws1, "m1", "a", "t1").unwrap();

        let ws2 = working_set(&[("a.txt", b"2")]);
        let v2 = save_checkpoint(&mut manifest, &mut adapter, &ws2, "m2", "a", "t2").unwrap();

        assert_eq!(manifest.find_version(&v2).unwrap().parent_id, Some(v1));
    }

    #[test]
    fn empty_working_set_is_legal() {
        let mut manifest = Manifest::new("Demo", "t0");
        let mut adapter = MemoryAdapter::new();
        let ws = BTreeMap::new();
        let id = save_checkpoint(&mut manifest, &mut adapter, &ws, "empty", "a", "t1").unwrap();
        assert!(manifest.find_version(&id).unwrap().file_states.is_empty());
    }

    #[test]
    fn identical_bytes_under_distinct_paths_dedupe_to_one_blob() {
        let mut manifest = Manifest::new("Demo", "t0");
        let mut adapter = MemoryAdapter::new();
        let ws = working_set(&[("a.txt", b"X"), ("b.txt", b"X")]);
        save_checkpoint(&mut manifest, &mut adapter, &ws, "m", "a", "t1").unwrap();

        let store = BlobStore::new(&mut adapter);
        assert_eq!(store.list_blobs().unwrap().len(), 1);
    }

    #[test]
    fn file_map_is_reconciled_to_working_set() {
        let mut manifest = Manifest::new("Demo", "t0");
        let mut adapter = MemoryAdapter::new();
        let ws1 = working_set(&[("a.txt", b"1"), ("b.txt", b"2")]);
        save_checkpoint(&mut manifest, &mut adapter, &ws1, "m1", "a", "t1").unwrap();
        assert_eq!(manifest.file_map.len(), 2);

        let ws2 = working_set(&[("a.txt", b"1")]);
        save_checkpoint(&mut manifest, &mut adapter, &ws2, "m2", "a", "t2").unwrap();
        assert_eq!(manifest.file_map.len(), 1);
        assert!(manifest.file_map.contains_key("a.txt"));
    }

    #[test]
    fn pending_rename_log_entries_are_backfilled() {
        let mut manifest = Manifest::new("Demo", "t0");
        manifest.rename_log.push(crate::manifest::RenameLogEntry {
            from: "old.txt".to_string(),
            to: "new.txt".to_string(),
            timestamp: "t0".to_string(),
            version_id: String::new(),
        });
        let mut adapter = MemoryAdapter::new();
        let ws = working_set(&[("new.txt", b"x")]);
        let id = save_checkpoint(&mut manifest, &mut adapter, &ws, "m", "a", "t1").unwrap();
        assert_eq!(manifest.rename_log[0].version_id, id);
    }

    #[test]
    fn version_id_is_deterministic_content_address() {
        let fs = BTreeMap::new();
        let id1 = compute_version_id(None, "m", "a", "t", &fs).unwrap();
        let id2 = compute_version_id(None, "m", "a", "t", &fs).unwrap();
        assert_eq!(id1, id2);

        let id3 = compute_version_id(None, "different", "a", "t", &fs).unwrap();
        assert_ne!(id1, id3);
    }
}
