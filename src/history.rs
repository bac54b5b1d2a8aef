//! # History Services
//!
//! Version lookup, per-file history reconstruction, two-version diff,
//! tagging, and integrity verification over an existing [`Manifest`] and
//! [`crate::store`]. These are read-mostly services; only [`tag_version`]
//! mutates the manifest, by adding a ref.

use crate::adapter::StorageAdapter;
use crate::error::IntegrityErrorDetail;
use crate::hasher;
use crate::manifest::{FileState, Manifest};
use crate::store;
use std::collections::{BTreeMap, BTreeSet};

/// Detailed information about one version, as returned by
/// `get_version_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionInfo {
    pub id: String,
    pub message: String,
    pub timestamp: String,
    pub author: String,
    pub parent_id: Option<String>,
    pub file_states: BTreeMap<String, FileState>,
    pub file_count: usize,
}

/// Looks up a version by id, returning `None` when absent rather than
/// raising (per the read-only-lookup propagation policy).
pub fn get_version_info(manifest: &Manifest, version_id: &str) -> Option<VersionInfo> {
    let v = manifest.find_version(version_id)?;
    Some(VersionInfo {
        id: v.id.clone(),
        message: v.message.clone(),
        timestamp: v.timestamp.clone(),
        author: v.author.clone(),
        parent_id: v.parent_id.clone(),
        file_states: v.file_states.clone(),
        file_count: v.file_states.len(),
    })
}

/// Reads a file's content as it was in a specific version, resolving its
/// content-ref through the blob store. `None` if the path is absent from
/// that version or its blob is missing.
pub fn get_file_at_version(
    manifest: &Manifest,
    adapter: &impl StorageAdapter,
    path: &str,
    version_id: &str,
) -> Option<Vec<u8>> {
    let v = manifest.find_version(version_id)?;
    let state = v.file_states.get(path)?;
    store::get(adapter, &state.content_ref).ok()
}

/// One entry in a file's reconstructed history.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHistoryEntry {
    pub version_id: String,
    pub message: String,
    pub timestamp: String,
    pub action: FileAction,
    pub content_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Created,
    Modified,
    Deleted,
}

/// Walks `version_history` in insertion order, emitting an entry each time
/// `path`'s content-ref changes: `Created` on first appearance, `Modified`
/// when it changes between two versions where the path is present in
/// both, `Deleted` when present in the predecessor but absent here.
/// Versions where the path is absent in both neighbors produce nothing.
pub fn get_file_history(manifest: &Manifest, path: &str) -> Vec<FileHistoryEntry> {
    let mut history = Vec::new();
    let mut previous_ref: Option<String> = None;

    for version in &manifest.version_history {
        match version.file_states.get(path) {
            Some(state) => {
                if previous_ref.as_deref() != Some(state.content_ref.as_str()) {
                    history.push(FileHistoryEntry {
                        version_id: version.id.clone(),
                        message: version.message.clone(),
                        timestamp: version.timestamp.clone(),
                        action: if previous_ref.is_none() {
                            FileAction::Created
                        } else {
                            FileAction::Modified
                        },
                        content_ref: Some(state.content_ref.clone()),
                    });
                    previous_ref = Some(state.content_ref.clone());
                }
            }
            None => {
                if previous_ref.is_some() {
                    history.push(FileHistoryEntry {
                        version_id: version.id.clone(),
                        message: version.message.clone(),
                        timestamp: version.timestamp.clone(),
                        action: FileAction::Deleted,
                        content_ref: None,
                    });
                    previous_ref = None;
                }
            }
        }
    }

    history
}

/// The result of comparing two versions' file-states by path-key set
/// operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionDiff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub modified: BTreeSet<String>,
    pub unchanged: BTreeSet<String>,
}

impl VersionDiff {
    /// Renders the `+A -R ~M =U` added/removed/modified/unchanged summary.
    pub fn summary(&self) -> String {
        format!(
            "+{} -{} ~{} ={}",
            self.added.len(),
            self.removed.len(),
            self.modified.len(),
            self.unchanged.len()
        )
    }
}

/// Compares two versions' file-states. Returns `None` if either id is
/// absent.
pub fn compare_versions(manifest: &Manifest, a: &str, b: &str) -> Option<VersionDiff> {
    let va = manifest.find_version(a)?;
    let vb = manifest.find_version(b)?;

    let a_paths: BTreeSet<&String> = va.file_states.keys().collect();
    let b_paths: BTreeSet<&String> = vb.file_states.keys().collect();

    let added = b_paths.difference(&a_paths).map(|s| s.to_string()).collect();
    let removed = a_paths.difference(&b_paths).map(|s| s.to_string()).collect();

    let mut modified = BTreeSet::new();
    let mut unchanged = BTreeSet::new();
    for path in a_paths.intersection(&b_paths) {
        let ra = &va.file_states[*path].content_ref;
        let rb = &vb.file_states[*path].content_ref;
        if ra != rb {
            modified.insert((*path).clone());
        } else {
            unchanged.insert((*path).clone());
        }
    }

    Some(VersionDiff {
        added,
        removed,
        modified,
        unchanged,
    })
}

/// Tags `version_id` with `name`. Returns `false` if the version does not
/// exist or `name` is already bound to a version; `true` on success.
pub fn tag_version(manifest: &mut Manifest, version_id: &str, name: &str) -> bool {
    if manifest.find_version(version_id).is_none() {
        return false;
    }
    if manifest.refs.tags.contains_key(name) {
        return false;
    }
    manifest
        .refs
        .tags
        .insert(name.to_string(), version_id.to_string());
    true
}

/// Resolves a tag name to its version id, if bound.
pub fn get_version_by_tag(manifest: &Manifest, name: &str) -> Option<String> {
    manifest.refs.tags.get(name).cloned()
}

/// The report returned by `verify_integrity`: never raised, always
/// returned, with failures aggregated into `errors`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrityReport {
    pub valid: bool,
    pub checked: usize,
    pub errors: Vec<IntegrityErrorDetail>,
}

/// Re-fetches and re-hashes every content-ref referenced by every version
/// in history, comparing the recomputed digest against the hex encoded in
/// the ref. Never mutates state; aggregates failures into the report
/// rather than raising.
pub fn verify_integrity(manifest: &Manifest, adapter: &impl StorageAdapter) -> IntegrityReport {
    let mut checked = 0usize;
    let mut errors = Vec::new();

    for version in &manifest.version_history {
        for (path, state) in &version.file_states {
            let content_ref = &state.content_ref;
            match store::get(adapter, content_ref) {
                Ok(bytes) => {
                    checked += 1;
                    if let Some(expected) = hasher::digest_from_content_ref(content_ref) {
                        let actual = hasher::hash_bytes(&bytes);
                        if actual != expected {
                            errors.push(IntegrityErrorDetail {
                                version: version.id.clone(),
                                path: path.clone(),
                                content_ref: content_ref.clone(),
                                kind: format!("hash mismatch: expected {expected}, got {actual}"),
                            });
                        }
                    }
                }
                Err(_) => {
                    errors.push(IntegrityErrorDetail {
                        version: version.id.clone(),
                        path: path.clone(),
                        content_ref: content_ref.clone(),
                        kind: "blob missing".to_string(),
                    });
                }
            }
        }
    }

    IntegrityReport {
        valid: errors.is_empty(),
        checked,
        errors,
    }
}
