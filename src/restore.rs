//! # Restore Engine
//!
//! Given a target version id, computes the minimal plan — a delete set and
//! a restore set of (path, content-ref) pairs — to turn the current
//! working set into that version, then applies it by reading blobs through
//! the [`BlobStore`]. Restore never appends a new version; it only moves
//! `refs.head`, so head can point backward (or forward again) along the
//! existing linear chain while later versions remain in history.

use crate::adapter::StorageAdapter;
use crate::checkpoint::would_hash_to;
use crate::error::{EngineError, Result};
use crate::manifest::Manifest;
use crate::store::BlobStore;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// The minimal set of changes needed to move a working set to a target
/// version. Pure data — computing a plan never touches storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestorePlan {
    pub files_to_delete: BTreeSet<String>,
    pub files_to_restore: BTreeMap<String, String>,
}

/// Computes the restore plan for moving `working_set` to `version_id`.
/// Fails with [`EngineError::VersionNotFound`] if the version does not
/// exist in `manifest`.
///
/// Entries whose current working-set bytes already hash to the target
/// content-ref are omitted from `files_to_restore` — an optimization the
/// caller cannot observe, since the bytes end up identical either way.
pub fn compute_restore_plan(
    manifest: &Manifest,
    working_set: &BTreeMap<String, Vec<u8>>,
    version_id: &str,
) -> Result<RestorePlan> {
    let target = manifest
        .find_version(version_id)
        .ok_or_else(|| EngineError::VersionNotFound {
            id: version_id.to_string(),
        })?;

    let current_paths: BTreeSet<String> = working_set.keys().cloned().collect();
    let target_paths: BTreeSet<String> = target.file_states.keys().cloned().collect();

    let files_to_delete = current_paths.difference(&target_paths).cloned().collect();

    let mut files_to_restore = BTreeMap::new();
    for (path, state) in &target.file_states {
        let already_matches = working_set
            .get(path)
            .is_some_and(|bytes| would_hash_to(bytes, &state.content_ref));
        if !already_matches {
            files_to_restore.insert(path.clone(), state.content_ref.clone());
        }
    }

    Ok(RestorePlan {
        files_to_delete,
        files_to_restore,
    })
}

/// Applies a previously computed [`RestorePlan`] to `working_set`, reading
/// restored blobs through `adapter`, then advances `manifest.refs.head` to
/// `version_id`.
pub fn apply_restore_plan(
    manifest: &mut Manifest,
    adapter: &mut impl StorageAdapter,
    working_set: &mut BTreeMap<String, Vec<u8>>,
    plan: &RestorePlan,
    version_id: &str,
) -> Result<()> {
    for path in &plan.files_to_delete {
        working_set.remove(path);
    }

    let store = BlobStore::new(adapter);
    for (path, content_ref) in &plan.files_to_restore {
        let bytes = store.get(content_ref)?;
        working_set.insert(path.clone(), bytes);
    }

    manifest.refs.head = version_id.to_string();
    Ok(())
}

/// Full restore: computes the plan and applies it in one step. Kept
/// separate from [`compute_restore_plan`] so a caller that only wants a
/// preview can stop after computing the plan.
pub fn restore_version(
    manifest: &mut Manifest,
    adapter: &mut impl StorageAdapter,
    working_set: &mut BTreeMap<String, Vec<u8>>,
    version_id: &str,
) -> Result<String> {
    let plan = compute_restore_plan(manifest, working_set, version_id)?;
    apply_restore_plan(manifest, adapter, working_set, &plan, version_id)?;

    info!(
        version = %version_id,
        deleted = plan.files_to_delete.len(),
        restored = plan.files_to_restore.len(),
        "restore applied"
    );

    Ok(version_id.to_string())
}
