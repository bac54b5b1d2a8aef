//! # Project Manager
//!
//! The embeddable façade: owns an adapter, a working set, and an optional
//! loaded manifest, and exposes the full operation surface the host
//! program drives — create, mutate, checkpoint, restore, inspect history,
//! and move archives in and out. Every operation that needs a manifest
//! checks it's loaded first and raises [`EngineError::NoProject`]
//! otherwise.

use crate::adapter::StorageAdapter;
use crate::archive;
use crate::checkpoint;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::history::{
    self, FileHistoryEntry, IntegrityReport, VersionDiff, VersionInfo,
};
use crate::manifest::{self, FileEntry, Manifest, RenameLogEntry};
use crate::restore;
use std::collections::BTreeMap;
use tracing::info;

/// The embeddable versioning engine: one adapter, one working set, one
/// project at a time.
pub struct Project<A: StorageAdapter> {
    adapter: A,
    manifest: Option<Manifest>,
    working_set: BTreeMap<String, Vec<u8>>,
    config: EngineConfig,
}

impl<A: StorageAdapter> Project<A> {
    /// Wraps an adapter with no project loaded yet, using default
    /// [`EngineConfig`] tunables.
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, EngineConfig::default())
    }

    /// Wraps an adapter with no project loaded yet, under an explicit
    /// [`EngineConfig`] (e.g. loaded via [`crate::config::load_config_from`]).
    pub fn with_config(adapter: A, config: EngineConfig) -> Self {
        Self {
            adapter,
            manifest: None,
            working_set: BTreeMap::new(),
            config,
        }
    }

    /// Creates a brand-new, empty project named `name`.
    pub fn create_project(&mut self, name: &str, now: &str) -> Result<()> {
        self.manifest = Some(Manifest::new(name, now));
        self.working_set.clear();
        info!(project = %name, "project created");
        Ok(())
    }

    /// Loads a project's manifest from `manifest_key` through the adapter,
    /// clearing the working set (the caller re-populates it via
    /// [`Self::add_file`] or a [`Self::restore_version`]).
    pub fn load(&mut self, manifest_key: &str) -> Result<()> {
        let bytes = self.adapter.read(manifest_key)?;
        let json = String::from_utf8(bytes).map_err(|e| anyhow::anyhow!(e))?;
        self.manifest = Some(Manifest::from_json(&json)?);
        self.working_set.clear();
        Ok(())
    }

    /// Writes the current manifest back to `manifest_key` through the
    /// adapter, pretty-printed or compact per [`EngineConfig::pretty_json`].
    pub fn save(&mut self, manifest_key: &str) -> Result<()> {
        let pretty = self.config.pretty_json;
        let manifest = self.manifest()?;
        let json = manifest.to_json(pretty)?;
        self.adapter.write(manifest_key, json.as_bytes())?;
        Ok(())
    }

    fn manifest(&self) -> Result<&Manifest> {
        self.manifest.as_ref().ok_or(EngineError::NoProject)
    }

    fn manifest_mut(&mut self) -> Result<&mut Manifest> {
        self.manifest.as_mut().ok_or(EngineError::NoProject)
    }

    /// Stages `bytes` at `path` in the working set. Creates a fresh File
    /// Entry on first appearance of `path` (assigning a stable inode-id) or
    /// touches `modified` on an existing one; does not write a blob — blobs
    /// are produced at checkpoint time.
    pub fn add_file(&mut self, path: &str, bytes: Vec<u8>, now: &str) -> Result<()> {
        if self.manifest.is_none() {
            return Err(EngineError::NoProject);
        }
        self.working_set.insert(path.to_string(), bytes);
        let manifest = self.manifest_mut()?;
        match manifest.file_map.get_mut(path) {
            Some(entry) => entry.modified = now.to_string(),
            None => {
                manifest.file_map.insert(
                    path.to_string(),
                    FileEntry {
                        inode_id: uuid::Uuid::new_v4().to_string(),
                        kind: manifest::classify_path(path),
                        created: now.to_string(),
                        modified: now.to_string(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Reads a path's current working-set bytes.
    pub fn get_file(&self, path: &str) -> Result<Option<&Vec<u8>>> {
        self.manifest()?;
        Ok(self.working_set.get(path))
    }

    /// Removes `path` from the working set. Returns `true` iff it was
    /// present. Does not touch the file map immediately — the next
    /// checkpoint reconciles it to the working set.
    pub fn delete_file(&mut self, path: &str) -> Result<bool> {
        self.manifest()?;
        Ok(self.working_set.remove(path).is_some())
    }

    /// Lists every path currently staged in the working set.
    pub fn list_files(&self) -> Result<Vec<String>> {
        self.manifest()?;
        Ok(self.working_set.keys().cloned().collect())
    }

    /// Renames a path within the working set, transferring its File Entry
    /// (preserving inode-id) under the new key, and appends a pending
    /// rename-log entry back-filled with a version id at the next
    /// checkpoint. Returns `false` without effect if `from` is absent or
    /// `to` is already staged.
    pub fn rename_file(&mut self, from: &str, to: &str, now: &str) -> Result<bool> {
        if self.manifest.is_none() {
            return Err(EngineError::NoProject);
        }
        if !self.working_set.contains_key(from) || self.working_set.contains_key(to) {
            return Ok(false);
        }

        let Some(bytes) = self.working_set.remove(from) else {
            return Ok(false);
        };
        self.working_set.insert(to.to_string(), bytes);

        let manifest = self.manifest_mut()?;
        if let Some(entry) = manifest.file_map.remove(from) {
            manifest.file_map.insert(to.to_string(), entry);
        }
        manifest.rename_log.push(RenameLogEntry {
            from: from.to_string(),
            to: to.to_string(),
            timestamp: now.to_string(),
            version_id: String::new(),
        });
        Ok(true)
    }

    /// Promotes the working set to a new immutable version.
    pub fn save_checkpoint(&mut self, message: &str, author: &str, now: &str) -> Result<String> {
        let working_set = self.working_set.clone();
        let manifest = self.manifest_mut()?;
        checkpoint::save_checkpoint(manifest, &mut self.adapter, &working_set, message, author, now)
    }

    /// Promotes the working set to a new immutable version, attributing it
    /// to [`EngineConfig::default_author`] instead of a caller-supplied
    /// author.
    pub fn save_checkpoint_as_default_author(&mut self, message: &str, now: &str) -> Result<String> {
        let author = self.config.default_author.clone();
        self.save_checkpoint(message, &author, now)
    }

    /// Moves the working set and head to `version_id`.
    pub fn restore_version(&mut self, version_id: &str) -> Result<String> {
        let manifest = self.manifest_mut()?;
        restore::restore_version(manifest, &mut self.adapter, &mut self.working_set, version_id)
    }

    /// Looks up a version's summary information.
    pub fn get_version_info(&self, version_id: &str) -> Result<Option<VersionInfo>> {
        Ok(history::get_version_info(self.manifest()?, version_id))
    }

    /// Reads a file's content as of a specific version.
    pub fn get_file_at_version(&self, path: &str, version_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(history::get_file_at_version(
            self.manifest()?,
            &self.adapter,
            path,
            version_id,
        ))
    }

    /// Reconstructs a file's create/modify/delete history across all
    /// versions.
    pub fn get_file_history(&self, path: &str) -> Result<Vec<FileHistoryEntry>> {
        Ok(history::get_file_history(self.manifest()?, path))
    }

    /// Compares two versions' file-states.
    pub fn compare_versions(&self, a: &str, b: &str) -> Result<Option<VersionDiff>> {
        Ok(history::compare_versions(self.manifest()?, a, b))
    }

    /// Binds a named tag to a version.
    pub fn tag_version(&mut self, version_id: &str, name: &str) -> Result<bool> {
        Ok(history::tag_version(self.manifest_mut()?, version_id, name))
    }

    /// Resolves a tag name to a version id.
    pub fn get_version_by_tag(&self, name: &str) -> Result<Option<String>> {
        Ok(history::get_version_by_tag(self.manifest()?, name))
    }

    /// Re-verifies every blob referenced by history against its content
    /// address.
    pub fn verify_integrity(&self) -> Result<IntegrityReport> {
        Ok(history::verify_integrity(self.manifest()?, &self.adapter))
    }

    /// Packages the current manifest and working set into a portable
    /// archive and writes it to `archive_key` through the adapter.
    pub fn save_archive(&mut self, archive_key: &str) -> Result<()> {
        let bytes = archive::build_archive(self.manifest()?, &self.adapter, &self.working_set)?;
        self.adapter.write(archive_key, &bytes)?;
        Ok(())
    }

    /// Loads a project from a portable archive previously written by
    /// [`Self::save_archive`], replacing any currently loaded project.
    pub fn load_archive(&mut self, archive_key: &str) -> Result<()> {
        let bytes = self.adapter.read(archive_key)?;
        let extracted = archive::extract_archive(&bytes, &mut self.adapter)?;
        self.manifest = Some(extracted.manifest);
        self.working_set = extracted.working_set;
        Ok(())
    }

    /// Exposes the adapter for advanced callers (e.g. driver programs that
    /// want to inspect raw blob keys).
    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}
