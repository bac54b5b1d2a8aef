//! # Archive Codec
//!
//! Packages a manifest, the working-set bytes, and every blob referenced
//! by history into a single portable ZIP-shaped container, and extracts it
//! symmetrically. Entry layout:
//!
//! - `mimetype` — first entry, stored uncompressed, body `application/x-jcf`
//! - `manifest.json` — canonical JSON of the manifest
//! - `content/<path>` — one entry per working-set path, raw bytes
//! - `.store/blobs/sha256-<hex>` — every blob referenced by history
//!
//! `load` materializes every blob entry through the adapter so a
//! subsequent restore finds its blobs without any out-of-band directory
//! copy — a project opened this way never needs its blob store copied in
//! by hand alongside the archive.

use crate::adapter::StorageAdapter;
use crate::error::{EngineError, Result};
use crate::manifest::Manifest;
use crate::store::BlobStore;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const MIMETYPE: &str = "application/x-jcf";

/// Serializes `manifest`, `working_set`, and every blob `working_set`'s
/// versions reference into a ZIP byte buffer.
pub fn build_archive(
    manifest: &Manifest,
    adapter: &impl StorageAdapter,
    working_set: &BTreeMap<String, Vec<u8>>,
) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);

        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("mimetype", stored)?;
        zip.write_all(MIMETYPE.as_bytes())?;

        zip.start_file("manifest.json", deflated)?;
        zip.write_all(manifest.to_canonical_json()?.as_bytes())?;

        for (path, bytes) in working_set {
            zip.start_file(format!("content/{path}"), deflated)?;
            zip.write_all(bytes)?;
        }

        // Every blob referenced anywhere in history, for portability.
        let referenced = referenced_content_refs(manifest);
        for content_ref in &referenced {
            let store_key = format!(".store/{content_ref}");
            if adapter.exists(&store_key) {
                let bytes = adapter.read(&store_key)?;
                zip.start_file(store_key, deflated)?;
                zip.write_all(&bytes)?;
            }
        }

        zip.finish()?;
    }

    info!(
        files = working_set.len(),
        blobs = referenced_content_refs(manifest).len(),
        "archive built"
    );

    Ok(buffer.into_inner())
}

fn referenced_content_refs(manifest: &Manifest) -> BTreeMap<String, ()> {
    let mut refs = BTreeMap::new();
    for version in &manifest.version_history {
        for state in version.file_states.values() {
            refs.insert(state.content_ref.clone(), ());
        }
    }
    refs
}

/// The result of extracting an archive: the manifest and working set it
/// contained. Blobs are written directly into the adapter as a side
/// effect, not returned.
pub struct ExtractedArchive {
    pub manifest: Manifest,
    pub working_set: BTreeMap<String, Vec<u8>>,
}

/// Extracts an archive previously produced by [`build_archive`], replacing
/// `adapter`'s blob entries as it goes. Fails with
/// [`EngineError::InvalidArchive`] if `mimetype` or `manifest.json` is
/// missing, or if the manifest fails to parse.
pub fn extract_archive(
    bytes: &[u8],
    adapter: &mut impl StorageAdapter,
) -> Result<ExtractedArchive> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;

    let mut found_mimetype = false;
    let mut manifest: Option<Manifest> = None;
    let mut working_set = BTreeMap::new();
    let mut blob_writes = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;

        if name == "mimetype" {
            found_mimetype = true;
        } else if name == "manifest.json" {
            let json = String::from_utf8(data).map_err(|e| EngineError::InvalidArchive {
                reason: format!("manifest.json is not valid UTF-8: {e}"),
            })?;
            manifest = Some(Manifest::from_json(&json).map_err(|e| {
                EngineError::InvalidArchive {
                    reason: format!("manifest.json did not parse: {e}"),
                }
            })?);
        } else if let Some(relative) = name.strip_prefix("content/") {
            if !relative.is_empty() {
                working_set.insert(relative.to_string(), data);
            }
        } else if name.starts_with(".store/") {
            blob_writes.push((name, data));
        }
    }

    if !found_mimetype {
        return Err(EngineError::InvalidArchive {
            reason: "missing mimetype entry".to_string(),
        });
    }
    let manifest = manifest.ok_or_else(|| EngineError::InvalidArchive {
        reason: "missing manifest.json entry".to_string(),
    })?;

    for (key, data) in blob_writes {
        adapter.write(&key, &data)?;
    }

    info!(files = working_set.len(), "archive extracted");

    Ok(ExtractedArchive {
        manifest,
        working_set,
    })
}
