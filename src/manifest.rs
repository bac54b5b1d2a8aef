//! # Manifest & Version Model
//!
//! Typed in-memory representation of project metadata, the live file map,
//! the append-only version history, refs (head + tags), and the rename
//! log — plus canonical JSON (de)serialization matching the wire format:
//! lowerCamelCase field names, format version `"1.0.0"`.
//!
//! Unknown fields survive a load→save round-trip via a `#[serde(flatten)]`
//! catch-all on [`Manifest`] and [`VersionRecord`] — a forward-
//! compatibility concession for older or newer writers sharing a project.
//! Legacy `blobRef` is accepted (never written) on [`FileState`] for
//! compatibility with manifests written before the field was renamed to
//! `contentRef`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The manifest's wire format version. Bump only on a breaking schema
/// change; readers tolerate unknown fields regardless.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Produces the current wall-clock time as an ISO-8601 (RFC 3339) string,
/// the format every timestamp field in this crate expects. The engine
/// itself never calls this — every operation takes `now` as an explicit
/// parameter so checkpoints and restores stay reproducible in tests —
/// callers wire it in at their own call sites.
pub fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// The full, serializable state of a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    #[serde(rename = "formatVersion")]
    pub format_version: String,
    pub metadata: ProjectMetadata,
    #[serde(rename = "fileMap")]
    pub file_map: BTreeMap<String, FileEntry>,
    #[serde(rename = "versionHistory")]
    pub version_history: Vec<VersionRecord>,
    pub refs: Refs,
    #[serde(rename = "renameLog")]
    pub rename_log: Vec<RenameLogEntry>,
    /// Unknown top-level fields preserved across a load→save round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Builds a fresh, empty manifest for a newly created project.
    pub fn new(name: &str, now: &str) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            metadata: ProjectMetadata {
                name: name.to_string(),
                created: now.to_string(),
                last_modified: now.to_string(),
                description: None,
                author: None,
                extra: Map::new(),
            },
            file_map: BTreeMap::new(),
            version_history: Vec::new(),
            refs: Refs {
                head: String::new(),
                tags: BTreeMap::new(),
            },
            rename_log: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Canonical JSON serialization (pretty-printed, stable key order).
    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes to JSON, pretty-printed or compact depending on `pretty`.
    /// Key order is stable either way (`fileMap`/`fileStates` are
    /// `BTreeMap`s).
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Parses a manifest from its canonical JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Looks up a version record by id.
    pub fn find_version(&self, id: &str) -> Option<&VersionRecord> {
        self.version_history.iter().find(|v| v.id == id)
    }
}

/// Project-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMetadata {
    pub name: String,
    pub created: String,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Whether a file's contents are treated as text or binary. Derived from
/// the path suffix; descriptive only, never affects storage or hashing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    Binary,
}

const TEXT_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".json", ".js", ".ts", ".css", ".html", ".xml", ".yaml", ".yml", ".py", ".rs",
    ".toml",
];

/// Derives [`FileKind`] from a path's suffix.
pub fn classify_path(path: &str) -> FileKind {
    let lower = path.to_lowercase();
    if TEXT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        FileKind::Text
    } else {
        FileKind::Binary
    }
}

/// An entry in the live file map: one per currently-live path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    #[serde(rename = "inodeId")]
    pub inode_id: String,
    pub kind: FileKind,
    pub created: String,
    pub modified: String,
}

/// A path's content reference inside a single version's file-states.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileState {
    #[serde(rename = "contentRef", alias = "blobRef")]
    pub content_ref: String,
}

/// One immutable, append-only entry in the version history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionRecord {
    pub id: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    pub message: String,
    pub author: String,
    pub timestamp: String,
    #[serde(rename = "fileStates")]
    pub file_states: BTreeMap<String, FileState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Head and tag refs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Refs {
    pub head: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// An append-only rename log entry. `version_id` is empty until the next
/// checkpoint back-fills it; a manifest saved before that checkpoint
/// persists the empty value, and that is expected, not a bug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenameLogEntry {
    pub from: String,
    pub to: String,
    pub timestamp: String,
    #[serde(rename = "versionId")]
    pub version_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_iso8601_parses_as_rfc3339() {
        let ts = now_iso8601();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn new_manifest_has_empty_head_and_format_version() {
        let m = Manifest::new("Demo", "2024-01-01T00:00:00");
        assert_eq!(m.format_version, FORMAT_VERSION);
        assert_eq!(m.refs.head, "");
        assert!(m.file_map.is_empty());
        assert!(m.version_history.is_empty());
    }

    #[test]
    fn json_roundtrip_is_lossless() {
        let mut m = Manifest::new("Demo", "2024-01-01T00:00:00");
        m.file_map.insert(
            "a.txt".to_string(),
            FileEntry {
                inode_id: "inode-1".to_string(),
                kind: FileKind::Text,
                created: "2024-01-01T00:00:00".to_string(),
                modified: "2024-01-01T00:00:00".to_string(),
            },
        );
        let json = m.to_canonical_json().unwrap();
        let back = Manifest::from_json(&json).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn wire_field_names_are_lower_camel_case() {
        let m = Manifest::new("Demo", "now");
        let json = m.to_canonical_json().unwrap();
        assert!(json.contains("\"formatVersion\""));
        assert!(json.contains("\"fileMap\""));
        assert!(json.contains("\"versionHistory\""));
        assert!(json.contains("\"renameLog\""));
    }

    #[test]
    fn unknown_top_level_fields_survive_roundtrip() {
        let json = r#"{
            "formatVersion": "1.0.0",
            "metadata": {"name": "Demo", "created": "t", "lastModified": "t"},
            "fileMap": {},
            "versionHistory": [],
            "refs": {"head": ""},
            "renameLog": [],
            "futureField": {"nested": true}
        }"#;
        let m = Manifest::from_json(json).unwrap();
        assert_eq!(m.extra.get("futureField").unwrap()["nested"], true);
        let back = m.to_canonical_json().unwrap();
        assert!(back.contains("futureField"));
    }

    #[test]
    fn legacy_blob_ref_is_accepted_on_read() {
        let json = r#"{"blobRef": "blobs/sha256-abc"}"#;
        let fs: FileState = serde_json::from_str(json).unwrap();
        assert_eq!(fs.content_ref, "blobs/sha256-abc");
    }

    #[test]
    fn classify_path_by_suffix() {
        assert_eq!(classify_path("README.md"), FileKind::Text);
        assert_eq!(classify_path("photo.PNG"), FileKind::Binary);
    }

    #[test]
    fn find_version_by_id() {
        let mut m = Manifest::new("Demo", "now");
        m.version_history.push(VersionRecord {
            id: "v1".to_string(),
            parent_id: None,
            message: "first".to_string(),
            author: "unknown".to_string(),
            timestamp: "now".to_string(),
            file_states: BTreeMap::new(),
            extra: Map::new(),
        });
        assert!(m.find_version("v1").is_some());
        assert!(m.find_version("nope").is_none());
    }
}
