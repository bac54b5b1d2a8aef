//! # Error Types
//!
//! Defines a structured error hierarchy for the versioning engine using
//! `thiserror`. Each variant carries enough context for meaningful
//! diagnostics without exposing adapter-internal details to the caller.
//!
//! Structural preconditions (no project loaded) and genuine I/O failures
//! raise through [`EngineError`]; read-only lookups return `Option` and
//! predicate mutators return `bool` at the call site instead.

use thiserror::Error;

/// Top-level error type for all fallible engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An operation that requires a loaded manifest was called before
    /// `create_project` or `load`.
    #[error("no project is loaded — call create_project() or load() first")]
    NoProject,

    /// A restore or lookup targeted a version id absent from history.
    #[error("version not found: {id}")]
    VersionNotFound { id: String },

    /// A requested blob or adapter key does not exist.
    #[error("not found: {key}")]
    NotFound { key: String },

    /// The archive container is missing a required entry or contains
    /// unparseable JSON.
    #[error("invalid archive: {reason}")]
    InvalidArchive { reason: String },

    /// Configuration parsing or validation failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single integrity mismatch discovered by `verify_integrity`.
///
/// Not part of the `EngineError` tree: integrity failures are aggregated
/// into a report (see [`crate::history::IntegrityReport`]) rather than
/// raised, per the propagation policy.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IntegrityErrorDetail {
    pub version: String,
    pub path: String,
    pub content_ref: String,
    pub kind: String,
}

/// Configuration parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
