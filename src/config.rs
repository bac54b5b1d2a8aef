//! # Configuration
//!
//! Engine-level tunables loaded from an optional TOML file: hashing chunk
//! size, whether manifests are pretty-printed, and a default author used
//! when a caller doesn't supply one.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine-level configuration. All fields have defaults, so a missing
/// config file is never an error — callers that want one call
/// [`load_config_from`] explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Chunk size in bytes used when streaming bytes through the hasher.
    #[serde(default = "default_hash_chunk_size")]
    pub hash_chunk_size: usize,

    /// Whether manifest JSON is pretty-printed (`true`) or compact.
    #[serde(default = "default_pretty_json")]
    pub pretty_json: bool,

    /// Author attributed to a checkpoint when the caller doesn't supply
    /// one explicitly.
    #[serde(default = "default_author")]
    pub default_author: String,
}

fn default_hash_chunk_size() -> usize {
    64 * 1024
}

fn default_pretty_json() -> bool {
    true
}

fn default_author() -> String {
    "unknown".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_chunk_size: default_hash_chunk_size(),
            pretty_json: default_pretty_json(),
            default_author: default_author(),
        }
    }
}

/// Parses and validates configuration from a specific file path.
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;

    let config: EngineConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse { source: e })?;

    validate_config(&config)?;
    Ok(config)
}

/// Validates configuration invariants after parsing.
fn validate_config(config: &EngineConfig) -> std::result::Result<(), ConfigError> {
    if config.hash_chunk_size == 0 {
        return Err(ConfigError::Validation {
            message: "hash_chunk_size must be greater than 0".to_string(),
        });
    }

    if config.default_author.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "default_author must not be empty".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn load_config_from_parses_partial_toml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_author = \"alice\"").unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.default_author, "alice");
        assert_eq!(config.hash_chunk_size, default_hash_chunk_size());
        assert!(config.pretty_json);
    }

    #[test]
    fn load_config_from_rejects_zero_chunk_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hash_chunk_size = 0").unwrap();

        let err = load_config_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::EngineError::Config(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn load_config_from_rejects_empty_default_author() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_author = \"\"").unwrap();

        let err = load_config_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::EngineError::Config(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn load_config_from_missing_file_is_an_error() {
        let err = load_config_from(Path::new("/nonexistent/path/config.toml")).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Other(_)));
    }
}
