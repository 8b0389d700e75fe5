//! Entity store configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::errors::{ConfigError, ConfigResult};
use crate::document::WriteOptions;

/// What `initialize` does with a document that exists but cannot be trusted.
///
/// A missing document is always replaced by a fresh empty one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryPolicy {
    /// Overwrite with an empty document
    Reset,
    /// Move the unreadable file aside, then start empty
    #[default]
    Backup,
    /// Surface the read error
    Fail,
}

/// Entity store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Spaces per indentation level (default: 4)
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Temp-file + rename writes (default: true)
    #[serde(default = "default_true")]
    pub atomic_writes: bool,

    /// Handling of corrupt documents on initialize (default: backup)
    #[serde(default)]
    pub recovery: RecoveryPolicy,

    /// Check id invariants on every read (default: true)
    #[serde(default = "default_true")]
    pub verify_invariants: bool,
}

fn default_indent() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            atomic_writes: true,
            recovery: RecoveryPolicy::default(),
            verify_invariants: true,
        }
    }
}

impl StoreConfig {
    /// Config with the given recovery policy
    pub fn with_recovery(recovery: RecoveryPolicy) -> Self {
        Self {
            recovery,
            ..Default::default()
        }
    }

    /// Loads a JSON config file. Absent keys take their defaults.
    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            indent: self.indent,
            atomic: self.atomic_writes,
        }
    }
}
