//! Provenance of a loaded policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use super::store::AlphaVectorSet;

/// What was loaded, from where, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyInfo {
    /// Policy file path; `None` for sets built in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// SHA-256 of the file contents, hex encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub loaded_at: DateTime<Utc>,
    /// Number of alpha vectors (`N`).
    pub vectors: usize,
    /// Coefficients per vector (`S`).
    pub dimension: usize,
    /// Distinct zero-based actions, ascending.
    pub actions: Vec<u32>,
    /// Whether vectors carry observable-state tags.
    pub observable: bool,
    /// Distinct observable states, ascending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observable_states: Vec<u32>,
    /// `model` attribute of the policy document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl PolicyInfo {
    /// Describe `set`, optionally with the file it was read from.
    pub fn describe(set: &AlphaVectorSet, source: Option<&Path>, contents: Option<&[u8]>) -> Self {
        PolicyInfo {
            source: source.map(Path::to_path_buf),
            sha256: contents.map(sha256_hex),
            loaded_at: Utc::now(),
            vectors: set.len(),
            dimension: set.dimension(),
            actions: set.distinct_actions(),
            observable: set.supports_observed(),
            observable_states: set.observable_states(),
            model: set.model().map(str::to_string),
        }
    }
}

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
