//! Named solver presets.
//!
//! Provides pre-built solver option bundles for:
//! - Quick: fast data structures, coarse precision, short time limit
//! - Balanced: moderate precision with a generous time limit
//! - Thorough: tight precision, no time limit, periodic policy snapshots

use crate::options::SolverOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available solver presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Fast, coarse solve for iteration and smoke tests
    Quick,
    /// Reasonable precision under a bounded time budget
    Balanced,
    /// Tight precision with no time limit
    Thorough,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Quick, PresetName::Balanced, PresetName::Thorough];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Quick => "quick",
            PresetName::Balanced => "balanced",
            PresetName::Thorough => "thorough",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "quick" | "fast" | "smoke" => Some(PresetName::Quick),
            "balanced" | "default" => Some(PresetName::Balanced),
            "thorough" | "precise" | "exact" => Some(PresetName::Thorough),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Quick => "Fast data structures, precision 0.1, 60 second limit",
            PresetName::Balanced => "Precision 0.01, 10 minute limit",
            PresetName::Thorough => {
                "Precision 0.0001, no time limit, intermediate policy every 5 minutes"
            }
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone)]
pub enum PresetError {
    /// Unknown preset name.
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => {
                write!(
                    f,
                    "Unknown preset '{}'. Available: {}",
                    name,
                    PresetName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for PresetError {}

/// Get the solver options for a preset.
pub fn get_preset(name: PresetName) -> SolverOptions {
    match name {
        PresetName::Quick => SolverOptions {
            fast: true,
            precision: Some(0.1),
            timeout: Some(60.0),
            ..Default::default()
        },
        PresetName::Balanced => SolverOptions {
            precision: Some(0.01),
            timeout: Some(600.0),
            ..Default::default()
        },
        PresetName::Thorough => SolverOptions {
            precision: Some(1e-4),
            policy_interval: Some(300.0),
            ..Default::default()
        },
    }
}

/// Information about a preset for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub options: SolverOptions,
}

impl PresetInfo {
    /// Create info from a preset.
    pub fn from_preset(name: PresetName) -> Self {
        Self {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
            options: get_preset(name),
        }
    }
}

/// List all available presets with summary information.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}
