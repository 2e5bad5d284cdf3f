//! alphaplan configuration types and validation.
//!
//! This crate provides:
//! - Typed option structs for the external solver, simulator and evaluator
//! - Tool binary paths with environment overrides
//! - Named solver presets
//! - Config file resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod options;
pub mod preset;
pub mod resolve;
pub mod tools;
pub mod validate;

pub use options::{
    EvaluatorOptions, OptionValue, PolicyRunOptions, SimulatorOptions, SolverOptions,
};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{resolve_config, ConfigSource, ResolvedPath};
pub use tools::ToolPaths;
pub use validate::{ValidationError, ValidationResult};

use serde::{Deserialize, Serialize};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Contents of an `alphaplan.json` configuration file.
///
/// Every section is optional in the file; missing sections take their
/// defaults, and unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlphaplanConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub tools: ToolPaths,

    #[serde(default)]
    pub solver: SolverOptions,

    #[serde(default)]
    pub simulator: SimulatorOptions,

    #[serde(default)]
    pub evaluator: EvaluatorOptions,
}

fn default_schema_version() -> String {
    CONFIG_SCHEMA_VERSION.to_string()
}

impl Default for AlphaplanConfig {
    fn default() -> Self {
        AlphaplanConfig {
            schema_version: default_schema_version(),
            tools: ToolPaths::default(),
            solver: SolverOptions::default(),
            simulator: SimulatorOptions::default(),
            evaluator: EvaluatorOptions::default(),
        }
    }
}
