//! Configuration loading for alphaplan.
//!
//! This module handles:
//! - Locating `alphaplan.json` (CLI > env > XDG > system > defaults)
//! - Parsing it (shape/type checking via serde)
//! - Semantic validation (positive limits, schema version)
//! - Tool path overrides from the environment
//! - A snapshot of where the effective config came from

pub use ap_config::preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use ap_config::validate::ValidationError;
pub use ap_config::{AlphaplanConfig, ConfigSource, ResolvedPath, ToolPaths, CONFIG_SCHEMA_VERSION};

use ap_config::resolve::resolve_config;
use ap_config::validate::validate_config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::logging::{event_names, Stage};
use crate::policy::sha256_hex;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for ap_common::Error {
    fn from(err: ConfigError) -> Self {
        ap_common::Error::Config(err.to_string())
    }
}

/// Effective configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Parsed file contents, or defaults.
    pub config: AlphaplanConfig,
    /// Tool binaries after environment overrides.
    pub tools: ToolPaths,
    /// Path to the config file (None if using defaults).
    pub path: Option<PathBuf>,
    /// Where the path came from.
    pub source: ConfigSource,
    /// SHA-256 of the file content (None if using defaults).
    pub hash: Option<String>,
}

impl ResolvedConfig {
    /// Built-in defaults with no file behind them.
    pub fn defaults() -> Self {
        let config = AlphaplanConfig::default();
        ResolvedConfig {
            tools: config.tools.clone(),
            config,
            path: None,
            source: ConfigSource::BuiltinDefault,
            hash: None,
        }
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            path: self.path.clone(),
            source: self.source.to_string(),
            hash: self.hash.clone(),
            schema_version: self.config.schema_version.clone(),
            tools: self.tools.clone(),
        }
    }
}

/// Where the effective config came from, for `config show` and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub path: Option<PathBuf>,
    pub source: String,
    pub hash: Option<String>,
    pub schema_version: String,
    pub tools: ToolPaths,
}

/// Load configuration with the standard resolution order, then apply
/// `ALPHAPLAN_SOLVER` / `ALPHAPLAN_SIMULATOR` / `ALPHAPLAN_EVALUATOR`.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let mut resolved = load_resolved(&resolve_config(cli_path))?;
    resolved.tools = resolved.tools.with_env_overrides();
    Ok(resolved)
}

/// Load the file a resolution step settled on. No environment overrides.
pub fn load_resolved(resolved: &ResolvedPath) -> Result<ResolvedConfig, ConfigError> {
    let Some(path) = &resolved.path else {
        debug!(
            target: event_names::CONFIG_DEFAULT_USED,
            stage = %Stage::Init,
            "no config file found; using built-in defaults"
        );
        return Ok(ResolvedConfig::defaults());
    };

    let (config, hash) = load_config_file(path)?;
    info!(
        target: event_names::CONFIG_LOADED,
        stage = %Stage::Init,
        path = %path.display(),
        source = %resolved.source,
        hash = %hash,
        "config loaded"
    );
    Ok(ResolvedConfig {
        tools: config.tools.clone(),
        config,
        path: Some(path.clone()),
        source: resolved.source,
        hash: Some(hash),
    })
}

/// Parse and validate one config file.
pub fn load_config_file(path: &Path) -> Result<(AlphaplanConfig, String), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let hash = sha256_hex(&content);
    let config = parse_config(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate_config(&config)?;
    Ok((config, hash))
}

/// Shape-check config bytes without touching the filesystem.
pub fn parse_config(content: &[u8]) -> Result<AlphaplanConfig, serde_json::Error> {
    serde_json::from_slice(content)
}
