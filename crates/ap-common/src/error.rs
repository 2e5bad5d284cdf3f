//! Error types for alphaplan.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//! - Suggested actions for agents
//!
//! # Human-Facing Output
//!
//! Errors can be formatted for human consumption with headline, reason, and fix:
//! ```text
//! ✗ Belief Dimension Mismatch
//!   Reason: belief has 3 entries but the policy's alpha vectors have 2
//!   Fix: Pass one probability per hidden state of the solved model.
//! ```
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 20,
//!   "category": "query",
//!   "message": "belief has 3 entries but the policy's alpha vectors have 2",
//!   "recoverable": true,
//!   "suggested_action": "fix_input",
//!   "context": { "expected": 2, "actual": 3 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for alphaplan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Policy file loading errors.
    Policy,
    /// Action/value query errors.
    Query,
    /// External solver, simulator, or evaluator failures.
    Process,
    /// Belief maintenance errors.
    Belief,
    /// Configuration and option errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Policy => write!(f, "policy"),
            ErrorCategory::Query => write!(f, "query"),
            ErrorCategory::Process => write!(f, "process"),
            ErrorCategory::Belief => write!(f, "belief"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation unchanged.
    Retry,
    /// Re-run the solver to regenerate the policy file.
    Resolve,
    /// Correct the caller-supplied input (belief, observed state, options).
    FixInput,
    /// Run the configuration check command.
    RunCheck,
    /// Install or point to the external solver tools.
    InstallTool,
    /// Manual intervention required.
    ManualIntervention,
    /// Abort the operation.
    Abort,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::Resolve => write!(f, "resolve"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::InstallTool => write!(f, "install_tool"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
            SuggestedAction::Abort => write!(f, "abort"),
        }
    }
}

/// Unified error type for alphaplan.
#[derive(Error, Debug)]
pub enum Error {
    // Policy errors (10-19)
    #[error("malformed policy file {location}: {reason}")]
    Format { location: String, reason: String },

    #[error("policy has no alpha vectors; no action can be selected")]
    PolicyEmpty,

    // Query errors (20-29)
    #[error("belief has {actual} entries but the policy's alpha vectors have {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("no alpha vector for observable state {observed_state} (available: {available:?})")]
    Domain {
        observed_state: u32,
        available: Vec<u32>,
    },

    // Process errors (30-39)
    #[error("{tool} exited with code {code}")]
    SolverProcess { tool: String, code: i32 },

    #[error("{tool} was terminated by a signal")]
    SolverTerminated { tool: String },

    #[error("failed to start {tool}: {source}")]
    SolverSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    // Belief errors (40-49)
    #[error("no belief updater available: {0}")]
    UpdaterUnavailable(String),

    #[error("belief update failed: {0}")]
    BeliefUpdate(String),

    // Configuration errors (50-59)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid tool options: {0}")]
    InvalidOptions(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Format`] error.
    pub fn format(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Format {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Policy errors
    /// - 20-29: Query errors
    /// - 30-39: Process errors
    /// - 40-49: Belief errors
    /// - 50-59: Configuration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Format { .. } => 10,
            Error::PolicyEmpty => 11,
            Error::Dimension { .. } => 20,
            Error::Domain { .. } => 21,
            Error::SolverProcess { .. } => 30,
            Error::SolverTerminated { .. } => 31,
            Error::SolverSpawn { .. } => 32,
            Error::UpdaterUnavailable(_) => 40,
            Error::BeliefUpdate(_) => 41,
            Error::Config(_) => 50,
            Error::InvalidOptions(_) => 51,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Format { .. } | Error::PolicyEmpty => ErrorCategory::Policy,

            Error::Dimension { .. } | Error::Domain { .. } => ErrorCategory::Query,

            Error::SolverProcess { .. }
            | Error::SolverTerminated { .. }
            | Error::SolverSpawn { .. } => ErrorCategory::Process,

            Error::UpdaterUnavailable(_) | Error::BeliefUpdate(_) => ErrorCategory::Belief,

            Error::Config(_) | Error::InvalidOptions(_) => ErrorCategory::Config,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Policy: a new solve produces a new file
            Error::Format { .. } => true,
            Error::PolicyEmpty => false, // The solver produced it; choose a fallback

            // Query: caller can fix the input
            Error::Dimension { .. } => true,
            Error::Domain { .. } => false, // Safety-relevant, never default

            // Process: depends on cause
            Error::SolverProcess { .. } => true,
            Error::SolverTerminated { .. } => true,
            Error::SolverSpawn { .. } => true,

            Error::UpdaterUnavailable(_) => false,
            Error::BeliefUpdate(_) => true,

            Error::Config(_) => true,
            Error::InvalidOptions(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for agents.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Format { .. } => SuggestedAction::Resolve,
            Error::PolicyEmpty => SuggestedAction::ManualIntervention,

            Error::Dimension { .. } => SuggestedAction::FixInput,
            Error::Domain { .. } => SuggestedAction::Abort,

            Error::SolverProcess { .. } => SuggestedAction::Retry,
            Error::SolverTerminated { .. } => SuggestedAction::Retry,
            Error::SolverSpawn { .. } => SuggestedAction::InstallTool,

            Error::UpdaterUnavailable(_) => SuggestedAction::ManualIntervention,
            Error::BeliefUpdate(_) => SuggestedAction::FixInput,

            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidOptions(_) => SuggestedAction::FixInput,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Format { .. } => {
                "Re-run 'alphaplan solve' to regenerate the policy file, or check that the path points to solver output."
            }
            Error::PolicyEmpty => {
                "The solver produced no alpha vectors. Choose a fallback action explicitly or re-solve with different options."
            }

            Error::Dimension { .. } => {
                "Pass one probability per hidden state of the solved model."
            }
            Error::Domain { .. } => {
                "Check the observed-state index against the values listed by 'alphaplan inspect'."
            }

            Error::SolverProcess { .. } => {
                "Inspect the tool's stderr and the partial output file, then retry with adjusted options."
            }
            Error::SolverTerminated { .. } => {
                "The tool was killed before finishing. Treat its output file as invalid and retry."
            }
            Error::SolverSpawn { .. } => {
                "Install the solver tools or set their paths in the config file or ALPHAPLAN_SOLVER / ALPHAPLAN_SIMULATOR / ALPHAPLAN_EVALUATOR."
            }

            Error::UpdaterUnavailable(_) => {
                "Attach discrete dynamics to the model before requesting a belief updater."
            }
            Error::BeliefUpdate(_) => {
                "Check that the action and observation indices are valid and the observation is possible under the belief."
            }

            Error::Config(_) => {
                "Run 'alphaplan config validate' to check the configuration file."
            }
            Error::InvalidOptions(_) => {
                "Correct the option value; see 'alphaplan solve --help' for accepted ranges."
            }

            Error::Io(_) => {
                "Check that the file exists, is readable, and that the directory is writable. Retry the operation."
            }
            Error::Json(_) => {
                "Invalid JSON in file. Check syntax with 'jq . <file>' or restore from backup."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Format { .. } => "Malformed Policy File",
            Error::PolicyEmpty => "Empty Policy",

            Error::Dimension { .. } => "Belief Dimension Mismatch",
            Error::Domain { .. } => "Unknown Observable State",

            Error::SolverProcess { .. } => "Solver Process Failed",
            Error::SolverTerminated { .. } => "Solver Process Terminated",
            Error::SolverSpawn { .. } => "Solver Not Started",

            Error::UpdaterUnavailable(_) => "Belief Updater Unavailable",
            Error::BeliefUpdate(_) => "Belief Update Failed",

            Error::Config(_) => "Configuration Error",
            Error::InvalidOptions(_) => "Invalid Tool Options",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
///
/// Used by machine-readable output modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for agents.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., exit code, dimensions).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::Format { location, .. } => {
                context.insert("location".to_string(), serde_json::json!(location));
            }
            Error::Dimension { expected, actual } => {
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::Domain {
                observed_state,
                available,
            } => {
                context.insert("observed_state".to_string(), serde_json::json!(observed_state));
                context.insert("available".to_string(), serde_json::json!(available));
            }
            Error::SolverProcess { tool, code } => {
                context.insert("tool".to_string(), serde_json::json!(tool));
                context.insert("exit_code".to_string(), serde_json::json!(code));
            }
            Error::SolverTerminated { tool } | Error::SolverSpawn { tool, .. } => {
                context.insert("tool".to_string(), serde_json::json!(tool));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
