//! Structured event vocabulary for logging.
//!
//! Every event is emitted with its name as the tracing target and a
//! `stage` field, so the JSONL layer can report both without parsing
//! messages.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Phases of an alphaplan invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Running the external solver.
    Solve,
    /// Running the external simulator.
    Simulate,
    /// Running the external evaluator.
    Evaluate,
    /// Parsing a policy file.
    Load,
    /// Answering action/value queries.
    Query,
    /// Belief maintenance.
    Update,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Solve => "solve",
            Stage::Simulate => "simulate",
            Stage::Evaluate => "evaluate",
            Stage::Load => "load",
            Stage::Query => "query",
            Stage::Update => "update",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Policy lifecycle
    pub const POLICY_LOADED: &str = "policy.loaded";
    pub const POLICY_COUNT_MISMATCH: &str = "policy.count_mismatch";
    pub const POLICY_REBOUND: &str = "policy.rebound";
    pub const POLICY_REBIND_FAILED: &str = "policy.rebind_failed";

    // Queries
    pub const QUERY_ANSWERED: &str = "query.answered";

    // External tools
    pub const TOOL_STARTED: &str = "tool.started";
    pub const TOOL_FINISHED: &str = "tool.finished";
    pub const TOOL_FAILED: &str = "tool.failed";

    // Belief maintenance
    pub const BELIEF_UPDATED: &str = "belief.updated";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}
