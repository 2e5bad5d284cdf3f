//! Exit codes for the alphaplan CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use ap_common::{Error, ErrorCategory};

/// Exit codes for alphaplan operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments or tool options
    ArgsError = 10,

    /// Policy file unreadable, malformed or empty
    PolicyError = 11,

    /// Belief has the wrong length or names an unknown observed state
    QueryError = 12,

    /// Configuration file missing, malformed or invalid
    ConfigError = 13,

    /// External tool failed to start, failed, or was killed
    SolverError = 14,

    /// Belief update could not be performed
    BeliefError = 15,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    /// These can be resolved by user action.
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::PolicyError => "ERR_POLICY",
            ExitCode::QueryError => "ERR_QUERY",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::SolverError => "ERR_SOLVER",
            ExitCode::BeliefError => "ERR_BELIEF",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for a failed operation.
    pub fn from_error(err: &Error) -> ExitCode {
        match err {
            Error::InvalidOptions(_) => ExitCode::ArgsError,
            Error::Json(_) => ExitCode::InternalError,
            _ => match err.category() {
                ErrorCategory::Policy => ExitCode::PolicyError,
                ErrorCategory::Query => ExitCode::QueryError,
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Process => ExitCode::SolverError,
                ErrorCategory::Belief => ExitCode::BeliefError,
                ErrorCategory::Io => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
