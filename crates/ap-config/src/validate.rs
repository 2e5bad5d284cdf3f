//! Configuration validation errors and semantic validation.

use crate::options::{PolicyRunOptions, SolverOptions};
use crate::AlphaplanConfig;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a whole configuration file.
pub fn validate_config(config: &AlphaplanConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_solver_options(&config.solver)?;
    validate_run_options("simulator", &config.simulator)?;
    validate_run_options("evaluator", &config.evaluator)?;

    Ok(())
}

/// Validate solver options.
///
/// Every numeric option must be finite and strictly positive.
pub fn validate_solver_options(opts: &SolverOptions) -> ValidationResult<()> {
    check_positive("solver.precision", opts.precision)?;
    check_positive("solver.timeout", opts.timeout)?;
    check_positive("solver.memory", opts.memory)?;
    check_positive(
        "solver.trial-improvement-factor",
        opts.trial_improvement_factor,
    )?;
    check_positive("solver.policy-interval", opts.policy_interval)?;
    Ok(())
}

/// Validate simulator or evaluator options.
pub fn validate_run_options(section: &str, opts: &PolicyRunOptions) -> ValidationResult<()> {
    if opts.sim_len == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: format!("{}.simLen", section),
            message: "Must be at least 1".to_string(),
        });
    }
    if opts.sim_num == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: format!("{}.simNum", section),
            message: "Must be at least 1".to_string(),
        });
    }
    if let Some(path) = &opts.output_file {
        if path.as_os_str().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.output-file", section),
                message: "Must not be empty".to_string(),
            });
        }
    }
    Ok(())
}

fn check_positive(field: &str, value: Option<f64>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be a positive finite number, got {}", v),
        }),
        _ => Ok(()),
    }
}
