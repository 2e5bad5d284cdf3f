//! alphaplan common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - The error taxonomy with stable codes and remediation hints
//! - Output format specifications and the payload schema version

pub mod error;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use output::{OutputFormat, SCHEMA_VERSION};
