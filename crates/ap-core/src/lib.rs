//! alphaplan core library
//!
//! Host-side support for point-based POMDP solvers:
//! - Alpha-vector policies: parsing, evaluation and action selection
//! - A thread-safe policy handle with hot rebinding
//! - Belief tracking for discrete models
//! - Orchestration of the external solver, simulator and evaluator
//! - Configuration loading, logging and exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod belief;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod model;
pub mod policy;
pub mod solver;

pub use ap_common::{Error, Result};
pub use belief::{BeliefUpdater, DiscreteDynamics, DiscreteUpdater, DynamicsTables};
pub use model::Model;
pub use policy::{AlphaVector, AlphaVectorSet, PolicyHandle, PolicyInfo, Selection};
pub use solver::{CommandRunner, Orchestrator, SystemRunner, ToolOutput};
