//! Model descriptor.
//!
//! The host never interprets the model file itself; it passes the path to the
//! external tools and keeps whatever extra knowledge the caller attached,
//! such as discrete dynamics for belief tracking.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::belief::DiscreteDynamics;

/// A solvable model, identified by its file.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    /// Display name; defaults to the file stem.
    pub name: String,
    /// Model file handed to the solver, simulator and evaluator.
    pub path: PathBuf,
    /// Declared number of hidden states, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<usize>,
    #[serde(skip)]
    dynamics: Option<Arc<DiscreteDynamics>>,
}

impl Model {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Model {
            name,
            path,
            states: None,
            dynamics: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_states(mut self, states: usize) -> Self {
        self.states = Some(states);
        self
    }

    /// Attach dynamics. Also records the state count they imply.
    pub fn with_dynamics(mut self, dynamics: DiscreteDynamics) -> Self {
        self.states = Some(dynamics.states());
        self.dynamics = Some(Arc::new(dynamics));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dynamics(&self) -> Option<&Arc<DiscreteDynamics>> {
        self.dynamics.as_ref()
    }
}
