//! Locations of the external solver, simulator and evaluator binaries.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the solver binary.
pub const ENV_SOLVER: &str = "ALPHAPLAN_SOLVER";
/// Environment variable overriding the simulator binary.
pub const ENV_SIMULATOR: &str = "ALPHAPLAN_SIMULATOR";
/// Environment variable overriding the evaluator binary.
pub const ENV_EVALUATOR: &str = "ALPHAPLAN_EVALUATOR";

/// Default solver binary name, looked up on `PATH` by the OS.
pub const DEFAULT_SOLVER: &str = "pomdpsol";
/// Default simulator binary name.
pub const DEFAULT_SIMULATOR: &str = "pomdpsim";
/// Default evaluator binary name.
pub const DEFAULT_EVALUATOR: &str = "pomdpeval";

/// Paths to the three external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolPaths {
    pub solver: PathBuf,
    pub simulator: PathBuf,
    pub evaluator: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            solver: PathBuf::from(DEFAULT_SOLVER),
            simulator: PathBuf::from(DEFAULT_SIMULATOR),
            evaluator: PathBuf::from(DEFAULT_EVALUATOR),
        }
    }
}

impl ToolPaths {
    /// Apply `ALPHAPLAN_SOLVER` / `ALPHAPLAN_SIMULATOR` / `ALPHAPLAN_EVALUATOR`.
    ///
    /// Empty variables are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var_os(key))
    }

    /// Apply overrides from an arbitrary lookup (used by tests to avoid
    /// mutating the process environment).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        let pick = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        if let Some(p) = pick(ENV_SOLVER) {
            self.solver = p;
        }
        if let Some(p) = pick(ENV_SIMULATOR) {
            self.simulator = p;
        }
        if let Some(p) = pick(ENV_EVALUATOR) {
            self.evaluator = p;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsString;

    #[test]
    fn defaults_are_sarsop_binaries() {
        let tools = ToolPaths::default();
        assert_eq!(tools.solver, PathBuf::from("pomdpsol"));
        assert_eq!(tools.simulator, PathBuf::from("pomdpsim"));
        assert_eq!(tools.evaluator, PathBuf::from("pomdpeval"));
    }

    #[test]
    fn overrides_replace_only_set_values() {
        let env: HashMap<&str, OsString> = [
            (ENV_SOLVER, OsString::from("/opt/sarsop/bin/pomdpsol")),
            (ENV_EVALUATOR, OsString::new()),
        ]
        .into_iter()
        .collect();
        let tools = ToolPaths::default().with_overrides(|k| env.get(k).cloned());
        assert_eq!(tools.solver, PathBuf::from("/opt/sarsop/bin/pomdpsol"));
        assert_eq!(tools.simulator, PathBuf::from("pomdpsim"));
        assert_eq!(tools.evaluator, PathBuf::from("pomdpeval"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let tools: ToolPaths = serde_json::from_str(r#"{"simulator": "./sim"}"#).unwrap();
        assert_eq!(tools.simulator, PathBuf::from("./sim"));
        assert_eq!(tools.solver, PathBuf::from("pomdpsol"));
    }
}
