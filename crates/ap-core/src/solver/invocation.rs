//! Command lines for the external solver tools.
//!
//! Arguments are built as an explicit `OsString` vector and handed to the OS
//! directly. Nothing passes through a shell, so paths with spaces or shell
//! metacharacters reach the tool unchanged.

use ap_config::{OptionValue, PolicyRunOptions, SolverOptions, ToolPaths};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::logging::Stage;

/// Which external tool an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Solver,
    Simulator,
    Evaluator,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Solver => "solver",
            ToolKind::Simulator => "simulator",
            ToolKind::Evaluator => "evaluator",
        }
    }

    /// Flag that introduces the policy path.
    ///
    /// The solver writes the policy; the other two read it.
    pub fn policy_flag(&self) -> &'static str {
        match self {
            ToolKind::Solver => "--output",
            ToolKind::Simulator | ToolKind::Evaluator => "--policy-file",
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            ToolKind::Solver => Stage::Solve,
            ToolKind::Simulator => Stage::Simulate,
            ToolKind::Evaluator => Stage::Evaluate,
        }
    }

    /// Configured binary for this tool.
    pub fn binary<'a>(&self, tools: &'a ToolPaths) -> &'a Path {
        match self {
            ToolKind::Solver => &tools.solver,
            ToolKind::Simulator => &tools.simulator,
            ToolKind::Evaluator => &tools.evaluator,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully rendered tool command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub tool: ToolKind,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// `<solver> <model> --output <policy> [options...]`
    pub fn solve(tools: &ToolPaths, model: &Path, policy: &Path, options: &SolverOptions) -> Self {
        Self::build(ToolKind::Solver, tools, model, policy, options.entries())
    }

    /// `<simulator> <model> --policy-file <policy> [options...]`
    pub fn simulate(
        tools: &ToolPaths,
        model: &Path,
        policy: &Path,
        options: &PolicyRunOptions,
    ) -> Self {
        Self::build(ToolKind::Simulator, tools, model, policy, options.entries())
    }

    /// `<evaluator> <model> --policy-file <policy> [options...]`
    pub fn evaluate(
        tools: &ToolPaths,
        model: &Path,
        policy: &Path,
        options: &PolicyRunOptions,
    ) -> Self {
        Self::build(ToolKind::Evaluator, tools, model, policy, options.entries())
    }

    fn build(
        tool: ToolKind,
        tools: &ToolPaths,
        model: &Path,
        policy: &Path,
        entries: Vec<(&'static str, OptionValue)>,
    ) -> Self {
        let mut args = vec![
            model.as_os_str().to_os_string(),
            OsString::from(tool.policy_flag()),
            policy.as_os_str().to_os_string(),
        ];
        args.extend(render_options(entries));
        Invocation {
            tool,
            program: tool.binary(tools).to_path_buf(),
            args,
        }
    }

    /// Name used in errors and logs: the program as configured.
    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Arguments rendered lossily, for logs and [`ToolOutput`](super::ToolOutput).
    pub fn display_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Render option entries as `--key` or `--key value`, in the given order.
pub fn render_options(entries: Vec<(&'static str, OptionValue)>) -> Vec<OsString> {
    let mut out = Vec::with_capacity(entries.len() * 2);
    for (key, value) in entries {
        out.push(OsString::from(format!("--{}", key)));
        if let OptionValue::Value(v) = value {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<&str> {
        args.iter().map(|a| a.to_str().unwrap()).collect()
    }

    #[test]
    fn solve_command_line() {
        let options = SolverOptions {
            fast: true,
            precision: Some(0.01),
            ..Default::default()
        };
        let inv = Invocation::solve(
            &ToolPaths::default(),
            Path::new("tiger.pomdp"),
            Path::new("out.policy"),
            &options,
        );
        assert_eq!(inv.program, PathBuf::from("pomdpsol"));
        assert_eq!(
            strings(&inv.args),
            vec!["tiger.pomdp", "--output", "out.policy", "--fast", "--precision", "0.01"]
        );
    }

    #[test]
    fn default_options_add_nothing() {
        let inv = Invocation::solve(
            &ToolPaths::default(),
            Path::new("m.pomdp"),
            Path::new("p.policy"),
            &SolverOptions::default(),
        );
        assert_eq!(inv.args.len(), 3);
    }

    #[test]
    fn simulate_and_evaluate_use_policy_file() {
        let options = PolicyRunOptions {
            srand: Some(-3),
            sim_len: Some(100),
            sim_num: Some(5),
            output_file: Some(PathBuf::from("sim out.txt")),
        };
        let tools = ToolPaths::default();
        let sim = Invocation::simulate(&tools, Path::new("m.pomdp"), Path::new("p"), &options);
        assert_eq!(sim.program, PathBuf::from("pomdpsim"));
        assert_eq!(
            strings(&sim.args),
            vec![
                "m.pomdp",
                "--policy-file",
                "p",
                "--srand",
                "-3",
                "--simLen",
                "100",
                "--simNum",
                "5",
                "--output-file",
                "sim out.txt"
            ]
        );

        let eval = Invocation::evaluate(
            &tools,
            Path::new("m.pomdp"),
            Path::new("p"),
            &PolicyRunOptions::default(),
        );
        assert_eq!(eval.tool, ToolKind::Evaluator);
        assert_eq!(eval.program, PathBuf::from("pomdpeval"));
        assert_eq!(strings(&eval.args), vec!["m.pomdp", "--policy-file", "p"]);
    }

    #[test]
    fn paths_are_passed_verbatim() {
        let inv = Invocation::solve(
            &ToolPaths::default(),
            Path::new("a model; rm -rf.pomdp"),
            Path::new("$(out).policy"),
            &SolverOptions::default(),
        );
        assert_eq!(strings(&inv.args)[0], "a model; rm -rf.pomdp");
        assert_eq!(strings(&inv.args)[2], "$(out).policy");
    }
}
