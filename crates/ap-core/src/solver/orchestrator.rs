//! Drives the solver, simulator and evaluator for a model.

use ap_common::{Error, Result};
use ap_config::validate::{validate_run_options, validate_solver_options};
use ap_config::{EvaluatorOptions, SimulatorOptions, SolverOptions, ToolPaths};
use std::path::Path;
use tracing::{error, info, info_span};

use super::invocation::{Invocation, ToolKind};
use super::runner::{CommandRunner, SystemRunner, ToolOutput};
use crate::logging::event_names;
use crate::model::Model;
use crate::policy::PolicyHandle;

/// Runs the external tools, one blocking process per call.
///
/// Output files are written by the tools themselves and left in place
/// whether or not the run succeeds.
#[derive(Debug)]
pub struct Orchestrator<R = SystemRunner> {
    tools: ToolPaths,
    runner: R,
}

impl Orchestrator<SystemRunner> {
    /// Orchestrator that spawns real child processes.
    pub fn system(tools: ToolPaths) -> Self {
        Self::new(tools, SystemRunner)
    }
}

impl<R: CommandRunner> Orchestrator<R> {
    pub fn new(tools: ToolPaths, runner: R) -> Self {
        Orchestrator { tools, runner }
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Solve `model`, writing the policy to `policy`.
    pub fn solve(&self, model: &Model, policy: &Path, options: &SolverOptions) -> Result<ToolOutput> {
        validate_solver_options(options).map_err(|e| Error::InvalidOptions(e.to_string()))?;
        self.run(&Invocation::solve(&self.tools, model.path(), policy, options))
    }

    /// Simulate `policy` on `model`.
    pub fn simulate(
        &self,
        model: &Model,
        policy: &Path,
        options: &SimulatorOptions,
    ) -> Result<ToolOutput> {
        validate_run_options("simulator", options)
            .map_err(|e| Error::InvalidOptions(e.to_string()))?;
        self.run(&Invocation::simulate(&self.tools, model.path(), policy, options))
    }

    /// Evaluate `policy` on `model`.
    pub fn evaluate(
        &self,
        model: &Model,
        policy: &Path,
        options: &EvaluatorOptions,
    ) -> Result<ToolOutput> {
        validate_run_options("evaluator", options)
            .map_err(|e| Error::InvalidOptions(e.to_string()))?;
        self.run(&Invocation::evaluate(&self.tools, model.path(), policy, options))
    }

    /// Solve, then load the written policy into a handle bound to `model`.
    pub fn solve_and_load(
        &self,
        model: Model,
        policy: &Path,
        options: &SolverOptions,
    ) -> Result<(PolicyHandle, ToolOutput)> {
        let output = self.solve(&model, policy, options)?;
        let handle = PolicyHandle::load(model, policy)?;
        Ok((handle, output))
    }

    /// Execute one invocation and map its exit status onto [`Error`].
    pub fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let tool = invocation.tool;
        let span = info_span!("tool", tool = %tool, stage = %tool.stage());
        let _guard = span.enter();

        let program = invocation.program_name();
        info!(
            target: event_names::TOOL_STARTED,
            program = %program,
            args = ?invocation.display_args(),
            "starting {}",
            tool
        );

        let output = match self.runner.run(invocation) {
            Ok(output) => output,
            Err(source) => {
                error!(
                    target: event_names::TOOL_FAILED,
                    program = %program,
                    error = %source,
                    "failed to start {}",
                    tool
                );
                return Err(Error::SolverSpawn {
                    tool: program,
                    source,
                });
            }
        };

        let duration_ms = output.duration.as_millis() as u64;
        match output.exit_code {
            Some(0) => {
                info!(
                    target: event_names::TOOL_FINISHED,
                    program = %program,
                    duration_ms,
                    "{} finished",
                    tool
                );
                Ok(output)
            }
            Some(code) => {
                error!(
                    target: event_names::TOOL_FAILED,
                    program = %program,
                    exit_code = code,
                    duration_ms,
                    stderr = %output.stderr_str().trim_end(),
                    "{} exited with non-zero status",
                    tool
                );
                Err(Error::SolverProcess {
                    tool: program,
                    code,
                })
            }
            None => {
                error!(
                    target: event_names::TOOL_FAILED,
                    program = %program,
                    duration_ms,
                    "{} terminated by signal",
                    tool
                );
                Err(Error::SolverTerminated { tool: program })
            }
        }
    }
}
