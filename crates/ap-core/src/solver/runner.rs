//! Process execution for the external tools.
//!
//! A [`CommandRunner`] turns an [`Invocation`] into a finished process and
//! its captured output. It does not interpret the exit status; mapping that
//! onto the error taxonomy is the orchestrator's job. The default
//! [`SystemRunner`] blocks until the child exits and enforces no timeout of
//! its own (the solver's `--timeout` bounds solving time).

use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::trace;

use super::invocation::Invocation;

/// Output from a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Program that was executed.
    pub command: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    pub stdout: Vec<u8>,

    pub stderr: Vec<u8>,

    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,

    /// Wall-clock duration.
    pub duration: Duration,
}

impl ToolOutput {
    /// Get stdout as string (lossy UTF-8 conversion).
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as string (lossy UTF-8 conversion).
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs tool invocations to completion.
///
/// An `Err` means the process could not be started at all.
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput>;
}

/// Runs tools as child processes of the current one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput> {
        let start = Instant::now();
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()?;
        let duration = start.elapsed();
        trace!(
            exit_code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "process exited"
        );

        Ok(ToolOutput {
            command: invocation.program_name(),
            args: invocation.display_args(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
            duration,
        })
    }
}
