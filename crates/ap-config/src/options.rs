//! Typed options for the external solver, simulator and evaluator.
//!
//! Each field maps to exactly one command-line option of the external tool.
//! Unset fields are omitted from the command line entirely, so the tool's own
//! default applies. Flag fields are presence-only: `true` renders a bare
//! `--flag`, `false` renders nothing.
//!
//! | Field                      | Flag                         | Meaning |
//! |----------------------------|------------------------------|---------|
//! | `fast`                     | `--fast`                     | Use the solver's fast (less memory-safe) data structures. |
//! | `randomization`            | `--randomization`            | Randomize the sampling of belief points. |
//! | `precision`                | `--precision <f>`            | Target gap between upper and lower value bounds at the initial belief. |
//! | `timeout`                  | `--timeout <s>`              | Wall-clock limit for solving, in seconds. |
//! | `memory`                   | `--memory <MB>`              | Memory limit for solving, in megabytes. |
//! | `trial_improvement_factor` | `--trial-improvement-factor <f>` | Trial termination threshold as a fraction of the gap. |
//! | `policy_interval`          | `--policy-interval <s>`      | Write intermediate policies every `s` seconds. |
//! | `srand`                    | `--srand <n>`                | Random seed for simulation/evaluation. |
//! | `sim_len`                  | `--simLen <n>`               | Steps per simulated trajectory. |
//! | `sim_num`                  | `--simNum <n>`               | Number of simulated trajectories. |
//! | `output_file`              | `--output-file <path>`       | Where the simulator/evaluator writes its results. |

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;

/// Rendered value of a single command-line option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Presence-only flag (`--fast`).
    Flag,
    /// Option followed by one argument (`--precision 0.01`).
    Value(OsString),
}

impl OptionValue {
    fn display<T: std::fmt::Display>(value: T) -> Self {
        OptionValue::Value(OsString::from(value.to_string()))
    }
}

/// Tuning options for the solver (`pomdpsol`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SolverOptions {
    #[serde(skip_serializing_if = "is_false")]
    pub fast: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub randomization: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,

    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,

    /// Megabytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_improvement_factor: Option<f64>,

    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_interval: Option<f64>,
}

impl SolverOptions {
    /// Options that are set, as `(flag name, value)` pairs in table order.
    pub fn entries(&self) -> Vec<(&'static str, OptionValue)> {
        let mut out = Vec::new();
        if self.fast {
            out.push(("fast", OptionValue::Flag));
        }
        if self.randomization {
            out.push(("randomization", OptionValue::Flag));
        }
        if let Some(v) = self.precision {
            out.push(("precision", OptionValue::display(v)));
        }
        if let Some(v) = self.timeout {
            out.push(("timeout", OptionValue::display(v)));
        }
        if let Some(v) = self.memory {
            out.push(("memory", OptionValue::display(v)));
        }
        if let Some(v) = self.trial_improvement_factor {
            out.push(("trial-improvement-factor", OptionValue::display(v)));
        }
        if let Some(v) = self.policy_interval {
            out.push(("policy-interval", OptionValue::display(v)));
        }
        out
    }

    /// Layer `overrides` on top of `self`.
    ///
    /// Set values in `overrides` win; flags are OR-ed, since a flag can only
    /// be switched on.
    pub fn merge(&self, overrides: &SolverOptions) -> SolverOptions {
        SolverOptions {
            fast: self.fast || overrides.fast,
            randomization: self.randomization || overrides.randomization,
            precision: overrides.precision.or(self.precision),
            timeout: overrides.timeout.or(self.timeout),
            memory: overrides.memory.or(self.memory),
            trial_improvement_factor: overrides
                .trial_improvement_factor
                .or(self.trial_improvement_factor),
            policy_interval: overrides.policy_interval.or(self.policy_interval),
        }
    }

    /// Whether no option is set.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Options shared by the simulator (`pomdpsim`) and evaluator (`pomdpeval`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyRunOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srand: Option<i64>,

    #[serde(rename = "simLen", skip_serializing_if = "Option::is_none")]
    pub sim_len: Option<u32>,

    #[serde(rename = "simNum", skip_serializing_if = "Option::is_none")]
    pub sim_num: Option<u32>,

    #[serde(rename = "output-file", skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
}

/// Simulator options.
pub type SimulatorOptions = PolicyRunOptions;

/// Evaluator options.
pub type EvaluatorOptions = PolicyRunOptions;

impl PolicyRunOptions {
    /// Options that are set, as `(flag name, value)` pairs in table order.
    pub fn entries(&self) -> Vec<(&'static str, OptionValue)> {
        let mut out = Vec::new();
        if let Some(v) = self.srand {
            out.push(("srand", OptionValue::display(v)));
        }
        if let Some(v) = self.sim_len {
            out.push(("simLen", OptionValue::display(v)));
        }
        if let Some(v) = self.sim_num {
            out.push(("simNum", OptionValue::display(v)));
        }
        if let Some(path) = &self.output_file {
            out.push(("output-file", OptionValue::Value(path.clone().into_os_string())));
        }
        out
    }

    /// Layer `overrides` on top of `self`; set values in `overrides` win.
    pub fn merge(&self, overrides: &PolicyRunOptions) -> PolicyRunOptions {
        PolicyRunOptions {
            srand: overrides.srand.or(self.srand),
            sim_len: overrides.sim_len.or(self.sim_len),
            sim_num: overrides.sim_num.or(self.sim_num),
            output_file: overrides
                .output_file
                .clone()
                .or_else(|| self.output_file.clone()),
        }
    }

    /// Whether no option is set.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}
