//! External solver tools: command lines, process execution and the
//! orchestrator that ties them to a model.

mod invocation;
mod orchestrator;
mod runner;

pub use invocation::{render_options, Invocation, ToolKind};
pub use orchestrator::Orchestrator;
pub use runner::{CommandRunner, SystemRunner, ToolOutput};
