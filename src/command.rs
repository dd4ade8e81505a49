//! Command execution domain: command specs, process runners, and the retrying executor.
//! Business workflows build `CommandSpec`s and choose an `ExecutionMode`; retry policy lives here only.

mod executor;
mod runner;
mod spec;

pub use executor::{CommandExecutor, ExecutionMode, RetryPolicy};
pub use runner::{CommandRunner, ProcessRunner};
pub use spec::{CommandResult, CommandSpec, Invocation};
