//! Process runners: the single seam between the console and the operating system.

use crate::command::spec::{CommandResult, CommandSpec, Invocation};
use crate::error::CommandError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

/// Runs one command once and captures its output.
///
/// Returns `Err` only when the command could not be run to completion
/// (spawn failure, timeout). Non-zero exits are `Ok` with `exit_code` set.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError>;
}

/// Runner backed by `tokio::process`, with an optional wall-clock ceiling per run.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn build(spec: &CommandSpec) -> Command {
        let mut cmd = match &spec.invocation {
            Invocation::Argv { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            Invocation::Shell(line) => shell_command(line),
        };
        cmd.stdin(std::process::Stdio::null()).kill_on_drop(true);
        cmd
    }
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        let mut cmd = Self::build(spec);
        let output = cmd.output();
        let output = match self.timeout {
            Some(after) => match tokio::time::timeout(after, output).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(CommandError::Timeout {
                        command: spec.to_string(),
                        after,
                    })
                }
            },
            None => output.await,
        }
        .map_err(|source| CommandError::Spawn {
            command: spec.to_string(),
            source,
        })?;

        Ok(CommandResult::new(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
            output.status.code().unwrap_or(-1),
        ))
    }
}
