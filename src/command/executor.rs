//! Command executor: single-shot and retrying execution over a `CommandRunner`.
//! Every invocation and failed attempt is journaled for postmortem.

use crate::command::runner::CommandRunner;
use crate::command::spec::{CommandResult, CommandSpec};
use crate::error::CommandError;
use crate::journal::RunJournal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How a workflow wants a command executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run once. Non-zero exits come back as results; a command that cannot start is an error.
    Once,
    /// Run up to `RetryPolicy::max_attempts` times with a fixed delay, returning the first success
    /// or the last failure.
    Retrying,
}

/// Fixed attempt-count / fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

/// Executes command specs through a runner according to an `ExecutionMode`.
#[derive(Clone)]
pub struct CommandExecutor {
    runner: Arc<dyn CommandRunner>,
    retry: RetryPolicy,
    journal: Option<Arc<RunJournal>>,
}

impl CommandExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, retry: RetryPolicy) -> Self {
        Self {
            runner,
            retry,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Arc<RunJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn execute(
        &self,
        spec: &CommandSpec,
        mode: ExecutionMode,
    ) -> Result<CommandResult, CommandError> {
        match mode {
            ExecutionMode::Once => self.run_once(spec).await,
            ExecutionMode::Retrying => self.run_with_retry(spec).await,
        }
    }

    async fn run_once(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        self.note(&format!("Running: {}", spec));
        debug!(command = %spec, "running command");
        let outcome = self.runner.run(spec).await;
        self.record_failure(spec, 1, &outcome);
        outcome
    }

    async fn run_with_retry(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            self.note(&format!("Running (attempt {}/{}): {}", attempt, attempts, spec));
            debug!(command = %spec, attempt, attempts, "running command");
            let outcome = self.runner.run(spec).await;
            if matches!(&outcome, Ok(result) if result.is_success()) {
                return outcome;
            }
            self.record_failure(spec, attempt, &outcome);
            if attempt >= attempts {
                return outcome;
            }
            self.note(&format!("Retrying in {} seconds...", self.retry.delay.as_secs()));
            tokio::time::sleep(self.retry.delay).await;
            attempt += 1;
        }
    }

    fn record_failure(
        &self,
        spec: &CommandSpec,
        attempt: u32,
        outcome: &Result<CommandResult, CommandError>,
    ) {
        match outcome {
            Ok(result) if result.is_success() => {}
            Ok(result) => {
                warn!(
                    command = %spec,
                    attempt,
                    exit_code = result.exit_code,
                    stderr = %result.stderr,
                    "command failed"
                );
                self.note(&format!("Command failed (attempt {}): {}", attempt, spec));
                self.note(&format!("Error: {}", result.error_text()));
            }
            Err(err) => {
                warn!(command = %spec, attempt, error = %err, "command could not be run");
                self.note(&format!("Command could not be run (attempt {}): {}", attempt, spec));
                self.note(&format!("Error: {}", err));
            }
        }
    }

    fn note(&self, message: &str) {
        if let Some(journal) = &self.journal {
            journal.note(message);
        }
    }
}
