//! Shared test utilities for integration tests
//!
//! `FakeCloud` stands in for the cloud CLI: rules match on leading arguments and,
//! optionally, a flag value; every invocation is recorded for later assertions.

use async_trait::async_trait;
use azsnap::cloud::AzCli;
use azsnap::command::{CommandExecutor, CommandResult, CommandRunner, CommandSpec, RetryPolicy};
use azsnap::dispatch::Dispatcher;
use azsnap::error::CommandError;
use azsnap::journal::RunJournal;
use azsnap::pipeline::{PipelineSettings, Session};
use azsnap::workers::WorkerContext;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const TIMESTAMP: &str = "20240501120000";

struct Rule {
    prefix: Vec<String>,
    flag: Option<(String, String)>,
    result: CommandResult,
    delay: Option<Duration>,
    times_out: bool,
}

impl Rule {
    fn matches(&self, spec: &CommandSpec) -> bool {
        let args = spec.args();
        let prefix_ok = args.len() >= self.prefix.len()
            && self.prefix.iter().zip(args).all(|(want, got)| want == got);
        let flag_ok = match &self.flag {
            Some((flag, value)) => spec.flag_value(flag) == Some(value.as_str()),
            None => true,
        };
        prefix_ok && flag_ok
    }
}

#[derive(Default)]
pub struct FakeCloud {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix`. Earlier rules win.
    pub fn on(mut self, prefix: &[&str], result: CommandResult) -> Self {
        self.rules.push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            flag: None,
            result,
            delay: None,
            times_out: false,
        });
        self
    }

    /// Answer commands starting with `prefix` whose `flag` has `value`.
    pub fn on_flag(mut self, prefix: &[&str], flag: &str, value: &str, result: CommandResult) -> Self {
        self.rules.push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            flag: Some((flag.to_string(), value.to_string())),
            result,
            delay: None,
            times_out: false,
        });
        self
    }

    /// Like `on`, answering only after `delay`.
    pub fn on_slow(mut self, prefix: &[&str], delay: Duration, result: CommandResult) -> Self {
        self.rules.push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            flag: None,
            result,
            delay: Some(delay),
            times_out: false,
        });
        self
    }

    /// Commands starting with `prefix` whose `flag` has `value` never finish in time.
    pub fn on_flag_timeout(mut self, prefix: &[&str], flag: &str, value: &str) -> Self {
        self.rules.push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            flag: Some((flag.to_string(), value.to_string())),
            result: CommandResult::failure("timed out", -1),
            delay: None,
            times_out: true,
        });
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    /// Invocations whose arguments start with `prefix`.
    pub fn count(&self, prefix: &[&str]) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|args| args.len() >= prefix.len() && prefix.iter().zip(args.iter()).all(|(p, a)| p == a))
            .count()
    }
}

#[async_trait]
impl CommandRunner for FakeCloud {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        self.calls.lock().push(spec.args().to_vec());
        let matched = self
            .rules
            .iter()
            .find(|rule| rule.matches(spec))
            .map(|rule| (rule.result.clone(), rule.delay, rule.times_out));
        match matched {
            Some((_, _, true)) => Err(CommandError::Timeout {
                command: spec.to_string(),
                after: Duration::from_secs(1),
            }),
            Some((result, delay, false)) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(result)
            }
            None => Ok(CommandResult::failure(format!("unexpected command: {}", spec), 2)),
        }
    }
}

pub fn snapshot_id(sub: &str, rg: &str, name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/snapshots/{}",
        sub, rg, name
    )
}

pub fn vm_id(sub: &str, rg: &str, name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/virtualMachines/{}",
        sub, rg, name
    )
}

/// Worker context over `cloud` with retries that do not wait.
pub fn context(cloud: Arc<FakeCloud>, log_dir: &Path) -> WorkerContext {
    let journal = Arc::new(RunJournal::open(log_dir, TIMESTAMP).unwrap());
    let executor = CommandExecutor::new(cloud, RetryPolicy::new(3, Duration::ZERO))
        .with_journal(Arc::clone(&journal));
    WorkerContext::new(executor, AzCli::default(), journal)
}

pub fn session(cloud: Arc<FakeCloud>, log_dir: &Path, workers: usize) -> Session {
    Session::new(
        context(cloud, log_dir),
        Dispatcher::new(workers),
        PipelineSettings::default(),
    )
}

/// Serializes tests that touch process environment variables.
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with `XDG_CONFIG_HOME` pointed into `test_dir` and the given variables
/// set, restoring the previous environment afterwards.
pub fn with_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let mut names: Vec<&str> = vars.iter().map(|(name, _)| *name).collect();
    names.push("XDG_CONFIG_HOME");
    let saved: Vec<(&str, Option<String>)> = names
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().join("xdg"));
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }
    result
}
