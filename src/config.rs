//! Configuration System
//!
//! Layered configuration for the snapshot console: built-in defaults, a global file,
//! workspace files and `AZSNAP_*` environment variables, merged by `ConfigLoader`.
//! Command-line flags are applied on top by the CLI.

use crate::command::RetryPolicy;
use crate::logging::LoggingConfig;
use crate::pipeline::PipelineSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub cli: CliConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub deletion: DeletionConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External cloud CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_program")]
    pub program: String,
}

fn default_program() -> String {
    "az".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Attempts per command in retrying mode
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Wall-clock ceiling per attempt; 0 disables it
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_secs() -> u64 {
    RetryPolicy::DEFAULT_DELAY.as_secs()
}

fn default_command_timeout_secs() -> u64 {
    600
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl ExecutorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs))
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_max_workers() -> usize {
    crate::dispatch::Dispatcher::DEFAULT_MAX_WORKERS
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Leading segment of generated snapshot names
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "RH".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionConfig {
    /// Batches larger than this need confirmation
    #[serde(default = "default_confirm_threshold")]
    pub confirm_threshold: usize,

    /// Lock level lifted while deleting
    #[serde(default = "default_lock_level")]
    pub lock_level: String,
}

fn default_confirm_threshold() -> usize {
    100
}

fn default_lock_level() -> String {
    crate::cloud::DELETE_LOCK_LEVEL.to_string()
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            confirm_threshold: default_confirm_threshold(),
            lock_level: default_lock_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for run logs, summaries and the snapshot-id list
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Default VM list for creation
    #[serde(default = "default_vm_list")]
    pub vm_list: PathBuf,

    /// Running snapshot-id list, relative to `log_dir`
    #[serde(default = "default_snapshot_list")]
    pub snapshot_list: String,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_vm_list() -> PathBuf {
    PathBuf::from("snapshot_vmlist.txt")
}

fn default_snapshot_list() -> String {
    crate::journal::DEFAULT_SNAPSHOT_LIST.to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            vm_list: default_vm_list(),
            snapshot_list: default_snapshot_list(),
        }
    }
}

impl PathsConfig {
    pub fn snapshot_list_path(&self) -> PathBuf {
        self.log_dir.join(&self.snapshot_list)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Cli(String),
    Executor(String),
    Dispatch(String),
    Naming(String),
    Deletion(String),
    Paths(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cli(msg) => write!(f, "cli: {}", msg),
            ValidationError::Executor(msg) => write!(f, "executor: {}", msg),
            ValidationError::Dispatch(msg) => write!(f, "dispatch: {}", msg),
            ValidationError::Naming(msg) => write!(f, "naming: {}", msg),
            ValidationError::Deletion(msg) => write!(f, "deletion: {}", msg),
            ValidationError::Paths(msg) => write!(f, "paths: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ManagerConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.cli.program.trim().is_empty() {
            errors.push(ValidationError::Cli("program cannot be empty".to_string()));
        }
        if self.executor.max_attempts == 0 {
            errors.push(ValidationError::Executor(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.dispatch.max_workers == 0 {
            errors.push(ValidationError::Dispatch(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.naming.prefix.contains(char::is_whitespace) {
            errors.push(ValidationError::Naming(format!(
                "prefix '{}' cannot contain whitespace",
                self.naming.prefix
            )));
        }
        if self.deletion.lock_level.trim().is_empty() {
            errors.push(ValidationError::Deletion(
                "lock_level cannot be empty".to_string(),
            ));
        }
        if self.paths.log_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Paths("log_dir cannot be empty".to_string()));
        }
        if self.paths.snapshot_list.trim().is_empty() {
            errors.push(ValidationError::Paths(
                "snapshot_list cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            snapshot_prefix: self.naming.prefix.clone(),
            confirm_threshold: self.deletion.confirm_threshold,
            lock_level: self.deletion.lock_level.clone(),
        }
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
