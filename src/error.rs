//! Error types for the snapshot operator console.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures to run an external command at all.
///
/// A command that runs and exits non-zero is not an error at this level; it is
/// reported through `CommandResult::exit_code`.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to start command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` did not finish within {after:?}")]
    Timeout { command: String, after: Duration },
}

/// Malformed resource identifiers and input lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Invalid resource ID format: {raw} ({found} segments, need at least {required})")]
    TooFewSegments {
        raw: String,
        found: usize,
        required: usize,
    },

    #[error("Invalid resource ID format: {raw} (empty {segment})")]
    EmptySegment { raw: String, segment: &'static str },

    #[error("Invalid line format: {line}")]
    InvalidVmLine { line: String },
}

/// Top-level errors surfaced to the operator.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not logged in to the cloud CLI: {0}. Run `az login` and try again.")]
    NotLoggedIn(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Operation interrupted; removed scope locks were restored before exiting")]
    Interrupted,

    #[error("Failed to get user input: {0}")]
    Prompt(String),
}

impl From<config::ConfigError> for ManagerError {
    fn from(err: config::ConfigError) -> Self {
        ManagerError::ConfigError(err.to_string())
    }
}

impl From<csv::Error> for ManagerError {
    fn from(err: csv::Error) -> Self {
        ManagerError::Csv(err.to_string())
    }
}

impl From<dialoguer::Error> for ManagerError {
    fn from(err: dialoguer::Error) -> Self {
        ManagerError::Prompt(err.to_string())
    }
}
