//! Logging System
//!
//! Structured diagnostic logging using the `tracing` crate, with configurable level,
//! format and destination. Operator-facing run artifacts (detail and error logs) are
//! written separately by the journal.

use crate::error::ManagerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// File name of the diagnostic log inside the log directory.
pub const LOG_FILE_NAME: &str = "azsnap.log";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, both (file and stderr)
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path; defaults to `<log_dir>/azsnap.log`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, terminal destinations only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "file".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Log file for a configuration: the explicit file, else `<log_dir>/azsnap.log`.
pub fn resolve_log_file_path(config: &LoggingConfig, log_dir: &Path) -> PathBuf {
    config
        .file
        .clone()
        .unwrap_or_else(|| log_dir.join(LOG_FILE_NAME))
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. CLI arguments (applied to the config by the caller)
/// 2. Environment variables (AZSNAP_LOG, AZSNAP_LOG_MODULES)
/// 3. Configuration file
/// 4. Defaults
pub fn init_logging(config: &LoggingConfig, log_dir: &Path) -> Result<(), ManagerError> {
    let filter = build_env_filter(config)?;
    let json = parse_format(&config.format)?;
    let output = parse_output_destinations(&config.output)?;

    let writer = match output {
        OutputDestination::Stdout => BoxMakeWriter::new(std::io::stdout),
        OutputDestination::Stderr => BoxMakeWriter::new(std::io::stderr),
        OutputDestination::File => BoxMakeWriter::new(Mutex::new(open_log_file(config, log_dir)?)),
        OutputDestination::Both => {
            BoxMakeWriter::new(Mutex::new(open_log_file(config, log_dir)?).and(std::io::stderr))
        }
    };
    let ansi = config.color && !json && matches!(output, OutputDestination::Stdout | OutputDestination::Stderr);

    let base_subscriber = Registry::default().with(filter);
    let installed = if json {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init()
    };
    installed.map_err(|e| ManagerError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn open_log_file(config: &LoggingConfig, log_dir: &Path) -> Result<std::fs::File, ManagerError> {
    let log_file = resolve_log_file_path(config, log_dir);
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ManagerError::ConfigError(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| {
            ManagerError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e))
        })
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ManagerError> {
    if let Ok(filter) = EnvFilter::try_from_env("AZSNAP_LOG") {
        return Ok(filter);
    }

    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, module_level) in &config.modules {
        filter = filter.add_directive(parse_directive(module, module_level)?);
    }

    if let Ok(modules_str) = std::env::var("AZSNAP_LOG_MODULES") {
        for module_spec in modules_str.split(',') {
            if let Some((module, level)) = module_spec.split_once('=') {
                filter = filter.add_directive(parse_directive(module.trim(), level.trim())?);
            }
        }
    }

    Ok(filter)
}

fn parse_directive(
    module: &str,
    level: &str,
) -> Result<tracing_subscriber::filter::Directive, ManagerError> {
    format!("{}={}", module, level)
        .parse()
        .map_err(|e| ManagerError::ConfigError(format!("Invalid log directive: {}", e)))
}

/// `true` for json, `false` for text.
fn parse_format(format: &str) -> Result<bool, ManagerError> {
    match format {
        "json" => Ok(true),
        "text" => Ok(false),
        other => Err(ManagerError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputDestination {
    Stdout,
    Stderr,
    File,
    Both,
}

fn parse_output_destinations(output: &str) -> Result<OutputDestination, ManagerError> {
    match output {
        "stdout" => Ok(OutputDestination::Stdout),
        "stderr" => Ok(OutputDestination::Stderr),
        "file" => Ok(OutputDestination::File),
        "both" => Ok(OutputDestination::Both),
        _ => Err(ManagerError::ConfigError(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr', 'file', or 'both')",
            output
        ))),
    }
}
