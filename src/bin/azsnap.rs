//! azsnap CLI Binary
//!
//! Command-line entry point for the snapshot operator console.

use azsnap::cli::{map_error, Cli, RunContext};
use azsnap::config::{ConfigLoader, ManagerConfig};
use azsnap::error::ManagerError;
use azsnap::logging::{init_logging, LoggingConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let loaded = load_config(&cli);
    let log_dir = resolve_log_dir(&cli, loaded.as_ref().ok());
    let logging_config = build_logging_config(&cli, loaded.as_ref().ok());

    if let Err(e) = init_logging(&logging_config, &log_dir) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("azsnap starting");

    let context = match loaded.and_then(|config| RunContext::with_config(cli.workspace.clone(), config)) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error initializing: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(cli.command.as_ref()) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<ManagerConfig, ManagerError> {
    let config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(&cli.workspace)?,
    };
    Ok(config)
}

fn resolve_log_dir(cli: &Cli, config: Option<&ManagerConfig>) -> PathBuf {
    let log_dir = config
        .map(|c| c.paths.log_dir.clone())
        .unwrap_or_else(|| PathBuf::from("logs"));
    if log_dir.is_absolute() {
        log_dir
    } else {
        cli.workspace.join(log_dir)
    }
}

/// Build logging configuration from CLI args and the loaded configuration.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: Option<&ManagerConfig>) -> LoggingConfig {
    let mut logging = config.map(|c| c.logging.clone()).unwrap_or_default();

    if cli.quiet {
        logging.level = "off".to_string();
    }
    if cli.verbose {
        logging.level = "debug".to_string();
        // An explicit --log-output value still takes precedence below.
        if logging.output == "file" {
            logging.output = "both".to_string();
        }
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        logging.file = Some(file.clone());
    }

    logging
}
