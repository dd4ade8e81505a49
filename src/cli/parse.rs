//! CLI parse: clap types for azsnap. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// azsnap - batch VM disk snapshot operator console
#[derive(Parser)]
#[command(name = "azsnap")]
#[command(about = "Create, validate and bulk-delete VM disk snapshots through the cloud CLI")]
pub struct Cli {
    /// Command to run; the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level, mirrored to stderr)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes a file)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create snapshots of the OS disks of the VMs in a list file
    Create {
        /// Change ticket embedded in snapshot names (prompted when omitted)
        #[arg(long)]
        ticket: Option<String>,
        /// VM list: one `<resource_id> <vm_name>` per line
        #[arg(long)]
        vm_list: Option<PathBuf>,
    },
    /// Check that snapshots exist and show their metadata
    Validate {
        /// Snapshot id list (defaults to the running list in the log directory)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Save results as JSON in the log directory
        #[arg(long)]
        save: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Worker pool width
        #[arg(long)]
        max_workers: Option<usize>,
    },
    /// Delete the snapshots in a list file, lifting delete locks for the duration
    Delete {
        /// Snapshot id list, one per line (prompted when omitted)
        input: Option<PathBuf>,
        /// Skip the large-batch confirmation
        #[arg(long, short = 'y')]
        yes: bool,
        /// Export per-snapshot results to this CSV file
        #[arg(long)]
        export_csv: Option<PathBuf>,
        /// Worker pool width
        #[arg(long)]
        max_workers: Option<usize>,
    },
    /// Check the cloud CLI installation and login
    Check,
    /// Interactive menu
    Menu,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the global configuration file path
    Path,
}
