//! CLI domain: parse, route, menu, help, output, and presentation only.
//! No flow orchestration; single route table dispatches to the pipeline.

mod help;
mod menu;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, config_command_name};
pub use menu::{MenuAction, PromptConfirmation};
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands};
pub use presentation::{
    format_creation_report, format_deletion_report, format_environment_report, format_runtime,
    format_section_heading, format_summary_table, format_validation_json, format_validation_text,
    tag_label, BarProgress,
};
pub use route::RunContext;
