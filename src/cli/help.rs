//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::{Commands, ConfigCommands};

/// Command name string for logs (e.g. "delete", "config.show").
pub fn command_name(command: Option<&Commands>) -> String {
    match command {
        None | Some(Commands::Menu) => "menu".to_string(),
        Some(Commands::Create { .. }) => "create".to_string(),
        Some(Commands::Validate { .. }) => "validate".to_string(),
        Some(Commands::Delete { .. }) => "delete".to_string(),
        Some(Commands::Check) => "check".to_string(),
        Some(Commands::Config { command }) => format!("config.{}", config_command_name(command)),
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show => "show",
        ConfigCommands::Path => "path",
    }
}
