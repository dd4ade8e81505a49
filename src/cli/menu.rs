//! Interactive menu: prompts that turn operator choices into commands.

use crate::cli::parse::Commands;
use crate::error::ManagerError;
use crate::pipeline::Confirmation;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Create,
    Validate,
    Delete,
    Check,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 5] = [
        MenuAction::Create,
        MenuAction::Validate,
        MenuAction::Delete,
        MenuAction::Check,
        MenuAction::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Create => "Create snapshots",
            MenuAction::Validate => "Validate snapshots",
            MenuAction::Delete => "Delete snapshots",
            MenuAction::Check => "Check environment",
            MenuAction::Exit => "Exit",
        }
    }
}

pub fn select_action() -> Result<MenuAction, ManagerError> {
    let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
    let index = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(MenuAction::ALL.get(index).copied().unwrap_or(MenuAction::Exit))
}

/// Ask for what an action needs. `None` for `Exit`.
pub fn prompt_command(
    action: MenuAction,
    default_vm_list: &str,
    default_snapshot_list: &str,
    default_csv: &str,
) -> Result<Option<Commands>, ManagerError> {
    let command = match action {
        MenuAction::Create => Commands::Create {
            ticket: Some(prompt_ticket()?),
            vm_list: Some(prompt_path("VM list file", default_vm_list)?),
        },
        MenuAction::Validate => Commands::Validate {
            input: Some(prompt_path("Snapshot id file", default_snapshot_list)?),
            save: Confirm::new()
                .with_prompt("Save results as JSON?")
                .default(false)
                .interact()?,
            format: "text".to_string(),
            max_workers: None,
        },
        MenuAction::Delete => {
            let input = prompt_path("Snapshot id file to delete", default_snapshot_list)?;
            let export = Confirm::new()
                .with_prompt("Export results to CSV?")
                .default(false)
                .interact()?;
            let export_csv = if export {
                Some(prompt_path("CSV file", default_csv)?)
            } else {
                None
            };
            Commands::Delete {
                input: Some(input),
                yes: false,
                export_csv,
                max_workers: None,
            }
        }
        MenuAction::Check => Commands::Check,
        MenuAction::Exit => return Ok(None),
    };
    Ok(Some(command))
}

pub fn prompt_ticket() -> Result<String, ManagerError> {
    let ticket: String = Input::new()
        .with_prompt("Change ticket")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() || input.contains(char::is_whitespace) {
                Err("ticket must be a single non-empty word")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(ticket.trim().to_string())
}

pub fn prompt_path(prompt: &str, default: &str) -> Result<PathBuf, ManagerError> {
    let path: String = Input::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}

/// Yes/no confirmation on the terminal.
pub struct PromptConfirmation;

impl Confirmation for PromptConfirmation {
    fn confirm(&self, prompt: &str) -> Result<bool, ManagerError> {
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }
}
