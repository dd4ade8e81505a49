//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ManagerError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ManagerError) -> String {
    match e {
        ManagerError::InputNotFound(path) => format!(
            "Error: File '{}' not found. Check the path and try again.",
            path.display()
        ),
        ManagerError::Cancelled(reason) => format!("Operation cancelled: {}", reason),
        other => format!("Error: {}", other),
    }
}
