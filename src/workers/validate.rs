//! Snapshot existence and metadata check.

use super::WorkerContext;
use crate::cloud::parse_snapshot_metadata;
use crate::command::ExecutionMode;
use crate::error::ManagerError;
use crate::outcome::{ItemReport, WorkOutcome};
use crate::resource::{SnapshotId, UNKNOWN_GROUP};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Metadata of one queried snapshot. Fields are empty when it does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDetails {
    pub id: String,
    pub exists: bool,
    pub name: Option<String>,
    pub resource_group: Option<String>,
    pub time_created: Option<String>,
    pub size_gb: Option<u64>,
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub malformed: bool,
}

impl SnapshotDetails {
    pub fn missing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Short display name: the queried name, else the last path segment.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.id.rsplit('/').next().unwrap_or(&self.id))
    }

    /// Outcome of this check, attributed to `group`. Malformed ids always fall
    /// under the unknown group.
    pub fn report(&self, group: impl Into<String>) -> ItemReport {
        let name = self.display_name().to_string();
        if self.malformed {
            return ItemReport::new(
                UNKNOWN_GROUP,
                WorkOutcome::InvalidFormat {
                    name: self.id.clone(),
                    error: self.error.clone().unwrap_or_default(),
                },
            );
        }
        let outcome = if self.exists {
            WorkOutcome::Valid { name }
        } else if let Some(error) = &self.error {
            WorkOutcome::Error {
                name,
                error: error.clone(),
            }
        } else {
            WorkOutcome::NonExistent { name }
        };
        ItemReport::new(group, outcome)
    }
}

/// Query name, resource group, creation time, size and provisioning state of one
/// snapshot. A malformed id is not queried.
pub async fn validate_snapshot(
    ctx: &WorkerContext,
    raw: String,
) -> Result<SnapshotDetails, ManagerError> {
    let id = match SnapshotId::parse(&raw) {
        Ok(id) => id,
        Err(e) => {
            ctx.journal.error(&e.to_string());
            let mut details = SnapshotDetails::missing(raw).with_error("Invalid snapshot ID format");
            details.malformed = true;
            return Ok(details);
        }
    };

    let result = ctx
        .executor
        .execute(&ctx.cli.snapshot_details(&id), ExecutionMode::Once)
        .await?;
    if !result.is_success() || result.stdout.is_empty() {
        debug!(snapshot = %id, exit_code = result.exit_code, "snapshot not found");
        return Ok(SnapshotDetails::missing(raw));
    }

    match parse_snapshot_metadata(&result.stdout) {
        Ok(meta) => Ok(SnapshotDetails {
            id: raw,
            exists: true,
            name: Some(meta.name),
            resource_group: Some(meta.resource_group),
            time_created: meta.time_created,
            size_gb: meta.disk_size_gb,
            state: meta.provisioning_state,
            error: None,
            malformed: false,
        }),
        Err(e) => {
            ctx.journal
                .error(&format!("Failed to parse JSON for snapshot: {}", raw));
            Ok(SnapshotDetails::missing(raw).with_error(format!("Unreadable snapshot details: {}", e)))
        }
    }
}
