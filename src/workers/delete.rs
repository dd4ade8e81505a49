//! Deletion pre-validation and deletion of one snapshot.

use super::WorkerContext;
use crate::command::ExecutionMode;
use crate::error::ManagerError;
use crate::outcome::{ItemReport, WorkOutcome};
use crate::resource::{SnapshotId, UNKNOWN_GROUP};
use tracing::{debug, info, warn};

/// Pre-validation result. `confirmed` is set only for snapshots that exist.
#[derive(Debug, Clone)]
pub struct Preflight {
    pub report: ItemReport,
    pub confirmed: Option<SnapshotId>,
}

/// Resolve the subscription group of `raw` and check that the snapshot exists.
pub async fn preflight_snapshot(ctx: &WorkerContext, raw: String) -> Result<Preflight, ManagerError> {
    let id = match SnapshotId::parse(&raw) {
        Ok(id) => id,
        Err(e) => {
            ctx.journal.error(&e.to_string());
            return Ok(Preflight {
                report: ItemReport::new(
                    UNKNOWN_GROUP,
                    WorkOutcome::InvalidFormat {
                        name: raw,
                        error: "Invalid snapshot ID format".to_string(),
                    },
                ),
                confirmed: None,
            });
        }
    };

    let group = ctx.subscriptions.display_name(id.subscription_id());
    let name = id.name().to_string();
    let result = ctx
        .executor
        .execute(&ctx.cli.snapshot_show(&id), ExecutionMode::Once)
        .await?;

    if result.is_success() {
        debug!(snapshot = %id, "snapshot exists");
        Ok(Preflight {
            report: ItemReport::new(group, WorkOutcome::Valid { name }),
            confirmed: Some(id),
        })
    } else {
        debug!(snapshot = %id, exit_code = result.exit_code, "snapshot does not exist");
        Ok(Preflight {
            report: ItemReport::new(group, WorkOutcome::NonExistent { name }),
            confirmed: None,
        })
    }
}

/// Delete one confirmed snapshot.
pub async fn delete_snapshot(ctx: &WorkerContext, id: SnapshotId) -> Result<ItemReport, ManagerError> {
    let group = ctx.subscriptions.display_name(id.subscription_id());
    let name = id.name().to_string();
    let result = ctx
        .executor
        .execute(&ctx.cli.snapshot_delete(&id), ExecutionMode::Once)
        .await?;

    if result.is_success() {
        info!(snapshot = %id, subscription = %group, "snapshot deleted");
        ctx.journal.note(&format!("Deleted snapshot: {}", id));
        Ok(ItemReport::new(group, WorkOutcome::Deleted { name }))
    } else {
        let error = if result.stderr.is_empty() {
            "Deletion failed".to_string()
        } else {
            result.stderr
        };
        warn!(snapshot = %id, subscription = %group, error = %error, "snapshot deletion failed");
        ctx.journal
            .error(&format!("Failed to delete snapshot {}: {}", id, error));
        Ok(ItemReport::new(group, WorkOutcome::Failed { name, error }))
    }
}
