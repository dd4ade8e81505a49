use super::{collect_reports, fault_report, Confirmation, Session};
use crate::aggregate::Aggregate;
use crate::error::ManagerError;
use crate::locks::{scopes_for, LockFailure, LockGuard, LockRecord, RestoreReport};
use crate::outcome::OutcomeTag;
use crate::progress::ProgressSink;
use crate::resource::SnapshotId;
use crate::workers::{delete_snapshot, preflight_snapshot, Preflight};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Summary columns of a deletion run.
pub const DELETION_COLUMNS: [OutcomeTag; 6] = [
    OutcomeTag::Valid,
    OutcomeTag::NonExistent,
    OutcomeTag::Deleted,
    OutcomeTag::Failed,
    OutcomeTag::InvalidFormat,
    OutcomeTag::Error,
];

/// Tags listed in the per-subscription breakdown.
pub const DELETION_PROBLEMS: [OutcomeTag; 4] = [
    OutcomeTag::NonExistent,
    OutcomeTag::Failed,
    OutcomeTag::InvalidFormat,
    OutcomeTag::Error,
];

#[derive(Debug, Clone)]
pub struct DeletionReport {
    pub requested: usize,
    /// Snapshots confirmed to exist by pre-validation.
    pub confirmed: usize,
    /// Pre-validation merged with deletion outcomes.
    pub aggregate: Aggregate,
    pub scopes: usize,
    pub removed_locks: Vec<LockRecord>,
    pub lock_failures: Vec<LockFailure>,
    pub restore: RestoreReport,
    /// The deletion phase was interrupted; locks were still restored.
    pub interrupted: bool,
    pub runtime: Duration,
}

/// Delete a batch of snapshots.
///
/// Batches above the confirmation threshold need operator confirmation. Every id is
/// pre-validated; only snapshots confirmed to exist are deleted, with delete locks on
/// their resource groups lifted for the duration and restored afterwards.
pub async fn run_deletion(
    session: &Session,
    ids: Vec<String>,
    confirm: &dyn Confirmation,
    progress: &dyn ProgressSink,
) -> Result<DeletionReport, ManagerError> {
    let started = Instant::now();
    let requested = ids.len();
    let threshold = session.settings().confirm_threshold;
    if requested > threshold {
        let prompt = format!(
            "You are about to delete {} snapshots. Are you sure you want to continue?",
            requested
        );
        if !confirm.confirm(&prompt)? {
            return Err(ManagerError::Cancelled(format!(
                "deletion of {} snapshots was not confirmed",
                requested
            )));
        }
    }

    let shared = session.shared_context();
    let prevalidation = session.dispatcher().dispatch(
        "Pre-validating snapshots",
        ids,
        {
            let shared = Arc::clone(&shared);
            move |raw: String| {
                let ctx = Arc::clone(&shared);
                async move { preflight_snapshot(&ctx, raw).await }
            }
        },
        progress,
    );
    let completed = tokio::select! {
        biased;
        _ = session.cancellation().cancelled() => return Err(ManagerError::Interrupted),
        completed = prevalidation => completed,
    };

    let ctx = session.context();
    let mut confirmed: Vec<SnapshotId> = Vec::new();
    let mut preflight_reports = Vec::with_capacity(completed.len());
    for c in completed {
        match c.result {
            Ok(Preflight { report, confirmed: id }) => {
                confirmed.extend(id);
                preflight_reports.push(report);
            }
            Err(fault) => preflight_reports.push(fault_report(ctx, &c.item, fault.message)),
        }
    }
    let prevalidated = Aggregate::fold(preflight_reports);
    info!(
        requested,
        confirmed = confirmed.len(),
        "pre-validation finished"
    );

    if confirmed.is_empty() {
        info!("no existing snapshots to delete");
        return Ok(DeletionReport {
            requested,
            confirmed: 0,
            aggregate: prevalidated,
            scopes: 0,
            removed_locks: Vec::new(),
            lock_failures: Vec::new(),
            restore: RestoreReport::default(),
            interrupted: false,
            runtime: started.elapsed(),
        });
    }

    let scopes = scopes_for(&confirmed);
    let confirmed_count = confirmed.len();
    let guard = LockGuard::new(ctx, session.settings().lock_level.clone());
    let deletion = session.dispatcher().dispatch(
        "Deleting snapshots",
        confirmed,
        move |id: SnapshotId| {
            let ctx = Arc::clone(&shared);
            async move { delete_snapshot(&ctx, id).await }
        },
        progress,
    );
    let protected = guard
        .protect(&scopes, session.cancellation(), deletion)
        .await;

    let interrupted = protected.interrupted();
    let deleted = protected
        .phase
        .map(|completed| Aggregate::fold(collect_reports(ctx, completed)))
        .unwrap_or_default();
    if interrupted {
        warn!(
            restored = protected.restore.restored.len(),
            "deletion interrupted after lock restoration"
        );
    }

    Ok(DeletionReport {
        requested,
        confirmed: confirmed_count,
        aggregate: prevalidated.merge(deleted),
        scopes: scopes.len(),
        removed_locks: protected.removed,
        lock_failures: protected.removal_failures,
        restore: protected.restore,
        interrupted,
        runtime: started.elapsed(),
    })
}
