//! Integration tests for the snapshot deletion flow

use crate::integration::test_utils::{context, session, snapshot_id, FakeCloud};
use azsnap::command::CommandResult;
use azsnap::dispatch::Dispatcher;
use azsnap::error::ManagerError;
use azsnap::outcome::OutcomeTag;
use azsnap::pipeline::{run_deletion, AssumeYes, Confirmation, PipelineSettings, Session};
use azsnap::progress::ProgressCounter;
use azsnap::report::{deletion_json, export_csv};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const RG_A_LOCKS: &str =
    r#"[{"name": "keep", "level": "CanNotDelete"}, {"name": "ro", "level": "ReadOnly"}]"#;

struct Decline;

impl Confirmation for Decline {
    fn confirm(&self, _prompt: &str) -> Result<bool, ManagerError> {
        Ok(false)
    }
}

/// Three existing snapshots across two resource groups, one missing, one malformed.
fn batch() -> (Vec<String>, Vec<String>) {
    let existing = vec![
        snapshot_id("sub-1", "rg-a", "snap-1"),
        snapshot_id("sub-1", "rg-a", "snap-2"),
        snapshot_id("sub-2", "rg-b", "snap-3"),
    ];
    let mut ids = existing.clone();
    ids.insert(1, snapshot_id("sub-1", "rg-a", "gone"));
    ids.push("garbage".to_string());
    (ids, existing)
}

fn cloud_for(existing: &[String]) -> FakeCloud {
    let mut cloud = FakeCloud::new();
    for id in existing {
        cloud = cloud.on_flag(&["snapshot", "show"], "--ids", id, CommandResult::success("{}"));
    }
    cloud
        .on(&["snapshot", "show"], CommandResult::failure("ResourceNotFound", 3))
        .on_flag(&["lock", "list"], "--resource-group", "rg-a", CommandResult::success(RG_A_LOCKS))
        .on(&["lock", "list"], CommandResult::success("[]"))
        .on(&["lock", "delete"], CommandResult::success(""))
        .on(&["lock", "create"], CommandResult::success(""))
}

fn position(calls: &[Vec<String>], prefix: &[&str]) -> Vec<usize> {
    calls
        .iter()
        .enumerate()
        .filter(|(_, args)| prefix.iter().zip(args.iter()).all(|(p, a)| p == a))
        .map(|(i, _)| i)
        .collect()
}

#[tokio::test]
async fn test_only_confirmed_snapshots_are_deleted() {
    let temp = TempDir::new().unwrap();
    let (ids, existing) = batch();
    let cloud = Arc::new(cloud_for(&existing).on(&["snapshot", "delete"], CommandResult::success("")));
    let session = session(cloud.clone(), temp.path(), 4);
    let progress = ProgressCounter::new();

    let report = run_deletion(&session, ids, &AssumeYes, &progress).await.unwrap();

    assert_eq!(report.requested, 5);
    assert_eq!(report.confirmed, 3);
    assert_eq!(cloud.count(&["snapshot", "delete"]), 3);
    assert_eq!(report.aggregate.count(OutcomeTag::Deleted), 3);
    assert_eq!(report.aggregate.count(OutcomeTag::Valid), 3);
    assert_eq!(report.aggregate.count(OutcomeTag::NonExistent), 1);
    assert_eq!(report.aggregate.count(OutcomeTag::InvalidFormat), 1);
    assert!(!report.interrupted);

    // Only the delete-level lock on rg-a is lifted and put back.
    assert_eq!(report.scopes, 2);
    assert_eq!(report.removed_locks.len(), 1);
    assert_eq!(report.removed_locks[0].lock_name, "keep");
    assert_eq!(report.restore.restored.len(), 1);
    assert!(report.restore.attempted() <= report.removed_locks.len());

    // Every deletion happens inside the lock window.
    let calls = cloud.calls();
    let removals = position(&calls, &["lock", "delete"]);
    let deletions = position(&calls, &["snapshot", "delete"]);
    let restores = position(&calls, &["lock", "create"]);
    assert!(removals.iter().max() < deletions.iter().min());
    assert!(deletions.iter().max() < restores.iter().min());

    // Pre-validation plus deletion passes.
    assert_eq!(progress.total(), 8);
    assert_eq!(progress.completed(), 8);
}

#[tokio::test]
async fn test_large_batch_needs_confirmation() {
    let temp = TempDir::new().unwrap();
    let (ids, existing) = batch();
    let cloud = Arc::new(cloud_for(&existing));
    let settings = PipelineSettings {
        confirm_threshold: 2,
        ..PipelineSettings::default()
    };
    let session = Session::new(context(cloud.clone(), temp.path()), Dispatcher::new(2), settings);

    let result = run_deletion(&session, ids, &Decline, &ProgressCounter::new()).await;
    assert!(matches!(result, Err(ManagerError::Cancelled(_))));
    assert!(cloud.calls().is_empty());
}

#[tokio::test]
async fn test_nothing_to_delete_touches_no_locks() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(cloud_for(&[]));
    let session = session(cloud.clone(), temp.path(), 2);

    let ids = vec![snapshot_id("sub-1", "rg-a", "gone"), "garbage".to_string()];
    let report = run_deletion(&session, ids, &AssumeYes, &ProgressCounter::new())
        .await
        .unwrap();

    assert_eq!(report.confirmed, 0);
    assert_eq!(report.scopes, 0);
    assert_eq!(cloud.count(&["lock"]), 0);
    assert_eq!(cloud.count(&["snapshot", "delete"]), 0);
}

#[tokio::test]
async fn test_failed_deletion_keeps_cli_error() {
    let temp = TempDir::new().unwrap();
    let existing = vec![snapshot_id("sub-2", "rg-b", "snap-3")];
    let cloud = Arc::new(
        cloud_for(&existing).on(&["snapshot", "delete"], CommandResult::failure("Conflict: in use", 1)),
    );
    let session = session(cloud.clone(), temp.path(), 1);

    let report = run_deletion(&session, existing, &AssumeYes, &ProgressCounter::new())
        .await
        .unwrap();

    let failed = report.aggregate.get("sub-2").unwrap().get(OutcomeTag::Failed);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].detail.as_deref(), Some("Conflict: in use"));
    // Deletion runs once, never retried.
    assert_eq!(cloud.count(&["snapshot", "delete"]), 1);
}

#[tokio::test]
async fn test_interrupt_still_restores_locks() {
    let temp = TempDir::new().unwrap();
    let (_, existing) = batch();
    let cloud = Arc::new(cloud_for(&existing).on_slow(
        &["snapshot", "delete"],
        Duration::from_secs(30),
        CommandResult::success(""),
    ));
    let session = session(cloud.clone(), temp.path(), 3);
    let cancel = session.cancellation().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
    });

    let report = run_deletion(&session, existing, &AssumeYes, &ProgressCounter::new())
        .await
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.aggregate.count(OutcomeTag::Deleted), 0);
    assert_eq!(report.removed_locks.len(), 1);
    assert_eq!(report.restore.restored.len(), 1);
    assert_eq!(cloud.count(&["lock", "create"]), 1);
}

#[tokio::test]
async fn test_restore_failure_is_reported_per_lock() {
    let temp = TempDir::new().unwrap();
    let existing = vec![snapshot_id("sub-1", "rg-a", "snap-1")];
    let cloud = Arc::new(
        FakeCloud::new()
            .on(&["snapshot", "show"], CommandResult::success("{}"))
            .on(&["lock", "list"], CommandResult::success(RG_A_LOCKS))
            .on(&["lock", "delete"], CommandResult::success(""))
            .on(&["lock", "create"], CommandResult::failure("AuthorizationFailed", 1))
            .on(&["snapshot", "delete"], CommandResult::success("")),
    );
    let session = session(cloud.clone(), temp.path(), 1);

    let report = run_deletion(&session, existing, &AssumeYes, &ProgressCounter::new())
        .await
        .unwrap();

    assert_eq!(report.aggregate.count(OutcomeTag::Deleted), 1);
    assert!(report.restore.restored.is_empty());
    assert_eq!(report.restore.failures.len(), 1);
    assert_eq!(report.restore.failures[0].lock_name.as_deref(), Some("keep"));
    assert_eq!(report.restore.attempted(), report.removed_locks.len());
    // Restoration retries before giving up on a lock.
    assert_eq!(cloud.count(&["lock", "create"]), 3);
}

#[tokio::test]
async fn test_summary_and_csv_exports() {
    let temp = TempDir::new().unwrap();
    let (ids, existing) = batch();
    let cloud = Arc::new(cloud_for(&existing).on(&["snapshot", "delete"], CommandResult::success("")));
    let session = session(cloud, temp.path(), 4);
    let report = run_deletion(&session, ids, &AssumeYes, &ProgressCounter::new())
        .await
        .unwrap();

    let summary = deletion_json(&report);
    assert_eq!(summary["totals"]["deleted"], 3);
    assert_eq!(summary["totals"]["invalid"], 1);
    assert_eq!(summary["locks"]["removed"].as_array().unwrap().len(), 1);

    let path = temp.path().join("deletion_results.csv");
    let rows = export_csv(&path, &report.aggregate).unwrap();
    assert_eq!(rows, report.aggregate.total());
    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Subscription,Status,Snapshot,Error"));
    assert_eq!(lines.count(), rows);
    assert!(text.contains("Unknown,invalid,garbage,Invalid snapshot ID format"));
}
