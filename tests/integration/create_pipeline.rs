//! Integration tests for the snapshot creation flow

use crate::integration::test_utils::{session, vm_id, FakeCloud, TIMESTAMP};
use azsnap::command::CommandResult;
use azsnap::outcome::{OutcomeTag, WorkOutcome};
use azsnap::pipeline::run_creation;
use azsnap::progress::ProgressCounter;
use azsnap::report::{creation_summary_text, write_creation_summary};
use std::sync::Arc;
use tempfile::TempDir;

const CREATED: &str = r#"{"id": "/subscriptions/sub-1/resourceGroups/rg-a/providers/Microsoft.Compute/snapshots/RH_CHG1_vmA_20240501120000", "name": "RH_CHG1_vmA_20240501120000"}"#;

fn healthy_cloud() -> FakeCloud {
    FakeCloud::new()
        .on(&["account", "show"], CommandResult::success(r#"{"id": "sub-1"}"#))
        .on_flag(
            &["vm", "show"],
            "--query",
            "storageProfile.osDisk.managedDisk.id",
            CommandResult::success("/subscriptions/sub-1/resourceGroups/rg-a/providers/Microsoft.Compute/disks/vmA_os"),
        )
        .on_flag(&["vm", "show"], "--query", "resourceGroup", CommandResult::success("rg-a"))
        .on(&["snapshot", "create"], CommandResult::success(CREATED))
}

#[tokio::test]
async fn test_one_good_line_and_one_bad_line() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(healthy_cloud());
    let session = session(cloud.clone(), temp.path(), 4);
    let progress = ProgressCounter::new();

    let lines = vec![
        format!("{} vmA", vm_id("sub-1", "rg-a", "vmA")),
        "bad-line".to_string(),
    ];
    let report = run_creation(&session, lines, "CHG1", &progress).await;

    assert_eq!(report.total(), 2);
    assert_eq!(report.aggregate.total(), 2);
    assert_eq!(report.aggregate.count(OutcomeTag::Created), 1);
    assert_eq!(report.aggregate.count(OutcomeTag::InvalidFormat), 1);
    assert_eq!(
        report.successes(),
        vec![("vmA", "RH_CHG1_vmA_20240501120000")]
    );
    assert_eq!(report.failures(), vec![("bad-line", "Invalid line format")]);
    assert_eq!(progress.completed(), 2);
    assert!(!report.interrupted());

    // The created snapshot id lands in the running list.
    let list = std::fs::read_to_string(temp.path().join("snap_rid_list.txt")).unwrap();
    assert!(list.contains("snapshots/RH_CHG1_vmA_20240501120000"));

    // The ticket heads the detail log.
    let log = std::fs::read_to_string(session.context().journal.artifacts().detail_log()).unwrap();
    assert!(log.starts_with("Ticket: CHG1"));
}

#[tokio::test]
async fn test_every_command_names_its_subscription() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(healthy_cloud());
    let session = session(cloud.clone(), temp.path(), 1);

    let lines = vec![format!("{} vmA", vm_id("sub-1", "rg-a", "vmA"))];
    run_creation(&session, lines, "CHG1", &ProgressCounter::new()).await;

    let calls = cloud.calls();
    assert_eq!(calls.len(), 4);
    for args in calls {
        let at = args.iter().position(|a| a == "--subscription").unwrap();
        assert_eq!(args[at + 1], "sub-1");
        assert!(!args.iter().any(|a| a == "set"), "no active-context switch: {:?}", args);
    }
}

#[tokio::test]
async fn test_stage_failure_names_the_stage() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(
        FakeCloud::new()
            .on(&["account", "show"], CommandResult::success("{}"))
            .on_flag(
                &["vm", "show"],
                "--query",
                "storageProfile.osDisk.managedDisk.id",
                CommandResult::failure("ResourceNotFound", 3),
            ),
    );
    let session = session(cloud.clone(), temp.path(), 1);

    let lines = vec![format!("{} vmB", vm_id("sub-1", "rg-a", "vmB"))];
    let report = run_creation(&session, lines, "CHG2", &ProgressCounter::new()).await;

    assert_eq!(report.failures(), vec![("vmB", "Failed to get disk ID")]);
    // Retrying mode: three attempts at the failing stage, nothing after it.
    assert_eq!(cloud.count(&["vm", "show"]), 3);
    assert_eq!(cloud.count(&["snapshot", "create"]), 0);
}

#[tokio::test]
async fn test_stage_that_times_out_fails_with_stage_name() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(
        FakeCloud::new()
            .on(&["account", "show"], CommandResult::success("{}"))
            .on_flag_timeout(&["vm", "show"], "--query", "storageProfile.osDisk.managedDisk.id"),
    );
    let session = session(cloud.clone(), temp.path(), 1);

    let lines = vec![format!("{} vmA", vm_id("sub-1", "rg-a", "vmA"))];
    let report = run_creation(&session, lines, "CHG4", &ProgressCounter::new()).await;

    assert!(matches!(
        &report.reports[0].outcome,
        WorkOutcome::Failed { name, error } if name == "vmA" && error == "Failed to get disk ID"
    ));
    assert_eq!(report.reports[0].group, "sub-1");
    assert_eq!(cloud.count(&["vm", "show"]), 3);
    assert_eq!(cloud.count(&["snapshot", "create"]), 0);
    assert!(creation_summary_text(&report).contains("- vmA: Failed to get disk ID"));
}

#[tokio::test]
async fn test_unreadable_create_response_still_counts_as_created() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(
        FakeCloud::new()
            .on(&["snapshot", "create"], CommandResult::success("not json"))
            .on(&["account", "show"], CommandResult::success("{}"))
            .on_flag(&["vm", "show"], "--query", "resourceGroup", CommandResult::success("rg-a"))
            .on(&["vm", "show"], CommandResult::success("/disk/os")),
    );
    let session = session(cloud, temp.path(), 1);

    let lines = vec![format!("{} vmC", vm_id("sub-1", "rg-a", "vmC"))];
    let report = run_creation(&session, lines, "CHG3", &ProgressCounter::new()).await;

    assert!(matches!(
        report.reports[0].outcome,
        WorkOutcome::Created { .. }
    ));
    assert!(!temp.path().join("snap_rid_list.txt").exists());
}

#[tokio::test]
async fn test_cancelled_session_skips_remaining_lines() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(healthy_cloud());
    let session = session(cloud.clone(), temp.path(), 1);
    session.cancellation().cancel();

    let lines = vec![
        format!("{} vmA", vm_id("sub-1", "rg-a", "vmA")),
        format!("{} vmB", vm_id("sub-1", "rg-a", "vmB")),
    ];
    let report = run_creation(&session, lines, "CHG1", &ProgressCounter::new()).await;

    assert_eq!(report.total(), 0);
    assert_eq!(report.skipped, 2);
    assert!(report.interrupted());
    assert!(cloud.calls().is_empty());
}

#[tokio::test]
async fn test_summary_file_lists_successes_and_failures() {
    let temp = TempDir::new().unwrap();
    let session = session(Arc::new(healthy_cloud()), temp.path(), 1);
    let lines = vec![
        format!("{} vmA", vm_id("sub-1", "rg-a", "vmA")),
        "only-one-token".to_string(),
    ];
    let report = run_creation(&session, lines, "CHG1", &ProgressCounter::new()).await;

    let path = temp.path().join(format!("snapshot_summary_{}.txt", TIMESTAMP));
    write_creation_summary(&path, &report).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, creation_summary_text(&report));
    assert!(text.contains("- vmA: RH_CHG1_vmA_20240501120000"));
    assert!(text.contains("- only-one-token: Invalid line format"));
}
