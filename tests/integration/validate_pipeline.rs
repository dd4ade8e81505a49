//! Integration tests for the snapshot validation flow

use crate::integration::test_utils::{session, snapshot_id, FakeCloud};
use azsnap::command::CommandResult;
use azsnap::error::ManagerError;
use azsnap::outcome::OutcomeTag;
use azsnap::pipeline::run_validation;
use azsnap::progress::ProgressCounter;
use azsnap::report::write_validation_results;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const META: &str = r#"{"name": "snap-a", "resourceGroup": "rg-a", "timeCreated": "2024-05-01T12:00:00Z", "diskSizeGb": 128, "provisioningState": "Succeeded"}"#;
const SUBSCRIPTIONS: &str = r#"[{"id": "sub-1", "name": "Prod"}]"#;

#[tokio::test]
async fn test_details_follow_input_order_and_classify() {
    let temp = TempDir::new().unwrap();
    let a = snapshot_id("sub-1", "rg-a", "snap-a");
    let b = snapshot_id("sub-1", "rg-a", "snap-b");
    let cloud = Arc::new(
        FakeCloud::new()
            .on(&["account", "list"], CommandResult::success(SUBSCRIPTIONS))
            .on_flag(&["snapshot", "show"], "--ids", &a, CommandResult::success(META))
            .on(&["snapshot", "show"], CommandResult::failure("ResourceNotFound", 3)),
    );
    let mut session = session(cloud.clone(), temp.path(), 3);
    assert_eq!(session.load_subscriptions().await, 1);

    let progress = ProgressCounter::new();
    let ids = vec![b.clone(), "not-an-id".to_string(), a.clone()];
    let report = run_validation(&session, ids, &progress).await.unwrap();

    let order: Vec<&str> = report.details.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(order, vec![b.as_str(), "not-an-id", a.as_str()]);
    assert_eq!(report.total(), 3);
    assert_eq!(report.existing(), 1);
    assert_eq!(report.missing(), 2);

    let found = &report.details[2];
    assert_eq!(found.name.as_deref(), Some("snap-a"));
    assert_eq!(found.size_gb, Some(128));
    assert_eq!(found.state.as_deref(), Some("Succeeded"));

    let prod = report.aggregate.get("Prod").unwrap();
    assert_eq!(prod.count(OutcomeTag::Valid), 1);
    assert_eq!(prod.count(OutcomeTag::NonExistent), 1);
    let unknown = report.aggregate.get("Unknown").unwrap();
    assert_eq!(unknown.count(OutcomeTag::InvalidFormat), 1);

    // Malformed ids are never queried; each query runs once.
    assert_eq!(cloud.count(&["snapshot", "show"]), 2);
    assert_eq!(progress.completed(), 3);
}

#[tokio::test]
async fn test_truncated_id_is_grouped_as_unknown() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(
        FakeCloud::new().on(&["account", "list"], CommandResult::success(SUBSCRIPTIONS)),
    );
    let mut session = session(cloud.clone(), temp.path(), 2);
    session.load_subscriptions().await;

    let ids = vec!["/subscriptions/sub-1/resourceGroups/rg-a".to_string()];
    let report = run_validation(&session, ids, &ProgressCounter::new())
        .await
        .unwrap();

    let unknown = report.aggregate.get("Unknown").unwrap();
    assert_eq!(unknown.count(OutcomeTag::InvalidFormat), 1);
    assert!(report.aggregate.get("Prod").is_none());
    assert!(report.aggregate.get("sub-1").is_none());
    assert_eq!(cloud.count(&["snapshot", "show"]), 0);
}

#[tokio::test]
async fn test_results_file_is_json() {
    let temp = TempDir::new().unwrap();
    let a = snapshot_id("sub-1", "rg-a", "snap-a");
    let cloud = Arc::new(FakeCloud::new().on(&["snapshot", "show"], CommandResult::success(META)));
    let session = session(cloud, temp.path(), 2);
    let report = run_validation(&session, vec![a], &ProgressCounter::new())
        .await
        .unwrap();

    let path = temp.path().join("results.json");
    write_validation_results(&path, &report).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["total"], 1);
    assert_eq!(value["existing"], 1);
    assert_eq!(value["snapshots"][0]["exists"], true);
    assert_eq!(value["snapshots"][0]["resource_group"], "rg-a");
}

#[tokio::test]
async fn test_cancellation_interrupts_validation() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(FakeCloud::new().on_slow(
        &["snapshot", "show"],
        Duration::from_secs(30),
        CommandResult::success(META),
    ));
    let session = session(cloud, temp.path(), 2);
    let cancel = session.cancellation().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let ids = vec![
        snapshot_id("sub-1", "rg-a", "snap-a"),
        snapshot_id("sub-1", "rg-a", "snap-b"),
    ];
    let progress = ProgressCounter::new();
    let result = run_validation(&session, ids, &progress).await;
    assert!(matches!(result, Err(ManagerError::Interrupted)));
    // The unfinished pass is abandoned rather than left drawn.
    assert_eq!(progress.abandoned(), 1);
}
