//! Integration tests for scope lock removal and restoration

use crate::integration::test_utils::{context, FakeCloud};
use azsnap::command::CommandResult;
use azsnap::locks::LockGuard;
use azsnap::resource::ScopeKey;
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn scopes() -> BTreeSet<ScopeKey> {
    [ScopeKey::new("sub-1", "rg-a"), ScopeKey::new("sub-1", "rg-b")]
        .into_iter()
        .collect()
}

#[tokio::test]
async fn test_listing_failure_does_not_stop_other_scopes() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(
        FakeCloud::new()
            .on_flag(&["lock", "list"], "--resource-group", "rg-a", CommandResult::failure("Forbidden", 1))
            .on(
                &["lock", "list"],
                CommandResult::success(r#"[{"name": "keep", "level": "CanNotDelete"}]"#),
            )
            .on(&["lock", "delete"], CommandResult::success(""))
            .on(&["lock", "create"], CommandResult::success("")),
    );
    let ctx = context(cloud.clone(), temp.path());
    let guard = LockGuard::new(&ctx, "CanNotDelete");

    let removed = guard.remove(&scopes(), &CancellationToken::new()).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed.records()[0].resource_group, "rg-b");
    assert_eq!(removed.failures().len(), 1);
    assert_eq!(removed.failures()[0].scope, ScopeKey::new("sub-1", "rg-a"));
    assert!(removed.failures()[0].lock_name.is_none());

    let restored = guard.restore(removed).await;
    assert_eq!(restored.restored.len(), 1);
    assert_eq!(cloud.count(&["lock", "create"]), 1);
}

#[tokio::test]
async fn test_protect_runs_phase_between_removal_and_restore() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(
        FakeCloud::new()
            .on(
                &["lock", "list"],
                CommandResult::success(r#"[{"name": "keep", "level": "CanNotDelete"}]"#),
            )
            .on(&["lock", "delete"], CommandResult::success(""))
            .on(&["lock", "create"], CommandResult::success("")),
    );
    let ctx = context(cloud.clone(), temp.path());
    let guard = LockGuard::new(&ctx, "CanNotDelete");

    let observed = {
        let cloud = Arc::clone(&cloud);
        async move { (cloud.count(&["lock", "delete"]), cloud.count(&["lock", "create"])) }
    };
    let protected = guard.protect(&scopes(), &CancellationToken::new(), observed).await;

    assert_eq!(protected.phase, Some((2, 0)));
    assert_eq!(protected.removed.len(), 2);
    assert_eq!(protected.restore.restored.len(), 2);
    assert!(!protected.interrupted());
}

#[tokio::test]
async fn test_cancelled_before_removal_skips_everything() {
    let temp = TempDir::new().unwrap();
    let cloud = Arc::new(FakeCloud::new());
    let ctx = context(cloud.clone(), temp.path());
    let guard = LockGuard::new(&ctx, "CanNotDelete");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let protected = guard.protect(&scopes(), &cancel, async { 1 }).await;
    assert!(protected.interrupted());
    assert!(protected.removed.is_empty());
    assert_eq!(protected.restore.attempted(), 0);
    assert!(cloud.calls().is_empty());
}
