//! Lock Guard
//!
//! Lifts delete-blocking scope locks around a destructive phase and restores them
//! afterwards. Lifecycle: scan and remove, run the protected phase, restore.
//!
//! A `LockRecord` exists only for a lock whose removal was confirmed, and restoration
//! consumes the records, so each removed lock is re-created at most once. Restoration
//! runs whether the protected phase finished, failed, or was interrupted.

use crate::cloud::parse_locks;
use crate::command::ExecutionMode;
use crate::resource::{ScopeKey, SnapshotId};
use crate::workers::WorkerContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Distinct (subscription, resource group) pairs of confirmed snapshots.
pub fn scopes_for<'a, I>(ids: I) -> BTreeSet<ScopeKey>
where
    I: IntoIterator<Item = &'a SnapshotId>,
{
    ids.into_iter().map(|id| id.scope().clone()).collect()
}

/// A lock confirmed removed, pending restoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub subscription_id: String,
    pub resource_group: String,
    pub lock_name: String,
}

impl LockRecord {
    pub fn new(scope: &ScopeKey, lock_name: impl Into<String>) -> Self {
        Self {
            subscription_id: scope.subscription_id.clone(),
            resource_group: scope.resource_group.clone(),
            lock_name: lock_name.into(),
        }
    }

    pub fn scope(&self) -> ScopeKey {
        ScopeKey::new(self.subscription_id.clone(), self.resource_group.clone())
    }
}

/// A failed lock listing, removal, or restoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFailure {
    pub scope: ScopeKey,
    pub lock_name: Option<String>,
    pub error: String,
}

/// Locks removed before the protected phase. Consumed by restoration.
#[derive(Debug, Default)]
pub struct RemovedLocks {
    records: Vec<LockRecord>,
    failures: Vec<LockFailure>,
}

impl RemovedLocks {
    pub fn records(&self) -> &[LockRecord] {
        &self.records
    }

    pub fn failures(&self) -> &[LockFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub restored: Vec<LockRecord>,
    pub failures: Vec<LockFailure>,
}

impl RestoreReport {
    /// Records attempted: restored plus failed.
    pub fn attempted(&self) -> usize {
        self.restored.len() + self.failures.len()
    }
}

/// Result of a guarded phase. `phase` is `None` when it was interrupted.
#[derive(Debug)]
pub struct Protected<T> {
    pub phase: Option<T>,
    pub removed: Vec<LockRecord>,
    pub removal_failures: Vec<LockFailure>,
    pub restore: RestoreReport,
}

impl<T> Protected<T> {
    pub fn interrupted(&self) -> bool {
        self.phase.is_none()
    }
}

pub struct LockGuard<'a> {
    ctx: &'a WorkerContext,
    level: String,
}

impl<'a> LockGuard<'a> {
    pub fn new(ctx: &'a WorkerContext, level: impl Into<String>) -> Self {
        Self {
            ctx,
            level: level.into(),
        }
    }

    /// List locks on every scope and remove those at the guarded level.
    ///
    /// Failures are recorded and the scan continues. Once `cancel` fires no further
    /// locks are removed; those already removed stay recorded for restoration.
    pub async fn remove(&self, scopes: &BTreeSet<ScopeKey>, cancel: &CancellationToken) -> RemovedLocks {
        let mut removed = RemovedLocks::default();
        for scope in scopes {
            if cancel.is_cancelled() {
                break;
            }
            let listed = match self
                .ctx
                .executor
                .execute(&self.ctx.cli.lock_list(scope), ExecutionMode::Once)
                .await
            {
                Ok(result) if result.is_success() => parse_locks(&result.stdout).map_err(|e| e.to_string()),
                Ok(result) => Err(result.error_text()),
                Err(e) => Err(e.to_string()),
            };
            let locks = match listed {
                Ok(locks) => locks,
                Err(error) => {
                    warn!(subscription = %scope.subscription_id, resource_group = %scope.resource_group, error = %error, "failed to list locks");
                    self.ctx
                        .journal
                        .error(&format!("Failed to list locks for {}: {}", scope, error));
                    removed.failures.push(LockFailure {
                        scope: scope.clone(),
                        lock_name: None,
                        error,
                    });
                    continue;
                }
            };

            for lock in locks.into_iter().filter(|l| l.level == self.level) {
                if cancel.is_cancelled() {
                    break;
                }
                let outcome = self
                    .ctx
                    .executor
                    .execute(&self.ctx.cli.lock_delete(scope, &lock.name), ExecutionMode::Once)
                    .await;
                match outcome {
                    Ok(result) if result.is_success() => {
                        info!(subscription = %scope.subscription_id, resource_group = %scope.resource_group, lock = %lock.name, "removed lock");
                        self.ctx.journal.note(&format!(
                            "Removed lock {} from resource group {}",
                            lock.name, scope.resource_group
                        ));
                        removed.records.push(LockRecord::new(scope, lock.name));
                    }
                    failed => {
                        let error = match failed {
                            Ok(result) => result.error_text(),
                            Err(e) => e.to_string(),
                        };
                        warn!(subscription = %scope.subscription_id, resource_group = %scope.resource_group, lock = %lock.name, error = %error, "failed to remove lock");
                        self.ctx.journal.error(&format!(
                            "Failed to remove lock {} from {}: {}",
                            lock.name, scope, error
                        ));
                        removed.failures.push(LockFailure {
                            scope: scope.clone(),
                            lock_name: Some(lock.name),
                            error,
                        });
                    }
                }
            }
        }
        removed
    }

    /// Re-create every removed lock once. A failure does not stop the rest.
    pub async fn restore(&self, removed: RemovedLocks) -> RestoreReport {
        let mut report = RestoreReport::default();
        for record in removed.records {
            let scope = record.scope();
            let outcome = self
                .ctx
                .executor
                .execute(
                    &self.ctx.cli.lock_create(&scope, &record.lock_name, &self.level),
                    ExecutionMode::Retrying,
                )
                .await;
            match outcome {
                Ok(result) if result.is_success() => {
                    info!(subscription = %record.subscription_id, resource_group = %record.resource_group, lock = %record.lock_name, "restored lock");
                    self.ctx.journal.note(&format!(
                        "Restored lock {} on resource group {}",
                        record.lock_name, record.resource_group
                    ));
                    report.restored.push(record);
                }
                failed => {
                    let error = match failed {
                        Ok(result) => result.error_text(),
                        Err(e) => e.to_string(),
                    };
                    warn!(subscription = %record.subscription_id, resource_group = %record.resource_group, lock = %record.lock_name, error = %error, "failed to restore lock");
                    self.ctx.journal.error(&format!(
                        "Failed to restore lock {} on {}: {}",
                        record.lock_name, scope, error
                    ));
                    report.failures.push(LockFailure {
                        scope,
                        lock_name: Some(record.lock_name),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Remove locks on `scopes`, run `phase`, then restore.
    ///
    /// The phase is skipped when cancellation fires during removal and abandoned
    /// (dropped) when it fires while the phase runs. Restoration runs either way.
    pub async fn protect<T, Fut>(
        &self,
        scopes: &BTreeSet<ScopeKey>,
        cancel: &CancellationToken,
        phase: Fut,
    ) -> Protected<T>
    where
        Fut: Future<Output = T>,
    {
        let removed = self.remove(scopes, cancel).await;
        let phase = if cancel.is_cancelled() {
            None
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                out = phase => Some(out),
            }
        };
        if phase.is_none() {
            warn!(locks = removed.len(), "protected phase interrupted; restoring locks");
        }

        let removed_records = removed.records().to_vec();
        let removal_failures = removed.failures().to_vec();
        let restore = self.restore(removed).await;
        Protected {
            phase,
            removed: removed_records,
            removal_failures,
            restore,
        }
    }
}
