//! Snapshot creation for one VM list line.

use super::WorkerContext;
use crate::cloud::parse_created_snapshot_id;
use crate::command::{CommandResult, CommandSpec, ExecutionMode};
use crate::outcome::{ItemReport, WorkOutcome};
use crate::resource::{VmEntry, UNKNOWN_GROUP};
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::{info, warn};

/// Generates `<prefix>_<ticket>_<vm>_<timestamp>` names, unique within a run.
///
/// A name already issued in this run gets a numeric suffix (`_2`, `_3`, ...).
#[derive(Debug)]
pub struct SnapshotNamer {
    prefix: String,
    ticket: String,
    timestamp: String,
    issued: Mutex<HashSet<String>>,
}

impl SnapshotNamer {
    pub fn new(
        prefix: impl Into<String>,
        ticket: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            ticket: ticket.into(),
            timestamp: timestamp.into(),
            issued: Mutex::new(HashSet::new()),
        }
    }

    pub fn base_name(&self, vm_name: &str) -> String {
        let mut parts = Vec::with_capacity(4);
        if !self.prefix.is_empty() {
            parts.push(self.prefix.as_str());
        }
        parts.extend([self.ticket.as_str(), vm_name, self.timestamp.as_str()]);
        parts.join("_")
    }

    /// Reserve the next free name for `vm_name`.
    pub fn reserve(&self, vm_name: &str) -> String {
        let base = self.base_name(vm_name);
        let mut issued = self.issued.lock();
        if issued.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if issued.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Stdout of a successful result, or `None` when the stage failed or printed nothing.
fn stage_output(result: &CommandResult) -> Option<&str> {
    (result.is_success() && !result.stdout.is_empty()).then_some(result.stdout.as_str())
}

/// Run one creation stage in `Retrying` mode. A stage that could not be run at
/// all is journaled and comes back as `None`.
async fn run_stage(ctx: &WorkerContext, spec: &CommandSpec) -> Option<CommandResult> {
    match ctx.executor.execute(spec, ExecutionMode::Retrying).await {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(command = %spec, error = %e, "creation stage could not be run");
            ctx.journal.error(&format!("Command could not be run: {}", e));
            None
        }
    }
}

/// Create a snapshot of the OS disk of the VM on `line`.
///
/// Stages: subscription from the resource path, subscription context check, OS disk
/// id, resource group, snapshot create. The created snapshot's id is appended to the
/// running snapshot list; an unreadable create response only produces a warning.
/// A stage that fails, or cannot be run at all, yields `Failed` naming the stage.
pub async fn create_snapshot(
    ctx: &WorkerContext,
    line: &str,
    namer: &SnapshotNamer,
) -> ItemReport {
    let entry = match VmEntry::parse_line(line) {
        Ok(entry) => entry,
        Err(e) => {
            ctx.journal.error(&e.to_string());
            return ItemReport::new(
                UNKNOWN_GROUP,
                WorkOutcome::InvalidFormat {
                    name: line.trim().to_string(),
                    error: "Invalid line format".to_string(),
                },
            );
        }
    };

    let group = ctx.group_for(&entry.resource_id);
    let failed = |stage: &str| -> ItemReport {
        ctx.journal.error(&format!("{} for VM: {}", stage, entry.name));
        ItemReport::new(
            group.clone(),
            WorkOutcome::Failed {
                name: entry.name.clone(),
                error: stage.to_string(),
            },
        )
    };

    let Some(subscription) = entry.subscription_id() else {
        return failed("Failed to get subscription ID");
    };

    let context = run_stage(ctx, &ctx.cli.subscription_show(subscription)).await;
    if !context.is_some_and(|result| result.is_success()) {
        return failed("Failed to resolve subscription context");
    }

    let disk = run_stage(ctx, &ctx.cli.vm_os_disk_id(subscription, &entry.resource_id)).await;
    let Some(disk_id) = disk.as_ref().and_then(stage_output) else {
        return failed("Failed to get disk ID");
    };

    let rg = run_stage(ctx, &ctx.cli.vm_resource_group(subscription, &entry.resource_id)).await;
    let Some(resource_group) = rg.as_ref().and_then(stage_output) else {
        return failed("Failed to get resource group");
    };

    let snapshot_name = namer.reserve(&entry.name);
    let created = run_stage(
        ctx,
        &ctx.cli
            .snapshot_create(subscription, &snapshot_name, resource_group, disk_id),
    )
    .await;
    let Some(created) = created.filter(CommandResult::is_success) else {
        return failed("Failed to create snapshot");
    };

    match parse_created_snapshot_id(&created.stdout) {
        Ok(Some(snapshot_id)) => {
            if let Err(e) = ctx.journal.record_snapshot_id(&snapshot_id) {
                warn!(snapshot = %snapshot_id, error = %e, "failed to record snapshot id");
                ctx.journal
                    .error(&format!("Failed to record snapshot ID {}: {}", snapshot_id, e));
            }
        }
        Ok(None) => {
            warn!(vm = %entry.name, "snapshot create response has no id");
            ctx.journal.note(&format!(
                "Warning: no snapshot ID in create response for VM: {}",
                entry.name
            ));
        }
        Err(e) => {
            warn!(vm = %entry.name, error = %e, "could not parse snapshot create response");
            ctx.journal
                .note(&format!("Warning: Failed to parse snapshot creation response: {}", e));
            ctx.journal.note(&format!("Raw output: {}", created.stdout));
        }
    }

    info!(vm = %entry.name, snapshot = %snapshot_name, "snapshot created");
    ctx.journal.note(&format!(
        "Successfully created snapshot: {} for VM: {}",
        snapshot_name, entry.name
    ));
    ItemReport::new(
        group,
        WorkOutcome::Created {
            name: entry.name,
            snapshot: snapshot_name,
        },
    )
}
