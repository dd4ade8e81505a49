//! Cloud CLI command construction and output parsing.
//!
//! Every command is built as an argument vector. Commands that depend on a
//! subscription carry it explicitly via `--subscription`; nothing here changes
//! the CLI's active subscription, so concurrent workers never share that state.

use crate::command::CommandSpec;
use crate::resource::{ScopeKey, SnapshotId, SubscriptionDirectory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lock level that blocks deletes.
pub const DELETE_LOCK_LEVEL: &str = "CanNotDelete";

/// Builder for cloud CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzCli {
    program: String,
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new("az")
    }
}

impl AzCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn cmd<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> CommandSpec {
        CommandSpec::argv(self.program.clone(), args)
    }

    pub fn version(&self) -> CommandSpec {
        self.cmd(["version", "--output", "json"])
    }

    /// Current login context; fails when not logged in.
    pub fn account_show(&self) -> CommandSpec {
        self.cmd(["account", "show", "-o", "json"])
    }

    /// Confirms a subscription is accessible without making it the active one.
    pub fn subscription_show(&self, subscription_id: &str) -> CommandSpec {
        self.cmd(["account", "show", "--subscription", subscription_id, "-o", "json"])
    }

    pub fn account_list(&self) -> CommandSpec {
        self.cmd(["account", "list", "--query", "[].{id:id, name:name}", "-o", "json"])
    }

    pub fn vm_os_disk_id(&self, subscription_id: &str, vm_id: &str) -> CommandSpec {
        self.cmd([
            "vm",
            "show",
            "--ids",
            vm_id,
            "--subscription",
            subscription_id,
            "--query",
            "storageProfile.osDisk.managedDisk.id",
            "-o",
            "tsv",
        ])
    }

    pub fn vm_resource_group(&self, subscription_id: &str, vm_id: &str) -> CommandSpec {
        self.cmd([
            "vm",
            "show",
            "--ids",
            vm_id,
            "--subscription",
            subscription_id,
            "--query",
            "resourceGroup",
            "-o",
            "tsv",
        ])
    }

    pub fn snapshot_create(
        &self,
        subscription_id: &str,
        name: &str,
        resource_group: &str,
        source_disk: &str,
    ) -> CommandSpec {
        self.cmd([
            "snapshot",
            "create",
            "--name",
            name,
            "--resource-group",
            resource_group,
            "--source",
            source_disk,
            "--subscription",
            subscription_id,
            "-o",
            "json",
        ])
    }

    /// Existence probe for a snapshot.
    pub fn snapshot_show(&self, id: &SnapshotId) -> CommandSpec {
        self.cmd([
            "snapshot",
            "show",
            "--ids",
            id.as_str(),
            "--subscription",
            id.subscription_id(),
            "-o",
            "json",
        ])
    }

    /// Snapshot metadata query used by validation.
    pub fn snapshot_details(&self, id: &SnapshotId) -> CommandSpec {
        self.cmd([
            "snapshot",
            "show",
            "--ids",
            id.as_str(),
            "--subscription",
            id.subscription_id(),
            "--query",
            "{name:name, resourceGroup:resourceGroup, timeCreated:timeCreated, diskSizeGb:diskSizeGb, provisioningState:provisioningState}",
            "-o",
            "json",
        ])
    }

    pub fn snapshot_delete(&self, id: &SnapshotId) -> CommandSpec {
        self.cmd([
            "snapshot",
            "delete",
            "--ids",
            id.as_str(),
            "--subscription",
            id.subscription_id(),
        ])
    }

    pub fn lock_list(&self, scope: &ScopeKey) -> CommandSpec {
        self.cmd([
            "lock",
            "list",
            "--resource-group",
            scope.resource_group.as_str(),
            "--subscription",
            scope.subscription_id.as_str(),
            "--query",
            "[].{name:name, level:level}",
            "-o",
            "json",
        ])
    }

    pub fn lock_delete(&self, scope: &ScopeKey, lock_name: &str) -> CommandSpec {
        self.cmd([
            "lock",
            "delete",
            "--name",
            lock_name,
            "--resource-group",
            scope.resource_group.as_str(),
            "--subscription",
            scope.subscription_id.as_str(),
        ])
    }

    pub fn lock_create(&self, scope: &ScopeKey, lock_name: &str, level: &str) -> CommandSpec {
        self.cmd([
            "lock",
            "create",
            "--name",
            lock_name,
            "--resource-group",
            scope.resource_group.as_str(),
            "--lock-type",
            level,
            "--subscription",
            scope.subscription_id.as_str(),
        ])
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SubscriptionEntry {
    id: String,
    name: String,
}

/// Parse `account list` output into a subscription directory.
pub fn parse_subscriptions(stdout: &str) -> Result<SubscriptionDirectory, serde_json::Error> {
    let entries: Vec<SubscriptionEntry> = serde_json::from_str(stdout)?;
    let names: BTreeMap<String, String> = entries.into_iter().map(|e| (e.id, e.name)).collect();
    Ok(SubscriptionDirectory::new(names))
}

/// One entry of `lock list` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSummary {
    pub name: String,
    pub level: String,
}

pub fn parse_locks(stdout: &str) -> Result<Vec<LockSummary>, serde_json::Error> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(stdout)
}

/// Snapshot metadata returned by the details query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub name: String,
    pub resource_group: String,
    pub time_created: Option<String>,
    pub disk_size_gb: Option<u64>,
    pub provisioning_state: Option<String>,
}

pub fn parse_snapshot_metadata(stdout: &str) -> Result<SnapshotMetadata, serde_json::Error> {
    serde_json::from_str(stdout)
}

/// `id` field of `snapshot create` output.
pub fn parse_created_snapshot_id(stdout: &str) -> Result<Option<String>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(stdout)?;
    Ok(value
        .get("id")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string))
}

/// Versions reported by `version --output json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliVersions {
    #[serde(rename = "azure-cli")]
    pub cli: Option<String>,
    #[serde(rename = "azure-cli-core")]
    pub core: Option<String>,
    #[serde(rename = "azure-cli-telemetry")]
    pub telemetry: Option<String>,
}

pub fn parse_versions(stdout: &str) -> Result<CliVersions, serde_json::Error> {
    serde_json::from_str(stdout)
}
