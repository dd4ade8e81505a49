//! Resource identifiers and batch input files.
//!
//! Resource paths are slash-delimited: `/subscriptions/<sub>/resourceGroups/<rg>/providers/...`.
//! Splitting on `/` gives the subscription at segment 2 and the resource group at segment 4.

use crate::error::{IdentifierError, ManagerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Minimum segment count to read a (subscription, resource group) pair.
pub const MIN_SCOPE_SEGMENTS: usize = 5;
/// Minimum segment count of a snapshot resource path.
pub const MIN_SNAPSHOT_SEGMENTS: usize = 9;

/// Grouping key used when an identifier cannot be attributed to a subscription.
pub const UNKNOWN_GROUP: &str = "Unknown";

const SUBSCRIPTION_SEGMENT: usize = 2;
const RESOURCE_GROUP_SEGMENT: usize = 4;

fn segments(raw: &str) -> Vec<&str> {
    raw.split('/').collect()
}

/// Subscription ID embedded in a resource path, if the path has one.
pub fn subscription_segment(raw: &str) -> Option<&str> {
    raw.split('/')
        .nth(SUBSCRIPTION_SEGMENT)
        .filter(|s| !s.is_empty())
}

/// (subscription, resource group) pair scoping lock operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    pub subscription_id: String,
    pub resource_group: String,
}

impl ScopeKey {
    pub fn new(subscription_id: impl Into<String>, resource_group: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
        }
    }

    pub fn from_resource_path(raw: &str) -> Result<Self, IdentifierError> {
        let parts = segments(raw);
        if parts.len() < MIN_SCOPE_SEGMENTS {
            return Err(IdentifierError::TooFewSegments {
                raw: raw.to_string(),
                found: parts.len(),
                required: MIN_SCOPE_SEGMENTS,
            });
        }
        let subscription_id = non_empty(raw, parts[SUBSCRIPTION_SEGMENT], "subscription")?;
        let resource_group = non_empty(raw, parts[RESOURCE_GROUP_SEGMENT], "resource group")?;
        Ok(Self::new(subscription_id, resource_group))
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subscription_id, self.resource_group)
    }
}

fn non_empty<'a>(
    raw: &str,
    value: &'a str,
    segment: &'static str,
) -> Result<&'a str, IdentifierError> {
    if value.is_empty() {
        Err(IdentifierError::EmptySegment {
            raw: raw.to_string(),
            segment,
        })
    } else {
        Ok(value)
    }
}

/// A parsed snapshot resource path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId {
    raw: String,
    scope: ScopeKey,
    name: String,
}

impl SnapshotId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let raw = raw.trim();
        let parts = segments(raw);
        if parts.len() < MIN_SNAPSHOT_SEGMENTS {
            return Err(IdentifierError::TooFewSegments {
                raw: raw.to_string(),
                found: parts.len(),
                required: MIN_SNAPSHOT_SEGMENTS,
            });
        }
        let scope = ScopeKey::from_resource_path(raw)?;
        let name = parts.last().copied().unwrap_or_default();
        let name = non_empty(raw, name, "snapshot name")?.to_string();
        Ok(Self {
            raw: raw.to_string(),
            scope,
            name,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn subscription_id(&self) -> &str {
        &self.scope.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.scope.resource_group
    }

    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One line of the VM list: `<resource_path> <vm_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmEntry {
    pub resource_id: String,
    pub name: String,
}

impl VmEntry {
    pub fn parse_line(line: &str) -> Result<Self, IdentifierError> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(resource_id), Some(name), None) => Ok(Self {
                resource_id: resource_id.to_string(),
                name: name.to_string(),
            }),
            _ => Err(IdentifierError::InvalidVmLine {
                line: line.trim().to_string(),
            }),
        }
    }

    pub fn subscription_id(&self) -> Option<&str> {
        subscription_segment(&self.resource_id)
    }
}

/// Subscription ID to display-name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDirectory {
    names: BTreeMap<String, String>,
}

impl SubscriptionDirectory {
    pub fn new(names: BTreeMap<String, String>) -> Self {
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Display name for a subscription, falling back to the raw ID.
    pub fn display_name(&self, subscription_id: &str) -> String {
        self.names
            .get(subscription_id)
            .cloned()
            .unwrap_or_else(|| subscription_id.to_string())
    }

    /// Grouping key for any identifier: subscription name, raw subscription ID, or `Unknown`.
    pub fn group_for(&self, identifier: &str) -> String {
        subscription_segment(identifier)
            .map(|id| self.display_name(id))
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string())
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, ManagerError> {
    if !path.is_file() {
        return Err(ManagerError::InputNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Read the VM list. Lines are kept raw so malformed ones still produce an outcome.
pub fn read_vm_list(path: &Path) -> Result<Vec<String>, ManagerError> {
    read_lines(path)
}

/// Read a snapshot-id list, one identifier per line. Blank lines are skipped.
pub fn read_snapshot_ids(path: &Path) -> Result<Vec<String>, ManagerError> {
    read_lines(path)
}
