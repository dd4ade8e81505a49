//! Per-item work outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status bucket an outcome lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeTag {
    Valid,
    NonExistent,
    Created,
    Deleted,
    Failed,
    Error,
    InvalidFormat,
}

impl OutcomeTag {
    pub const ALL: [OutcomeTag; 7] = [
        OutcomeTag::Valid,
        OutcomeTag::NonExistent,
        OutcomeTag::Created,
        OutcomeTag::Deleted,
        OutcomeTag::Failed,
        OutcomeTag::Error,
        OutcomeTag::InvalidFormat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeTag::Valid => "valid",
            OutcomeTag::NonExistent => "non-existent",
            OutcomeTag::Created => "created",
            OutcomeTag::Deleted => "deleted",
            OutcomeTag::Failed => "failed",
            OutcomeTag::Error => "error",
            OutcomeTag::InvalidFormat => "invalid",
        }
    }

    /// Whether payloads under this tag carry an error message.
    pub fn carries_error(self) -> bool {
        matches!(
            self,
            OutcomeTag::Failed | OutcomeTag::Error | OutcomeTag::InvalidFormat
        )
    }
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one identifier in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum WorkOutcome {
    Valid { name: String },
    NonExistent { name: String },
    Created { name: String, snapshot: String },
    Deleted { name: String },
    Failed { name: String, error: String },
    Error { name: String, error: String },
    InvalidFormat { name: String, error: String },
}

impl WorkOutcome {
    pub fn tag(&self) -> OutcomeTag {
        match self {
            WorkOutcome::Valid { .. } => OutcomeTag::Valid,
            WorkOutcome::NonExistent { .. } => OutcomeTag::NonExistent,
            WorkOutcome::Created { .. } => OutcomeTag::Created,
            WorkOutcome::Deleted { .. } => OutcomeTag::Deleted,
            WorkOutcome::Failed { .. } => OutcomeTag::Failed,
            WorkOutcome::Error { .. } => OutcomeTag::Error,
            WorkOutcome::InvalidFormat { .. } => OutcomeTag::InvalidFormat,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            WorkOutcome::Valid { name }
            | WorkOutcome::NonExistent { name }
            | WorkOutcome::Created { name, .. }
            | WorkOutcome::Deleted { name }
            | WorkOutcome::Failed { name, .. }
            | WorkOutcome::Error { name, .. }
            | WorkOutcome::InvalidFormat { name, .. } => name,
        }
    }

    pub fn payload(&self) -> Payload {
        match self {
            WorkOutcome::Valid { name }
            | WorkOutcome::NonExistent { name }
            | WorkOutcome::Deleted { name } => Payload::named(name.clone()),
            WorkOutcome::Created { name, snapshot } => Payload::with_detail(name.clone(), snapshot.clone()),
            WorkOutcome::Failed { name, error }
            | WorkOutcome::Error { name, error }
            | WorkOutcome::InvalidFormat { name, error } => {
                Payload::with_detail(name.clone(), error.clone())
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            WorkOutcome::Valid { .. } | WorkOutcome::Created { .. } | WorkOutcome::Deleted { .. }
        )
    }
}

/// What an aggregate bucket keeps per item: its name and, depending on the tag,
/// an error message or the produced resource name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Payload {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: None,
        }
    }

    pub fn with_detail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: Some(detail.into()),
        }
    }
}

/// An outcome attributed to its grouping key (subscription display name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub group: String,
    pub outcome: WorkOutcome,
}

impl ItemReport {
    pub fn new(group: impl Into<String>, outcome: WorkOutcome) -> Self {
        Self {
            group: group.into(),
            outcome,
        }
    }
}
