//! Per-item workers.
//!
//! Each worker is a short sequential chain of cloud CLI calls for one identifier,
//! short-circuiting at the first failed stage. Expected failures come back as tagged
//! outcomes; an `Err` means the command could not be run at all and is turned into an
//! `Error` outcome by the caller.

mod create;
mod delete;
mod validate;

pub use create::{create_snapshot, SnapshotNamer};
pub use delete::{delete_snapshot, preflight_snapshot, Preflight};
pub use validate::{validate_snapshot, SnapshotDetails};

use crate::cloud::AzCli;
use crate::command::CommandExecutor;
use crate::journal::RunJournal;
use crate::resource::SubscriptionDirectory;
use std::sync::Arc;

/// Immutable per-run context shared by all workers.
///
/// Holds no active-subscription state: every command built from `cli` names its
/// subscription explicitly.
#[derive(Clone)]
pub struct WorkerContext {
    pub executor: CommandExecutor,
    pub cli: AzCli,
    pub subscriptions: SubscriptionDirectory,
    pub journal: Arc<RunJournal>,
}

impl WorkerContext {
    pub fn new(executor: CommandExecutor, cli: AzCli, journal: Arc<RunJournal>) -> Self {
        Self {
            executor,
            cli,
            subscriptions: SubscriptionDirectory::default(),
            journal,
        }
    }

    pub fn with_subscriptions(mut self, subscriptions: SubscriptionDirectory) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    /// Grouping key for an identifier.
    pub fn group_for(&self, identifier: &str) -> String {
        self.subscriptions.group_for(identifier)
    }
}
