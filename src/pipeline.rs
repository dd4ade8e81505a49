//! Batch flows.
//!
//! Wires the dispatcher, per-item workers, aggregator and lock guard into the three
//! operator flows. A `Session` carries what every flow shares: worker context, pool
//! width, cancellation and the configured thresholds.

mod create;
mod delete;
mod validate;

pub use create::{run_creation, CreationReport};
pub use delete::{run_deletion, DeletionReport, DELETION_COLUMNS, DELETION_PROBLEMS};
pub use validate::{run_validation, ValidationReport};

use crate::cloud::{parse_subscriptions, parse_versions, CliVersions, DELETE_LOCK_LEVEL};
use crate::command::ExecutionMode;
use crate::dispatch::{Completed, Dispatcher};
use crate::error::ManagerError;
use crate::outcome::{ItemReport, WorkOutcome};
use crate::resource::SubscriptionDirectory;
use crate::workers::WorkerContext;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Tunables shared by the flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub snapshot_prefix: String,
    pub confirm_threshold: usize,
    pub lock_level: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            snapshot_prefix: "RH".to_string(),
            confirm_threshold: 100,
            lock_level: DELETE_LOCK_LEVEL.to_string(),
        }
    }
}

/// Operator confirmation for large destructive batches.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool, ManagerError>;
}

/// Confirms everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool, ManagerError> {
        Ok(true)
    }
}

pub struct Session {
    ctx: Arc<WorkerContext>,
    dispatcher: Dispatcher,
    cancel: CancellationToken,
    settings: PipelineSettings,
}

impl Session {
    pub fn new(ctx: WorkerContext, dispatcher: Dispatcher, settings: PipelineSettings) -> Self {
        Self {
            ctx: Arc::new(ctx),
            dispatcher,
            cancel: CancellationToken::new(),
            settings,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    pub fn shared_context(&self) -> Arc<WorkerContext> {
        Arc::clone(&self.ctx)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Load subscription display names into the worker context.
    ///
    /// Best-effort: on failure workers group by raw subscription ID.
    pub async fn load_subscriptions(&mut self) -> usize {
        let directory = fetch_subscriptions(&self.ctx).await;
        let count = directory.len();
        let ctx = (*self.ctx).clone().with_subscriptions(directory);
        self.ctx = Arc::new(ctx);
        count
    }
}

/// Fail unless the CLI has a logged-in account.
pub async fn ensure_logged_in(ctx: &WorkerContext) -> Result<(), ManagerError> {
    let result = ctx
        .executor
        .execute(&ctx.cli.account_show(), ExecutionMode::Once)
        .await?;
    if !result.is_success() {
        return Err(ManagerError::NotLoggedIn(result.error_text()));
    }
    serde_json::from_str::<serde_json::Value>(&result.stdout)
        .map(|_| ())
        .map_err(|_| ManagerError::NotLoggedIn("unexpected response from account show".to_string()))
}

/// Subscription ID to name directory; empty when it cannot be fetched.
pub async fn fetch_subscriptions(ctx: &WorkerContext) -> SubscriptionDirectory {
    let result = match ctx
        .executor
        .execute(&ctx.cli.account_list(), ExecutionMode::Once)
        .await
    {
        Ok(result) if result.is_success() => result,
        Ok(result) => {
            warn!(error = %result.error_text(), "could not fetch subscription names, using IDs");
            return SubscriptionDirectory::default();
        }
        Err(e) => {
            warn!(error = %e, "could not fetch subscription names, using IDs");
            return SubscriptionDirectory::default();
        }
    };
    match parse_subscriptions(&result.stdout) {
        Ok(directory) => {
            debug!(subscriptions = directory.len(), "loaded subscription names");
            directory
        }
        Err(e) => {
            warn!(error = %e, "unreadable subscription list, using IDs");
            SubscriptionDirectory::default()
        }
    }
}

/// Installation and login state of the cloud CLI.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub program: String,
    /// Resolved executable, when found on `PATH`.
    pub location: Option<PathBuf>,
    pub versions: Option<CliVersions>,
    pub version_error: Option<String>,
    pub logged_in: bool,
    pub login_error: Option<String>,
}

impl EnvironmentReport {
    pub fn is_ready(&self) -> bool {
        self.location.is_some() && self.versions.is_some() && self.logged_in
    }
}

/// Locate `program` the way the shell would: as given when it has a path
/// component, else in each `PATH` entry.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| {
        executable_names(program)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    })
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    vec![
        program.to_string(),
        format!("{}.exe", program),
        format!("{}.cmd", program),
    ]
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

/// Report whether the CLI is installed, its versions, and whether it is logged in.
pub async fn check_environment(ctx: &WorkerContext) -> EnvironmentReport {
    let program = ctx.cli.program().to_string();
    let location = find_program(&program);

    let (versions, version_error) = match ctx
        .executor
        .execute(&ctx.cli.version(), ExecutionMode::Once)
        .await
    {
        Ok(result) if result.is_success() => match parse_versions(&result.stdout) {
            Ok(versions) => (Some(versions), None),
            Err(e) => (None, Some(format!("unreadable version output: {}", e))),
        },
        Ok(result) => (None, Some(result.error_text())),
        Err(e) => (None, Some(e.to_string())),
    };

    let (logged_in, login_error) = match ensure_logged_in(ctx).await {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    EnvironmentReport {
        program,
        location,
        versions,
        version_error,
        logged_in,
        login_error,
    }
}

/// Turn a dispatcher fault into an `Error` outcome for its identifier.
fn fault_report(ctx: &WorkerContext, identifier: &str, error: String) -> ItemReport {
    ItemReport::new(
        ctx.group_for(identifier),
        WorkOutcome::Error {
            name: identifier.to_string(),
            error,
        },
    )
}

/// Reports from a dispatch pass, with faults converted in place.
fn collect_reports<I>(ctx: &WorkerContext, completed: Vec<Completed<I, ItemReport>>) -> Vec<ItemReport>
where
    I: std::fmt::Display,
{
    completed
        .into_iter()
        .map(|c| match c.result {
            Ok(report) => report,
            Err(fault) => fault_report(ctx, &c.item.to_string(), fault.message),
        })
        .collect()
}
