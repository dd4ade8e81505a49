use super::Session;
use crate::aggregate::Aggregate;
use crate::error::ManagerError;
use crate::progress::ProgressSink;
use crate::workers::{validate_snapshot, SnapshotDetails};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Per-snapshot details, in input order.
    pub details: Vec<SnapshotDetails>,
    pub aggregate: Aggregate,
    pub runtime: Duration,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.details.len()
    }

    pub fn existing(&self) -> usize {
        self.details.iter().filter(|d| d.exists).count()
    }

    pub fn missing(&self) -> usize {
        self.total() - self.existing()
    }
}

/// Query every snapshot on the worker pool.
///
/// Returns `Interrupted` if cancellation fires before the pass completes.
pub async fn run_validation(
    session: &Session,
    ids: Vec<String>,
    progress: &dyn ProgressSink,
) -> Result<ValidationReport, ManagerError> {
    let started = Instant::now();
    let positions: HashMap<String, usize> = ids
        .iter()
        .enumerate()
        .rev()
        .map(|(i, id)| (id.clone(), i))
        .collect();

    let shared = session.shared_context();
    let pass = session.dispatcher().dispatch(
        "Validating snapshots",
        ids,
        move |raw: String| {
            let ctx = Arc::clone(&shared);
            async move { validate_snapshot(&ctx, raw).await }
        },
        progress,
    );
    let completed = tokio::select! {
        biased;
        _ = session.cancellation().cancelled() => return Err(ManagerError::Interrupted),
        completed = pass => completed,
    };

    let ctx = session.context();
    let mut details: Vec<SnapshotDetails> = completed
        .into_iter()
        .map(|c| match c.result {
            Ok(details) => details,
            Err(fault) => SnapshotDetails::missing(c.item).with_error(fault.message),
        })
        .collect();
    details.sort_by_key(|d| positions.get(&d.id).copied().unwrap_or(usize::MAX));

    let aggregate = Aggregate::fold(details.iter().map(|d| d.report(ctx.group_for(&d.id))));
    let report = ValidationReport {
        details,
        aggregate,
        runtime: started.elapsed(),
    };
    info!(
        total = report.total(),
        existing = report.existing(),
        missing = report.missing(),
        "snapshot validation finished"
    );
    Ok(report)
}
