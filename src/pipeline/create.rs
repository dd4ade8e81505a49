use super::Session;
use crate::aggregate::Aggregate;
use crate::outcome::{ItemReport, OutcomeTag, WorkOutcome};
use crate::progress::ProgressSink;
use crate::workers::{create_snapshot, SnapshotNamer};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CreationReport {
    pub ticket: String,
    /// One report per processed line, in input order.
    pub reports: Vec<ItemReport>,
    pub aggregate: Aggregate,
    /// Lines left unprocessed after an interrupt.
    pub skipped: usize,
    pub runtime: Duration,
}

impl CreationReport {
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// `(vm, snapshot name)` for each created snapshot.
    pub fn successes(&self) -> Vec<(&str, &str)> {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                WorkOutcome::Created { name, snapshot } => Some((name.as_str(), snapshot.as_str())),
                _ => None,
            })
            .collect()
    }

    /// `(vm, reason)` for each line that produced no snapshot.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                WorkOutcome::Failed { name, error }
                | WorkOutcome::Error { name, error }
                | WorkOutcome::InvalidFormat { name, error } => Some((name.as_str(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn interrupted(&self) -> bool {
        self.skipped > 0
    }
}

/// Create snapshots for every VM list line, one at a time.
///
/// Each stage retries on its own; a slow stage suspends only this flow. Stops before
/// the next line once cancellation fires.
pub async fn run_creation(
    session: &Session,
    lines: Vec<String>,
    ticket: &str,
    progress: &dyn ProgressSink,
) -> CreationReport {
    let started = Instant::now();
    let ctx = session.context();
    ctx.journal.note_raw(&format!("Ticket: {}\n\n", ticket));

    let namer = SnapshotNamer::new(
        session.settings().snapshot_prefix.clone(),
        ticket,
        ctx.journal.artifacts().timestamp(),
    );

    let total = lines.len();
    progress.begin("Creating snapshots", total);
    let mut reports = Vec::with_capacity(total);
    for line in &lines {
        if session.cancellation().is_cancelled() {
            warn!(remaining = total - reports.len(), "snapshot creation interrupted");
            break;
        }
        reports.push(create_snapshot(ctx, line, &namer).await);
        progress.advance(1);
    }
    progress.finish();

    let skipped = total - reports.len();
    let aggregate = Aggregate::fold(reports.iter().cloned());
    info!(
        total,
        created = aggregate.count(OutcomeTag::Created),
        skipped,
        "snapshot creation finished"
    );
    CreationReport {
        ticket: ticket.to_string(),
        reports,
        aggregate,
        skipped,
        runtime: started.elapsed(),
    }
}
