//! Property-based tests for outcome aggregation and snapshot id parsing

use async_trait::async_trait;
use azsnap::aggregate::Aggregate;
use azsnap::cloud::AzCli;
use azsnap::command::{CommandExecutor, CommandResult, CommandRunner, CommandSpec, RetryPolicy};
use azsnap::error::CommandError;
use azsnap::journal::RunJournal;
use azsnap::outcome::{ItemReport, OutcomeTag, WorkOutcome};
use azsnap::resource::SnapshotId;
use azsnap::workers::{preflight_snapshot, WorkerContext};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Runner that counts invocations and reports every command as failed.
#[derive(Default)]
struct CountingRunner {
    calls: AtomicUsize,
}

#[async_trait]
impl CommandRunner for CountingRunner {
    async fn run(&self, _spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CommandResult::failure("not found", 3))
    }
}

fn outcome(tag: OutcomeTag, name: String) -> WorkOutcome {
    match tag {
        OutcomeTag::Valid => WorkOutcome::Valid { name },
        OutcomeTag::NonExistent => WorkOutcome::NonExistent { name },
        OutcomeTag::Created => WorkOutcome::Created {
            snapshot: format!("{}_snap", name),
            name,
        },
        OutcomeTag::Deleted => WorkOutcome::Deleted { name },
        OutcomeTag::Failed => WorkOutcome::Failed {
            name,
            error: "failed".to_string(),
        },
        OutcomeTag::Error => WorkOutcome::Error {
            name,
            error: "error".to_string(),
        },
        OutcomeTag::InvalidFormat => WorkOutcome::InvalidFormat {
            name,
            error: "invalid".to_string(),
        },
    }
}

fn report_strategy() -> impl Strategy<Value = ItemReport> {
    (
        prop::sample::select(vec!["Prod", "Dev", "Unknown"]),
        prop::sample::select(OutcomeTag::ALL.to_vec()),
        "[a-z]{1,8}",
    )
        .prop_map(|(group, tag, name)| ItemReport::new(group, outcome(tag, name)))
}

proptest! {
    #[test]
    fn fold_accounts_for_every_report(reports in prop::collection::vec(report_strategy(), 0..60)) {
        let aggregate = Aggregate::fold(reports.clone());
        prop_assert_eq!(aggregate.total(), reports.len());

        let by_tag: usize = OutcomeTag::ALL.iter().map(|tag| aggregate.count(*tag)).sum();
        prop_assert_eq!(by_tag, reports.len());

        let summary = aggregate.summary(&OutcomeTag::ALL);
        prop_assert_eq!(summary.totals.counts.iter().sum::<usize>(), reports.len());
        prop_assert_eq!(aggregate.export_records().len(), reports.len());
    }

    #[test]
    fn merge_is_additive(
        left in prop::collection::vec(report_strategy(), 0..30),
        right in prop::collection::vec(report_strategy(), 0..30),
    ) {
        let a = Aggregate::fold(left.clone());
        let b = Aggregate::fold(right.clone());
        let expected: Vec<usize> = OutcomeTag::ALL
            .iter()
            .map(|tag| a.count(*tag) + b.count(*tag))
            .collect();

        let merged = a.merge(b);
        let actual: Vec<usize> = OutcomeTag::ALL.iter().map(|tag| merged.count(*tag)).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(merged.total(), left.len() + right.len());
    }

    #[test]
    fn short_paths_are_rejected(raw in "[a-z0-9/]{0,40}") {
        prop_assume!(raw.split('/').count() < 9);
        prop_assert!(SnapshotId::parse(&raw).is_err());
    }

    #[test]
    fn well_formed_ids_keep_their_parts(
        sub in "[a-f0-9]{8}",
        rg in "[a-z][a-z0-9-]{0,12}",
        name in "[A-Za-z0-9_]{1,20}",
    ) {
        let raw = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/snapshots/{}",
            sub, rg, name
        );
        let id = SnapshotId::parse(&raw).unwrap();
        prop_assert_eq!(id.subscription_id(), sub.as_str());
        prop_assert_eq!(id.resource_group(), rg.as_str());
        prop_assert_eq!(id.name(), name.as_str());
    }

    #[test]
    fn malformed_ids_classify_as_invalid_without_a_query(raw in "[a-z0-9/]{1,40}") {
        prop_assume!(raw.split('/').count() < 9);
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(CountingRunner::default());
        let journal = Arc::new(RunJournal::open(temp.path(), "20240101000000").unwrap());
        let executor = CommandExecutor::new(runner.clone(), RetryPolicy::default());
        let ctx = WorkerContext::new(executor, AzCli::default(), journal);

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let preflight = rt.block_on(preflight_snapshot(&ctx, raw.clone())).unwrap();

        prop_assert_eq!(preflight.report.outcome.tag(), OutcomeTag::InvalidFormat);
        prop_assert_eq!(preflight.report.group.as_str(), "Unknown");
        prop_assert!(preflight.confirmed.is_none());
        prop_assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }
}
