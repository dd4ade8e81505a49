//! Deletion output: per-subscription summary, problem breakdown and lock activity.

use super::shared::{format_runtime, format_section_heading, format_summary_table, tag_label};
use crate::locks::LockFailure;
use crate::pipeline::{DeletionReport, DELETION_COLUMNS, DELETION_PROBLEMS};
use std::path::Path;

pub fn format_deletion_report(report: &DeletionReport, artifacts: &[(&str, &Path)]) -> String {
    let mut out = format_section_heading("Snapshot deletion");
    out.push('\n');
    out.push_str(&format!(
        "Requested: {}  Confirmed existing: {}\n",
        report.requested, report.confirmed
    ));
    out.push_str(&format_summary_table(&report.aggregate.summary(&DELETION_COLUMNS)));
    out.push('\n');

    let problems = report.aggregate.problems(&DELETION_PROBLEMS);
    if !problems.is_empty() {
        out.push('\n');
        out.push_str(&format_section_heading("Problems"));
        out.push('\n');
        for (group, buckets) in problems {
            out.push_str(&format!("{}:\n", group));
            for (tag, items) in buckets {
                out.push_str(&format!("  {} ({}):\n", tag_label(tag), items.len()));
                for payload in items {
                    match &payload.detail {
                        Some(detail) if tag.carries_error() => {
                            out.push_str(&format!("    - {}: {}\n", payload.name, detail))
                        }
                        _ => out.push_str(&format!("    - {}\n", payload.name)),
                    }
                }
            }
        }
    }

    if report.scopes > 0 {
        out.push('\n');
        out.push_str(&format_section_heading("Scope locks"));
        out.push('\n');
        out.push_str(&format!(
            "Resource groups: {}  Removed: {}  Restored: {}\n",
            report.scopes,
            report.removed_locks.len(),
            report.restore.restored.len()
        ));
        push_lock_failures(&mut out, "Removal failures", &report.lock_failures);
        push_lock_failures(&mut out, "Restore failures", &report.restore.failures);
    }

    if report.interrupted {
        out.push_str("\nInterrupted: deletion stopped early; removed locks were restored.\n");
    }

    out.push('\n');
    for (label, path) in artifacts {
        out.push_str(&format!("{}: {}\n", label, path.display()));
    }
    out.push_str(&format!("Runtime: {}", format_runtime(report.runtime)));
    out
}

fn push_lock_failures(out: &mut String, title: &str, failures: &[LockFailure]) {
    if failures.is_empty() {
        return;
    }
    out.push_str(&format!("{} ({}):\n", title, failures.len()));
    for failure in failures {
        let lock = failure.lock_name.as_deref().unwrap_or("-");
        out.push_str(&format!("  - {} [{}]: {}\n", failure.scope, lock, failure.error));
    }
}
