use super::shared::{format_runtime, format_section_heading, format_summary_table};
use crate::outcome::OutcomeTag;
use crate::pipeline::CreationReport;
use std::path::Path;

const CREATION_COLUMNS: [OutcomeTag; 4] = [
    OutcomeTag::Created,
    OutcomeTag::Failed,
    OutcomeTag::InvalidFormat,
    OutcomeTag::Error,
];

pub fn format_creation_report(report: &CreationReport, artifacts: &[(&str, &Path)]) -> String {
    let mut out = format_section_heading(&format!("Snapshot creation ({})", report.ticket));
    out.push('\n');
    out.push_str(&format_summary_table(&report.aggregate.summary(&CREATION_COLUMNS)));
    out.push('\n');

    let successes = report.successes();
    let failures = report.failures();
    out.push_str(&format!(
        "Total: {}  Successful: {}  Failed: {}\n",
        report.total(),
        successes.len(),
        failures.len()
    ));
    if !successes.is_empty() {
        out.push_str(&format!("\nCreated ({}):\n", successes.len()));
        for (vm, snapshot) in successes {
            out.push_str(&format!("  - {}: {}\n", vm, snapshot));
        }
    }
    if !failures.is_empty() {
        out.push_str(&format!("\nFailed ({}):\n", failures.len()));
        for (vm, reason) in failures {
            out.push_str(&format!("  - {}: {}\n", vm, reason));
        }
    }
    if report.interrupted() {
        out.push_str(&format!(
            "\nInterrupted: {} line(s) not processed.\n",
            report.skipped
        ));
    }

    out.push('\n');
    for (label, path) in artifacts {
        out.push_str(&format!("{}: {}\n", label, path.display()));
    }
    out.push_str(&format!("Runtime: {}", format_runtime(report.runtime)));
    out
}
