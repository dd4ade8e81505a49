//! Shared presentation: headings, summary tables, runtimes and the environment check.

use crate::aggregate::SummaryTable;
use crate::outcome::OutcomeTag;
use crate::pipeline::EnvironmentReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{CellAlignment, Table};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Column label for an outcome tag.
pub fn tag_label(tag: OutcomeTag) -> &'static str {
    match tag {
        OutcomeTag::Valid => "Valid",
        OutcomeTag::NonExistent => "Non-existent",
        OutcomeTag::Created => "Created",
        OutcomeTag::Deleted => "Deleted",
        OutcomeTag::Failed => "Failed",
        OutcomeTag::Error => "Error",
        OutcomeTag::InvalidFormat => "Invalid format",
    }
}

/// Per-subscription counts with a totals row.
pub fn format_summary_table(summary: &SummaryTable) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    let mut header = vec!["Subscription".to_string()];
    header.extend(summary.columns.iter().map(|tag| tag_label(*tag).to_string()));
    table.set_header(header);

    for row in summary.rows.iter().chain(std::iter::once(&summary.totals)) {
        let mut cells = vec![row.group.clone()];
        cells.extend(row.counts.iter().map(|c| c.to_string()));
        table.add_row(cells);
    }
    for index in 1..=summary.columns.len() {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table.to_string()
}

/// `1h 2m 3s`, `2m 3s` or `3.2s`.
pub fn format_runtime(runtime: Duration) -> String {
    let secs = runtime.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{:.1}s", runtime.as_secs_f64())
    }
}

pub fn format_environment_report(report: &EnvironmentReport) -> String {
    let mut out = format_section_heading("Environment");
    out.push('\n');

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Check", "Status", "Detail"]);

    let location = match &report.location {
        Some(path) => ("ok", path.display().to_string()),
        None => ("missing", format!("'{}' not found on PATH", report.program)),
    };
    table.add_row(vec!["CLI installed", location.0, location.1.as_str()]);

    let version = match (&report.versions, &report.version_error) {
        (Some(versions), _) => (
            "ok",
            versions.cli.clone().unwrap_or_else(|| "unknown".to_string()),
        ),
        (None, Some(error)) => ("failed", error.clone()),
        (None, None) => ("failed", String::new()),
    };
    table.add_row(vec!["CLI version", version.0, version.1.as_str()]);

    let login = if report.logged_in {
        ("ok", String::new())
    } else {
        ("failed", report.login_error.clone().unwrap_or_default())
    };
    table.add_row(vec!["Logged in", login.0, login.1.as_str()]);

    out.push_str(&table.to_string());
    out.push('\n');
    if report.is_ready() {
        out.push_str("Ready.");
    } else {
        out.push_str("Not ready: fix the failed checks above.");
    }
    out
}
