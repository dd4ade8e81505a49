//! Validation output: a detail table per snapshot, or the JSON document.

use super::shared::{format_runtime, format_section_heading};
use crate::error::ManagerError;
use crate::pipeline::ValidationReport;
use crate::report::validation_json;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

pub fn format_validation_text(report: &ValidationReport) -> String {
    let mut out = format_section_heading("Snapshot validation");
    out.push('\n');

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Snapshot", "Exists", "Resource group", "Created", "Size (GB)", "State"]);
    for details in &report.details {
        let size = details.size_gb.map(|s| s.to_string()).unwrap_or_default();
        let exists = if details.exists { "yes" } else { "no" };
        table.add_row(vec![
            details.display_name(),
            exists,
            details.resource_group.as_deref().unwrap_or(""),
            details.time_created.as_deref().unwrap_or(""),
            size.as_str(),
            details.state.as_deref().unwrap_or(""),
        ]);
    }
    out.push_str(&table.to_string());

    let errors: Vec<_> = report
        .details
        .iter()
        .filter_map(|d| d.error.as_deref().map(|e| (d.id.as_str(), e)))
        .collect();
    if !errors.is_empty() {
        out.push_str(&format!("\n\nErrors ({}):", errors.len()));
        for (id, error) in errors {
            out.push_str(&format!("\n  - {}: {}", id, error));
        }
    }

    out.push_str(&format!(
        "\n\nTotal: {}  Existing: {}  Missing: {}\nRuntime: {}",
        report.total(),
        report.existing(),
        report.missing(),
        format_runtime(report.runtime)
    ));
    out
}

pub fn format_validation_json(report: &ValidationReport) -> Result<String, ManagerError> {
    Ok(serde_json::to_string_pretty(&validation_json(report))?)
}
