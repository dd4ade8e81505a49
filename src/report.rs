//! Run report files: creation summary (text), validation results and deletion
//! summary (JSON), and the CSV export of an aggregate.

use crate::aggregate::Aggregate;
use crate::error::ManagerError;
use crate::pipeline::{CreationReport, DeletionReport, ValidationReport, DELETION_COLUMNS};
use chrono::Local;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

pub const CSV_HEADER: [&str; 4] = ["Subscription", "Status", "Snapshot", "Error"];

/// Text body of the creation summary file.
pub fn creation_summary_text(report: &CreationReport) -> String {
    let successes = report.successes();
    let failures = report.failures();
    let mut text = String::from("Snapshot Creation Summary\n");
    text.push_str(&format!("Ticket: {}\n", report.ticket));
    text.push_str(&format!("Total VMs processed: {}\n", report.total()));
    text.push_str(&format!("Successful snapshots: {}\n", successes.len()));
    text.push_str(&format!("Failed snapshots: {}\n", failures.len()));
    if report.interrupted() {
        text.push_str(&format!("Skipped after interrupt: {}\n", report.skipped));
    }
    text.push_str("\nSuccessful snapshots:\n");
    for (vm, snapshot) in &successes {
        text.push_str(&format!("- {}: {}\n", vm, snapshot));
    }
    text.push_str("\nFailed snapshots:\n");
    for (vm, reason) in &failures {
        text.push_str(&format!("- {}: {}\n", vm, reason));
    }
    text
}

pub fn write_creation_summary(path: &Path, report: &CreationReport) -> Result<(), ManagerError> {
    fs::write(path, creation_summary_text(report))?;
    info!(path = %path.display(), "wrote creation summary");
    Ok(())
}

pub fn validation_json(report: &ValidationReport) -> serde_json::Value {
    json!({
        "generated_at": Local::now().to_rfc3339(),
        "total": report.total(),
        "existing": report.existing(),
        "missing": report.missing(),
        "runtime_secs": report.runtime.as_secs_f64(),
        "snapshots": report.details,
    })
}

pub fn write_validation_results(path: &Path, report: &ValidationReport) -> Result<(), ManagerError> {
    let text = serde_json::to_string_pretty(&validation_json(report))?;
    fs::write(path, text)?;
    info!(path = %path.display(), "wrote validation results");
    Ok(())
}

pub fn deletion_json(report: &DeletionReport) -> serde_json::Value {
    let table = report.aggregate.summary(&DELETION_COLUMNS);
    let columns: Vec<&str> = table.columns.iter().map(|tag| tag.as_str()).collect();
    let row = |group: &str, counts: &[usize]| {
        let mut entry = serde_json::Map::new();
        entry.insert("subscription".to_string(), json!(group));
        for (column, count) in columns.iter().zip(counts) {
            entry.insert((*column).to_string(), json!(count));
        }
        serde_json::Value::Object(entry)
    };
    let rows: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|r| row(&r.group, &r.counts))
        .collect();

    json!({
        "generated_at": Local::now().to_rfc3339(),
        "requested": report.requested,
        "confirmed": report.confirmed,
        "interrupted": report.interrupted,
        "runtime_secs": report.runtime.as_secs_f64(),
        "summary": rows,
        "totals": row(&table.totals.group, &table.totals.counts),
        "results": report.aggregate,
        "locks": {
            "scopes": report.scopes,
            "removed": report.removed_locks,
            "removal_failures": report.lock_failures,
            "restored": report.restore.restored,
            "restore_failures": report.restore.failures,
        },
    })
}

pub fn write_deletion_summary(path: &Path, report: &DeletionReport) -> Result<(), ManagerError> {
    let text = serde_json::to_string_pretty(&deletion_json(report))?;
    fs::write(path, text)?;
    info!(path = %path.display(), "wrote deletion summary");
    Ok(())
}

/// Write one CSV row per aggregate payload. Returns the number of rows.
pub fn export_csv(path: &Path, aggregate: &Aggregate) -> Result<usize, ManagerError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    let records = aggregate.export_records();
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = records.len(), "exported CSV");
    Ok(records.len())
}
