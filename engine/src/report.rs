//! Dry-run report accumulation and CSV output.

use std::path::Path;

use busync_types::Decision;

/// Deterministic report location, overwritten on every dry-run execution.
pub const REPORT_FILE_NAME: &str = "dry_run_bu_assignments.csv";

const HEADER: [&str; 8] = [
    "app_name",
    "app_guid",
    "unit_key",
    "current_bu_guid",
    "target_bu_guid",
    "would_create_unit",
    "action",
    "note",
];

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode report row: {0}")]
    Encode(#[from] csv::Error),
}

/// Serialize decisions to a CSV file, one row per processed application.
pub fn write_report(path: &Path, decisions: &[Decision]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;

    for decision in decisions {
        writer.write_record([
            decision.app_name.as_str(),
            decision.app_guid.as_ref().map_or("", |guid| guid.as_str()),
            decision.unit_key.as_ref().map_or("", |key| key.as_str()),
            decision
                .current_unit
                .as_ref()
                .map_or("", |guid| guid.as_str()),
            decision
                .target_unit
                .as_ref()
                .map_or("", |guid| guid.as_str()),
            if decision.would_create_unit { "true" } else { "false" },
            decision.action.as_str(),
            decision.note.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
