//! JSON export functionality
//!
//! Writes the experiment inventory inside an envelope carrying export
//! metadata and repository totals.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::ExportableExperiment;
use crate::CommandError;

/// Complete export structure for JSON
#[derive(Debug, Clone, Serialize)]
pub struct InventoryExportJson {
    pub export_date: String,
    pub export_version: &'static str,
    pub total_experiments: usize,
    pub total_files: usize,
    pub experiments: Vec<ExportableExperiment>,
}

const EXPORT_VERSION: &str = "1.0.0";

/// Write the experiment inventory to a JSON file
pub fn write_inventory_json(
    rows: &[ExportableExperiment],
    path: &Path,
) -> Result<(), CommandError> {
    let export = InventoryExportJson {
        export_date: chrono::Utc::now().to_rfc3339(),
        export_version: EXPORT_VERSION,
        total_experiments: rows.len(),
        total_files: rows.iter().map(|row| row.file_count).sum(),
        experiments: rows.to_vec(),
    };

    let json = serde_json::to_string_pretty(&export)
        .map_err(|e| CommandError::Internal(format!("Failed to serialize JSON: {}", e)))?;

    let mut file = std::fs::File::create(path)
        .map_err(|e| CommandError::Internal(format!("Failed to create JSON file: {}", e)))?;

    file.write_all(json.as_bytes())
        .map_err(|e| CommandError::Internal(format!("Failed to write JSON file: {}", e)))?;

    Ok(())
}
