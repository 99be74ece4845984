//! Export module for CSV and JSON inventory export
//!
//! Writes the scanned experiment inventory to disk for reporting and
//! hand-off to other tools.

pub mod csv_export;
pub mod json_export;

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::summary::ExperimentSummary;
use crate::CommandError;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(CommandError::Internal(format!(
                "Invalid export format: {}. Use 'csv' or 'json'",
                other
            ))),
        }
    }
}

impl ExportFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Flat inventory record written by the exporters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportableExperiment {
    pub expid: String,
    pub kind: String,
    pub base_dir: String,
    pub has_params: bool,
    pub param_count: usize,
    pub stream_count: usize,
    pub file_count: usize,
}

impl From<&ExperimentSummary> for ExportableExperiment {
    fn from(summary: &ExperimentSummary) -> Self {
        Self {
            expid: summary.expid.clone(),
            kind: summary.kind.to_string(),
            base_dir: summary.base_dir.display().to_string(),
            has_params: summary.has_params,
            param_count: summary.param_count,
            stream_count: summary.stream_count,
            file_count: summary.file_count,
        }
    }
}

/// Get the default export directory (Downloads folder or fallback)
pub fn get_export_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::document_dir)
        .unwrap_or_else(std::env::temp_dir)
}

/// Generate a timestamped filename for an export
pub fn generate_export_filename(prefix: &str, extension: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.{}", prefix, timestamp, extension)
}
