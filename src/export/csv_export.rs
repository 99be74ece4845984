//! CSV export functionality
//!
//! Writes the flat experiment inventory with headers derived from the
//! record struct.

use std::path::Path;

use csv::Writer;

use super::ExportableExperiment;
use crate::CommandError;

/// Write the experiment inventory to a CSV file
pub fn write_inventory_csv(
    rows: &[ExportableExperiment],
    path: &Path,
) -> Result<(), CommandError> {
    let mut writer = Writer::from_path(path)
        .map_err(|e| CommandError::Internal(format!("Failed to create CSV file: {}", e)))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| CommandError::Internal(format!("Failed to write CSV row: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| CommandError::Internal(format!("Failed to flush CSV file: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_test_row() -> ExportableExperiment {
        ExportableExperiment {
            expid: "EXP003".to_string(),
            kind: "cosmos".to_string(),
            base_dir: "/repo/EXP003".to_string(),
            has_params: true,
            param_count: 5,
            stream_count: 3,
            file_count: 1200,
        }
    }

    #[test]
    fn test_write_inventory_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.csv");

        write_inventory_csv(&[create_test_row()], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "expid,kind,base_dir,has_params,param_count,stream_count,file_count"
        );
        assert_eq!(
            lines.next().unwrap(),
            "EXP003,cosmos,/repo/EXP003,true,5,3,1200"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_write_inventory_csv_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_inventory_csv(&[], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_inventory_csv_quotes_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quoted.csv");

        let mut row = create_test_row();
        row.base_dir = "/repo/with,comma".to_string();
        write_inventory_csv(&[row], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"/repo/with,comma\""));
    }
}
