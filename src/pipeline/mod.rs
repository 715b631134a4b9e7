//! Batch drivers: row loops over survey and event tables.
//!
//! Each row is queried independently. Problems local to a row (a timestamp
//! that does not parse, a log that cannot be read) are logged and leave
//! missing markers; only configuration and run-level I/O errors abort.

pub mod align;
pub mod merge;

pub use align::{run_align, write_aligned};
pub use merge::{query_modality, run_merge, window_label};

use crate::error::TableError;
use std::path::Path;

/// A CSV table kept as text, so input columns are written back untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        let csv_err = |source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let csv_err = |source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| TableError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;
        writer.write_record(&self.headers).map_err(csv_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell text, empty when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Format a value for an output cell. Missing values are written as `NaN`.
pub(crate) fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_table_round_trip_keeps_text() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(
            &input,
            ",participant_label,note\n0,LEEPS_2,\"a, b\"\n1,LEEPS_3,\n",
        )
        .unwrap();

        let table = RecordTable::read_csv(&input).unwrap();
        assert_eq!(table.headers, vec!["", "participant_label", "note"]);
        assert_eq!(table.cell(0, 2), "a, b");
        assert_eq!(table.cell(1, 2), "");
        assert_eq!(table.cell(5, 0), "");
        assert_eq!(table.column_index("participant_label"), Some(1));

        let output = dir.path().join("out").join("copy.csv");
        table.write_csv(&output).unwrap();
        assert_eq!(RecordTable::read_csv(&output).unwrap(), table);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(3.0), "3");
    }
}
