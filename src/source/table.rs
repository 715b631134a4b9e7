//! Numeric sensor tables read from CSV logs.

use crate::error::TableError;
use std::path::Path;

/// A sensor log held in memory: an elapsed-seconds index and numeric columns.
///
/// Cells that are empty or not numeric are stored as NaN.
#[derive(Debug, Clone, Default)]
pub struct SensorTable {
    index: Vec<f64>,
    columns: Vec<(String, Vec<f64>)>,
}

impl SensorTable {
    /// Build a table from an index and named columns of equal length.
    pub fn new(index: Vec<f64>, columns: Vec<(String, Vec<f64>)>) -> Self {
        debug_assert!(columns.iter().all(|(_, c)| c.len() == index.len()));
        Self { index, columns }
    }

    /// Read a CSV log, using `index_column` as the elapsed-seconds index.
    ///
    /// Gaps in the index are forward filled.
    pub fn read_csv(path: &Path, index_column: &str) -> Result<Self, TableError> {
        let csv_err = |source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?.clone();
        let index_pos = headers
            .iter()
            .position(|h| h == index_column)
            .ok_or_else(|| TableError::MissingColumn {
                path: path.to_path_buf(),
                column: index_column.to_string(),
            })?;

        let mut index = Vec::new();
        let mut columns: Vec<(String, Vec<f64>)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index_pos)
            .map(|(_, h)| (h.to_string(), Vec::new()))
            .collect();

        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            index.push(parse_index_cell(record.get(index_pos)));

            let mut col = 0;
            for i in 0..headers.len() {
                if i == index_pos {
                    continue;
                }
                columns[col].1.push(parse_cell(record.get(i)));
                col += 1;
            }
        }

        forward_fill(&mut index);
        Ok(Self { index, columns })
    }

    pub fn index(&self) -> &[f64] {
        &self.index
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn parse_cell(cell: Option<&str>) -> f64 {
    cell.and_then(|c| c.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Index cells must be finite; anything else is a gap.
fn parse_index_cell(cell: Option<&str>) -> f64 {
    let value = parse_cell(cell);
    if value.is_finite() {
        value
    } else {
        f64::NAN
    }
}

/// Replace NaN entries with the last preceding non-NaN value.
fn forward_fill(values: &mut [f64]) {
    let mut last = f64::NAN;
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = last;
        } else {
            last = *v;
        }
    }
}
