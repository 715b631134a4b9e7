//! Windowed aggregation over sensor tables.
//!
//! A query window starts at a target timestamp and extends for a fixed
//! number of seconds. It is expressed in the table's own elapsed-seconds
//! index, so the file's start timestamp is needed to place it.

use crate::core::stats::AggregateFn;
use crate::source::SensorTable;
use serde::{Deserialize, Serialize};

/// A time window after an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryWindow {
    /// Event timestamp, epoch milliseconds
    pub target_ms: i64,
    /// Window length in seconds
    pub length_secs: f64,
}

impl QueryWindow {
    pub fn new(target_ms: i64, length_secs: f64) -> Self {
        Self {
            target_ms,
            length_secs,
        }
    }

    /// Window bounds in seconds elapsed since `file_start_ms`, inclusive.
    pub fn bounds(&self, file_start_ms: i64) -> (f64, f64) {
        let offset_ms = i128::from(self.target_ms) - i128::from(file_start_ms);
        let start = offset_ms as f64 / 1000.0;
        (start, start + self.length_secs)
    }

    /// Check if an elapsed-seconds index value falls within this window.
    pub fn contains(&self, file_start_ms: i64, elapsed_secs: f64) -> bool {
        let (start, end) = self.bounds(file_start_ms);
        elapsed_secs >= start && elapsed_secs <= end
    }
}

/// Aggregates for the variables a table carries, plus the positions of
/// those it does not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    /// One list per present variable, one value per function
    pub values: Vec<Vec<f64>>,
    /// Ascending positions (in the requested list) of absent variables
    pub missing: Vec<usize>,
}

impl AggregateResult {
    /// Expand into `(position, values)` pairs for the present variables.
    pub fn by_position(&self) -> impl Iterator<Item = (usize, &[f64])> + '_ {
        let total = self.values.len() + self.missing.len();
        (0..total)
            .filter(|i| self.missing.binary_search(i).is_err())
            .zip(self.values.iter().map(|v| v.as_slice()))
    }

    /// True when no present variable produced a non-NaN value.
    pub fn is_all_nan(&self) -> bool {
        self.values.iter().flatten().all(|v| v.is_nan())
    }
}

/// Compute every `(variable, function)` value over the rows of `table`
/// inside `window`.
pub fn aggregate(
    table: &SensorTable,
    window: &QueryWindow,
    file_start_ms: i64,
    variables: &[String],
    functions: &[AggregateFn],
) -> AggregateResult {
    let mut result = AggregateResult::default();

    let rows: Vec<usize> = table
        .index()
        .iter()
        .enumerate()
        .filter(|&(_, &t)| window.contains(file_start_ms, t))
        .map(|(i, _)| i)
        .collect();

    for (pos, var) in variables.iter().enumerate() {
        let Some(column) = table.column(var) else {
            result.missing.push(pos);
            continue;
        };

        let selected: Vec<f64> = rows.iter().map(|&i| column[i]).collect();
        result
            .values
            .push(functions.iter().map(|f| f.apply(&selected)).collect());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SensorTable {
        SensorTable::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![
                ("a".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
                ("c".to_string(), vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]),
            ],
        )
    }

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_window_bounds() {
        let window = QueryWindow::new(12_000, 20.0);
        assert_eq!(window.bounds(10_000), (2.0, 22.0));
        assert!(window.contains(10_000, 2.0));
        assert!(window.contains(10_000, 22.0));
        assert!(!window.contains(10_000, 22.1));
    }

    #[test]
    fn test_window_bounds_at_timestamp_extremes() {
        let window = QueryWindow::new(i64::MIN, 20.0);
        let (start, end) = window.bounds(1_000_000);
        assert!(start < -9.0e15);
        assert!(end < -9.0e15);
        assert!(!window.contains(1_000_000, 0.0));
    }

    #[test]
    fn test_aggregate_inclusive_window() {
        // file starts 1s before target: window covers elapsed 1..=3
        let window = QueryWindow::new(2_000, 2.0);
        let result = aggregate(
            &table(),
            &window,
            1_000,
            &vars(&["a", "c"]),
            &[AggregateFn::Mean, AggregateFn::Max],
        );

        assert!(result.missing.is_empty());
        assert_eq!(result.values, vec![vec![3.0, 4.0], vec![30.0, 40.0]]);
    }

    #[test]
    fn test_missing_positions() {
        let window = QueryWindow::new(0, 10.0);
        let result = aggregate(
            &table(),
            &window,
            0,
            &vars(&["x", "a", "b", "c", "y"]),
            &[AggregateFn::Min],
        );

        assert_eq!(result.missing, vec![0, 2, 4]);
        assert_eq!(result.values, vec![vec![1.0], vec![10.0]]);

        let positions: Vec<usize> = result.by_position().map(|(i, _)| i).collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[test]
    fn test_empty_variable_list() {
        let result = aggregate(
            &table(),
            &QueryWindow::new(0, 10.0),
            0,
            &[],
            &[AggregateFn::Mean],
        );
        assert!(result.values.is_empty());
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_empty_window_yields_nan() {
        // window starts 100s after the last sample
        let window = QueryWindow::new(105_000, 20.0);
        let functions = [
            AggregateFn::Mean,
            AggregateFn::Std,
            AggregateFn::Min,
            AggregateFn::Max,
        ];
        let result = aggregate(&table(), &window, 0, &vars(&["a", "c"]), &functions);

        assert_eq!(result.values.len(), 2);
        assert!(result.values.iter().flatten().all(|v| v.is_nan()));
        assert!(result.is_all_nan());
    }

    #[test]
    fn test_zero_row_table() {
        let empty = SensorTable::new(vec![], vec![("a".to_string(), vec![])]);
        let result = aggregate(
            &empty,
            &QueryWindow::new(0, 20.0),
            0,
            &vars(&["a"]),
            &[AggregateFn::Mean],
        );
        assert!(result.values[0][0].is_nan());
    }
}
