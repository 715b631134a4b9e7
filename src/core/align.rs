//! Resampling sensor logs onto a fixed grid centred on a stimulus, and
//! aligning several devices' logs on a shared offset axis.
//!
//! Offsets are kept as integer deciseconds so grid points compare exactly.

use crate::core::stats::AggregateFn;
use crate::source::SensorTable;
use std::collections::BTreeMap;

/// Resampling period (5 samples per second).
pub const SAMPLE_PERIOD_MS: i64 = 200;

/// A sensor log resampled to `SAMPLE_PERIOD_MS` bins, indexed by offset from
/// a stimulus in deciseconds.
#[derive(Debug, Clone, Default)]
pub struct ResampledLog {
    offsets: Vec<i64>,
    columns: Vec<(String, Vec<f64>)>,
}

impl ResampledLog {
    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Samples of `name` with offsets in `[-span_ds, span_ds + 1]`.
    ///
    /// Returns `None` if the log has no such column.
    pub fn span(&self, name: &str, span_ds: i64) -> Option<Vec<(i64, f64)>> {
        let values = self.column(name)?;
        Some(
            self.offsets
                .iter()
                .zip(values)
                .filter(|&(&offset, _)| {
                    offset >= -span_ds && offset <= span_ds.saturating_add(1)
                })
                .map(|(&offset, &value)| (offset, value))
                .collect(),
        )
    }
}

/// Resample `table` into fixed bins and re-express the bins as offsets from
/// `stimulus_ms`.
///
/// Bins are aligned to multiples of the sample period since the epoch. Only
/// bins within `span_ds` deciseconds of the stimulus (plus one period of
/// margin either side) are built; bins without samples hold NaN. Rows whose
/// index is missing, non-finite or out of range are dropped.
pub fn normalize(
    table: &SensorTable,
    file_start_ms: i64,
    stimulus_ms: i64,
    span_ds: i64,
) -> ResampledLog {
    let limit_ms = span_ds.max(0).saturating_add(2).saturating_mul(100).unsigned_abs();
    let bins: Vec<Option<i64>> = table
        .index()
        .iter()
        .map(|&secs| {
            let bin = sample_bin(secs, file_start_ms)?;
            (bin.abs_diff(stimulus_ms) <= limit_ms).then_some(bin)
        })
        .collect();

    let (Some(first), Some(last)) = (
        bins.iter().flatten().min().copied(),
        bins.iter().flatten().max().copied(),
    ) else {
        return ResampledLog::default();
    };

    let bin_count = ((last - first) / SAMPLE_PERIOD_MS + 1) as usize;
    let offsets = (0..bin_count)
        .map(|i| {
            let bin = first + i as i64 * SAMPLE_PERIOD_MS;
            ((bin - stimulus_ms) as f64 / 100.0).round() as i64
        })
        .collect();

    let columns = table
        .columns()
        .iter()
        .map(|(name, values)| {
            let mut sums = vec![0.0; bin_count];
            let mut counts = vec![0usize; bin_count];
            for (bin, &value) in bins.iter().zip(values) {
                if let Some(bin) = bin {
                    if !value.is_nan() {
                        let slot = ((bin - first) / SAMPLE_PERIOD_MS) as usize;
                        sums[slot] += value;
                        counts[slot] += 1;
                    }
                }
            }
            let means = sums
                .iter()
                .zip(&counts)
                .map(|(&sum, &count)| {
                    if count == 0 {
                        f64::NAN
                    } else {
                        sum / count as f64
                    }
                })
                .collect();
            (name.clone(), means)
        })
        .collect();

    ResampledLog { offsets, columns }
}

/// Epoch-aligned bin of a sample `secs` after `file_start_ms`, or `None`
/// when the absolute time is not representable.
fn sample_bin(secs: f64, file_start_ms: i64) -> Option<i64> {
    let offset_ms = (secs * 1000.0).round();
    // i64 range, exclusive of the saturating edge
    if !offset_ms.is_finite() || offset_ms.abs() >= 9.0e18 {
        return None;
    }
    let abs_ms = (offset_ms as i64).checked_add(file_start_ms)?;
    Some(abs_ms.div_euclid(SAMPLE_PERIOD_MS) * SAMPLE_PERIOD_MS)
}

/// Shift a series whose grid falls on odd deciseconds onto the even grid.
pub fn align_to_even(series: &mut [(i64, f64)]) {
    if let Some(&(first, _)) = series.first() {
        if first.rem_euclid(2) == 1 {
            for (offset, _) in series.iter_mut() {
                *offset -= 1;
            }
        }
    }
}

/// Per-device series collected on a shared offset axis.
#[derive(Debug, Clone, Default)]
pub struct AlignedFrame {
    columns: Vec<(String, BTreeMap<i64, f64>)>,
}

impl AlignedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device's series. A device already present is replaced.
    pub fn insert(&mut self, name: impl Into<String>, series: Vec<(i64, f64)>) {
        let name = name.into();
        let values: BTreeMap<i64, f64> = series.into_iter().collect();
        match self.columns.iter().position(|(n, _)| *n == name) {
            Some(pos) => self.columns[pos].1 = values,
            None => self.columns.push((name, values)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Densify on the union of offsets and add the cross-device aggregate.
    pub fn finish(self, function: AggregateFn) -> AlignedTable {
        let mut offsets: Vec<i64> = self
            .columns
            .iter()
            .flat_map(|(_, values)| values.keys().copied())
            .collect();
        offsets.sort_unstable();
        offsets.dedup();

        let devices: Vec<(String, Vec<f64>)> = self
            .columns
            .into_iter()
            .map(|(name, values)| {
                let dense = offsets
                    .iter()
                    .map(|o| values.get(o).copied().unwrap_or(f64::NAN))
                    .collect();
                (name, dense)
            })
            .collect();

        let aggregate = (0..offsets.len())
            .map(|row| {
                let row_values: Vec<f64> = devices.iter().map(|(_, v)| v[row]).collect();
                function.apply_across(&row_values)
            })
            .collect();

        AlignedTable {
            offsets,
            devices,
            function,
            aggregate,
        }
    }
}

/// Devices aligned on a decisecond offset axis with an aggregate column.
#[derive(Debug, Clone)]
pub struct AlignedTable {
    pub offsets: Vec<i64>,
    pub devices: Vec<(String, Vec<f64>)>,
    pub function: AggregateFn,
    pub aggregate: Vec<f64>,
}

impl AlignedTable {
    /// Offset of a row in seconds.
    pub fn offset_secs(&self, row: usize) -> f64 {
        self.offsets[row] as f64 / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bins_and_offsets() {
        // file starts at 10_000 ms; samples every 100 ms for 1 s
        let index: Vec<f64> = (0..10).map(|i| i as f64 * 0.1).collect();
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let table = SensorTable::new(index, vec![("v".to_string(), values)]);

        let log = normalize(&table, 10_000, 10_400, 100);
        assert_eq!(log.offsets(), &[-4, -2, 0, 2, 4]);
        assert_eq!(log.column("v").unwrap(), &[0.5, 2.5, 4.5, 6.5, 8.5]);
    }

    #[test]
    fn test_normalize_empty_bins_are_nan() {
        let table = SensorTable::new(
            vec![0.0, f64::NAN, 0.6],
            vec![("v".to_string(), vec![1.0, 2.0, 3.0])],
        );
        let log = normalize(&table, 0, 0, 100);
        assert_eq!(log.offsets(), &[0, 2, 4, 6]);
        let v = log.column("v").unwrap();
        assert_eq!(v[0], 1.0);
        assert!(v[1].is_nan() && v[2].is_nan());
        assert_eq!(v[3], 3.0);
    }

    #[test]
    fn test_normalize_drops_unrepresentable_and_distant_samples() {
        let table = SensorTable::new(
            vec![0.0, f64::INFINITY, 1.0e9, 0.4, f64::NEG_INFINITY, 1.0e300],
            vec![("v".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])],
        );
        let log = normalize(&table, i64::MAX - 1_000, i64::MAX - 1_000, 10);
        assert_eq!(log.offsets(), &[0, 2, 4]);
        let v = log.column("v").unwrap();
        assert_eq!(v[0], 1.0);
        assert!(v[1].is_nan());
        assert_eq!(v[2], 4.0);
    }

    #[test]
    fn test_normalize_grid_is_bounded_by_span() {
        let table = SensorTable::new(
            vec![0.0, 0.2, 1.0e9],
            vec![("v".to_string(), vec![1.0, 2.0, 3.0])],
        );
        let log = normalize(&table, 0, 0, 100);
        assert_eq!(log.offsets(), &[0, 2]);
        assert_eq!(log.column("v").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_span_and_even_alignment() {
        let table = SensorTable::new(
            (0..20).map(|i| i as f64 * 0.2).collect(),
            vec![("v".to_string(), (0..20).map(|i| i as f64).collect())],
        );
        // stimulus 100 ms after a bin boundary gives odd offsets
        let log = normalize(&table, 0, 1_900, 5);
        let mut span = log.span("v", 5).unwrap();
        assert_eq!(span.first().unwrap().0, -5);
        assert_eq!(span.last().unwrap().0, 5);

        align_to_even(&mut span);
        assert!(span.iter().all(|(o, _)| o.rem_euclid(2) == 0));
        assert_eq!(span.first().unwrap().0, -6);

        assert!(log.span("missing", 5).is_none());
    }

    #[test]
    fn test_frame_union_and_aggregate() {
        let mut frame = AlignedFrame::new();
        frame.insert("02", vec![(0, 1.0), (2, 3.0)]);
        frame.insert("03", vec![(2, 5.0), (4, 7.0)]);

        let table = frame.finish(AggregateFn::Mean);
        assert_eq!(table.offsets, vec![0, 2, 4]);
        assert_eq!(table.aggregate, vec![1.0, 4.0, 7.0]);
        assert!(table.devices[1].1[0].is_nan());
        assert_eq!(table.offset_secs(2), 0.4);
    }

    #[test]
    fn test_frame_std_is_sample_std() {
        let mut frame = AlignedFrame::new();
        frame.insert("02", vec![(0, 1.0), (2, 4.0)]);
        frame.insert("03", vec![(0, 3.0)]);

        let table = frame.finish(AggregateFn::Std);
        assert!((table.aggregate[0] - 2.0_f64.sqrt()).abs() < 1e-12);
        // a single device has no sample spread
        assert!(table.aggregate[1].is_nan());
    }

    #[test]
    fn test_frame_replaces_device() {
        let mut frame = AlignedFrame::new();
        frame.insert("02", vec![(0, 1.0)]);
        frame.insert("02", vec![(0, 9.0)]);
        let table = frame.finish(AggregateFn::Max);
        assert_eq!(table.devices.len(), 1);
        assert_eq!(table.aggregate, vec![9.0]);
    }
}
