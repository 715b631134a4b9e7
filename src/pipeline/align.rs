//! Aligning several devices' logs around stimulus events.

use crate::config::AlignConfig;
use crate::core::{align_to_even, normalize, AlignedFrame, AlignedTable};
use crate::error::{LocateError, RunError, TableError};
use crate::pipeline::{format_value, RecordTable};
use crate::report::RunLog;
use crate::source::{locate, DeviceId, SensorTable, Tolerance};
use crate::timestamp::{parse_epoch_millis, to_millis_magnitude};
use std::path::Path;
use tracing::{info, warn};

/// Run an align: resample each event's log around its stimulus, collect
/// the configured variable per device and add the cross-device aggregate.
///
/// The event table holds the device number in its first column and the
/// stimulus timestamp in its second.
pub fn run_align(config: &AlignConfig, log: &RunLog) -> Result<AlignedTable, RunError> {
    let function = config.validate()?;

    let dir = config.data_root.join(config.modality.dir_name());
    std::fs::read_dir(&dir).map_err(|source| LocateError { path: dir, source })?;

    let events = RecordTable::read_csv(&config.input_table)?;
    let span_ds = (config.span_secs * 10.0).round() as i64;
    let mut frame = AlignedFrame::new();

    for row in 0..events.rows.len() {
        log.record_row_processed();

        let device = match DeviceId::from_label(events.cell(row, 0)) {
            Ok(device) => device,
            Err(e) => {
                log.record_row_skipped();
                warn!("event {}: {}", row, e);
                continue;
            }
        };
        let stimulus_ms = match parse_epoch_millis(events.cell(row, 1)) {
            Ok(ts) => to_millis_magnitude(ts),
            Err(e) => {
                log.record_row_skipped();
                warn!("event {}: {}", row, e);
                continue;
            }
        };

        let file = match locate(
            &config.data_root,
            config.modality,
            &device,
            stimulus_ms,
            Tolerance::RESAMPLE,
        ) {
            Ok(Some(file)) => file,
            Ok(None) => {
                log.record_file_not_found();
                warn!(
                    "event {}: no {} file for device {} before {}",
                    row, config.modality, device, stimulus_ms
                );
                continue;
            }
            Err(e) => {
                log.record_query_failure();
                warn!("event {}: {}", row, e);
                continue;
            }
        };

        let table = match SensorTable::read_csv(&file.path, config.modality.index_column()) {
            Ok(table) => table,
            Err(e) => {
                log.record_query_failure();
                warn!("event {}: {}", row, e);
                continue;
            }
        };
        log.record_file_located();

        let resampled = normalize(&table, file.start_ms, stimulus_ms, span_ds);
        match resampled.span(&config.variable, span_ds) {
            None => {
                log.record_variables_missing(1);
                warn!(
                    "'{}' is not a column in {}",
                    config.variable,
                    file.path.display()
                );
            }
            Some(series) if series.is_empty() => {
                warn!(
                    "no {} data in range -{} to {} in {}",
                    config.variable,
                    config.span_secs,
                    config.span_secs,
                    file.path.display()
                );
            }
            Some(mut series) => {
                align_to_even(&mut series);
                frame.insert(file.device.as_str(), series);
            }
        }
    }

    if frame.is_empty() {
        return Err(RunError::NoData {
            variable: config.variable.clone(),
        });
    }

    let aligned = frame.finish(function);
    write_aligned(&aligned, &config.output_path)?;
    info!(
        devices = aligned.devices.len(),
        rows = aligned.offsets.len(),
        path = %config.output_path.display(),
        "wrote aligned table"
    );
    Ok(aligned)
}

/// Write an aligned table: offset in seconds, one column per device, then
/// the aggregate column.
pub fn write_aligned(aligned: &AlignedTable, path: &Path) -> Result<(), TableError> {
    let mut headers = vec!["offset_secs".to_string()];
    headers.extend(aligned.devices.iter().map(|(name, _)| name.clone()));
    headers.push(aligned.function.name().to_string());

    let rows = (0..aligned.offsets.len())
        .map(|row| {
            let mut cells = vec![format!("{:.1}", aligned.offset_secs(row))];
            cells.extend(aligned.devices.iter().map(|(_, v)| format_value(v[row])));
            cells.push(format_value(aligned.aggregate[row]));
            cells
        })
        .collect();

    RecordTable { headers, rows }.write_csv(path)
}
