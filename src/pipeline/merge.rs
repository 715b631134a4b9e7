//! Merging windowed sensor aggregates into a survey table.

use crate::config::MergeConfig;
use crate::core::{aggregate, merge, AggregateFn, ModalityOutcome, QueryWindow};
use crate::error::{LocateError, RunError, TableError};
use crate::pipeline::{format_value, RecordTable};
use crate::report::RunLog;
use crate::source::{locate, DeviceId, Modality, SensorTable, Tolerance};
use crate::timestamp::parse_epoch_millis;
use std::path::Path;
use tracing::{debug, info, warn};

/// Output label of a screen timestamp column: the text after `time_`, or
/// the whole name.
pub fn window_label(column: &str) -> &str {
    match column.find("time_") {
        Some(pos) => &column[pos + "time_".len()..],
        None => column,
    }
}

/// Query one modality for one row window.
///
/// Every failure is folded into [`ModalityOutcome::Failed`] so it only
/// affects the row it belongs to.
pub fn query_modality(
    root: &Path,
    modality: Modality,
    device: &DeviceId,
    window: &QueryWindow,
    variables: &[String],
    functions: &[AggregateFn],
    log: &RunLog,
) -> ModalityOutcome {
    let file = match locate(root, modality, device, window.target_ms, Tolerance::MERGE) {
        Ok(Some(file)) => file,
        Ok(None) => {
            log.record_file_not_found();
            debug!(
                "no {} file for device {} within 30 minutes of {}",
                modality, device, window.target_ms
            );
            return ModalityOutcome::Failed(format!(
                "no {modality} file for device {device} near {}",
                window.target_ms
            ));
        }
        Err(e) => {
            log.record_query_failure();
            warn!("{}", e);
            return ModalityOutcome::Failed(e.to_string());
        }
    };

    let table = match SensorTable::read_csv(&file.path, modality.index_column()) {
        Ok(table) => table,
        Err(e) => {
            log.record_query_failure();
            warn!("{}", e);
            return ModalityOutcome::Failed(e.to_string());
        }
    };

    log.record_file_located();
    let result = aggregate(&table, window, file.start_ms, variables, functions);
    log.record_variables_missing(result.missing.len() as u64);
    debug!(
        path = %file.path.display(),
        missing = ?result.missing,
        "aggregated {} window",
        modality
    );
    ModalityOutcome::Resolved(result)
}

/// Run a merge: augment the survey table with one column per
/// `(window, variable, function)` and write it to the configured output.
pub fn run_merge(config: &MergeConfig, log: &RunLog) -> Result<RecordTable, RunError> {
    let functions = config.validate()?;

    for modality in [Modality::Afdx, Modality::Leda] {
        let dir = config.data_root.join(modality.dir_name());
        std::fs::read_dir(&dir).map_err(|source| LocateError { path: dir, source })?;
    }

    let mut table = RecordTable::read_csv(&config.input_table)?;
    let id_column = table
        .column_index(&config.id_column)
        .ok_or_else(|| TableError::MissingColumn {
            path: config.input_table.clone(),
            column: config.id_column.clone(),
        })?;

    let windows: Vec<(usize, String)> = config
        .window_columns
        .iter()
        .filter_map(|name| match table.column_index(name) {
            Some(index) => Some((index, window_label(name).to_string())),
            None => {
                warn!("window column '{}' not in survey table, skipping", name);
                None
            }
        })
        .collect();

    let width = config.variables.len() * functions.len();
    let mut new_headers = Vec::with_capacity(windows.len() * width);
    for (_, label) in &windows {
        for variable in &config.variables {
            for function in &functions {
                new_headers.push(format!("{label}_{variable}_{function}"));
            }
        }
    }

    info!(
        rows = table.rows.len(),
        windows = windows.len(),
        columns = new_headers.len(),
        "merging sensor aggregates"
    );

    let mut appended: Vec<Vec<String>> = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        log.record_row_processed();
        let device = DeviceId::from_label(table.cell(row, id_column));
        let mut values = Vec::with_capacity(new_headers.len());

        for (column, label) in &windows {
            let target = parse_epoch_millis(table.cell(row, *column));
            let row_values = match (&device, target) {
                (Ok(device), Ok(target_ms)) => {
                    let window = QueryWindow::new(target_ms, config.window_secs);
                    let primary = query_modality(
                        &config.data_root,
                        Modality::Afdx,
                        device,
                        &window,
                        &config.variables,
                        &functions,
                        log,
                    );
                    let secondary = query_modality(
                        &config.data_root,
                        Modality::Leda,
                        device,
                        &window,
                        &config.variables,
                        &functions,
                        log,
                    );
                    merge(&primary, &secondary, config.variables.len(), functions.len())
                }
                (Err(e), _) => {
                    log.record_row_skipped();
                    warn!("row {} window {}: {}", row, label, e);
                    vec![f64::NAN; width]
                }
                (_, Err(e)) => {
                    log.record_row_skipped();
                    warn!("row {} window {}: {}", row, label, e);
                    vec![f64::NAN; width]
                }
            };
            values.extend(row_values.into_iter().map(format_value));
        }

        appended.push(values);
    }

    table.headers.extend(new_headers);
    for (row, values) in table.rows.iter_mut().zip(appended) {
        row.extend(values);
    }

    table.write_csv(&config.output_path)?;
    info!(path = %config.output_path.display(), "wrote merged table");
    Ok(table)
}
