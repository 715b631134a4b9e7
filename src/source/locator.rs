//! Locating the sensor log that covers a target timestamp.

use crate::error::LocateError;
use crate::source::types::{parse_file_name, DeviceId, Modality, SensorFile};
use std::path::{Path, PathBuf};

const MINUTE_MS: i64 = 60 * 1000;

/// Which file start timestamps are admissible for a target timestamp.
///
/// The resampling and merge call sites use different windows for the same
/// lookup; both are kept as named policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tolerance {
    /// File must start no later than `target + slack_ms`
    NotAfter { slack_ms: i64 },
    /// File must start within `radius_ms` of the target on either side
    Within { radius_ms: i64 },
}

impl Tolerance {
    /// Policy used when aligning logs around stimulus events.
    pub const RESAMPLE: Tolerance = Tolerance::NotAfter {
        slack_ms: 10 * MINUTE_MS,
    };

    /// Policy used when merging aggregates into survey rows.
    pub const MERGE: Tolerance = Tolerance::Within {
        radius_ms: 30 * MINUTE_MS,
    };

    pub fn admits(&self, file_start_ms: i64, target_ms: i64) -> bool {
        match *self {
            Tolerance::NotAfter { slack_ms } => {
                file_start_ms <= target_ms.saturating_add(slack_ms)
            }
            Tolerance::Within { radius_ms } => {
                radius_ms >= 0 && file_start_ms.abs_diff(target_ms) <= radius_ms as u64
            }
        }
    }
}

/// Find the log of `modality` recorded on `device` closest to `target_ms`.
///
/// Scans `root/<modality dir>/` recursively, visiting entries in file-name
/// order. Files whose names do not parse are skipped. Returns `Ok(None)` when
/// no file is admitted by `tolerance`.
pub fn locate(
    root: &Path,
    modality: Modality,
    device: &DeviceId,
    target_ms: i64,
    tolerance: Tolerance,
) -> Result<Option<SensorFile>, LocateError> {
    let dir = root.join(modality.dir_name());
    let mut candidates = Vec::new();
    collect_candidates(&dir, modality, &mut candidates)?;

    let mut best: Option<(u64, SensorFile)> = None;
    for path in candidates {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let (file_device, start_ms) = match parse_file_name(name) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if &file_device != device || !tolerance.admits(start_ms, target_ms) {
            continue;
        }

        let diff = start_ms.abs_diff(target_ms);
        // strict comparison keeps the first file on ties
        if best.as_ref().map_or(true, |(closest, _)| diff < *closest) {
            best = Some((
                diff,
                SensorFile {
                    modality,
                    device: file_device,
                    start_ms,
                    path,
                },
            ));
        }
    }

    Ok(best.map(|(_, file)| file))
}

/// Recursively collect `.csv` files whose stem starts with the modality
/// prefix, in file-name order.
fn collect_candidates(
    dir: &Path,
    modality: Modality,
    out: &mut Vec<PathBuf>,
) -> Result<(), LocateError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|source| LocateError {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_candidates(&path, modality, out)?;
            continue;
        }

        let is_csv = path.extension().map(|e| e == "csv").unwrap_or(false);
        let has_prefix = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.starts_with(modality.file_prefix()))
            .unwrap_or(false);

        if is_csv && has_prefix {
            out.push(path);
        }
    }

    Ok(())
}
