//! Run log.
//!
//! Tracks what a merge or align run did: rows handled, sensor files found
//! or missing, and recoverable problems that were skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the current run.
#[derive(Debug)]
pub struct RunLog {
    /// Survey or event rows handled
    rows_processed: AtomicU64,
    /// Row windows skipped because of unparseable timestamps or labels
    rows_skipped: AtomicU64,
    /// Sensor files located and aggregated
    files_located: AtomicU64,
    /// Queries for which no file matched
    files_not_found: AtomicU64,
    /// Queries that failed reading or interpreting a located file
    query_failures: AtomicU64,
    /// Requested variables absent from a located file
    variables_missing: AtomicU64,
    /// Run start time
    run_start: DateTime<Utc>,
}

impl RunLog {
    /// Create a new run log.
    pub fn new() -> Self {
        Self {
            rows_processed: AtomicU64::new(0),
            rows_skipped: AtomicU64::new(0),
            files_located: AtomicU64::new(0),
            files_not_found: AtomicU64::new(0),
            query_failures: AtomicU64::new(0),
            variables_missing: AtomicU64::new(0),
            run_start: Utc::now(),
        }
    }

    pub fn record_row_processed(&self) {
        self.rows_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_row_skipped(&self) {
        self.rows_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_located(&self) {
        self.files_located.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_not_found(&self) {
        self.files_not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query_failure(&self) {
        self.query_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record variables missing from a located file.
    pub fn record_variables_missing(&self, count: u64) {
        self.variables_missing.fetch_add(count, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> RunStats {
        RunStats {
            rows_processed: self.rows_processed.load(Ordering::Relaxed),
            rows_skipped: self.rows_skipped.load(Ordering::Relaxed),
            files_located: self.files_located.load(Ordering::Relaxed),
            files_not_found: self.files_not_found.load(Ordering::Relaxed),
            query_failures: self.query_failures.load(Ordering::Relaxed),
            variables_missing: self.variables_missing.load(Ordering::Relaxed),
            run_start: self.run_start,
            run_duration_ms: (Utc::now() - self.run_start).num_milliseconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run Statistics:\n\
             - Rows processed: {}\n\
             - Rows skipped: {}\n\
             - Sensor files located: {}\n\
             - Queries without a matching file: {}\n\
             - Queries failed: {}\n\
             - Variables missing from located files: {}\n\
             - Run duration: {} ms",
            stats.rows_processed,
            stats.rows_skipped,
            stats.files_located,
            stats.files_not_found,
            stats.query_failures,
            stats.variables_missing,
            stats.run_duration_ms
        )
    }

    /// Save stats to disk as JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.stats()).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub rows_processed: u64,
    pub rows_skipped: u64,
    pub files_located: u64,
    pub files_not_found: u64,
    pub query_failures: u64,
    pub variables_missing: u64,
    pub run_start: DateTime<Utc>,
    pub run_duration_ms: u64,
}
