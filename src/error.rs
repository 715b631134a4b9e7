//! Error types shared across the query pipeline.
//!
//! Recoverable conditions (a file that does not match, a malformed timestamp,
//! a column a table does not carry) are reported per query or per row.
//! Configuration and I/O errors on the run's own inputs are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed input that is skipped rather than aborting the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Sensor file name does not follow `<tag>_…-<device>_<start>_…`
    #[error("invalid sensor file name '{name}': {reason}")]
    FileName { name: String, reason: String },

    /// Timestamp string in none of the accepted formats
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    /// Participant label without a numeric device part
    #[error("invalid device label '{0}'")]
    DeviceLabel(String),

    /// Unknown modality name
    #[error("unknown modality '{0}' (expected afdx or leda)")]
    Modality(String),
}

/// Configuration errors. Always fatal, raised before any row is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown aggregate function '{0}'")]
    UnknownFunction(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors reading or writing a CSV table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },
}

/// Scanning a modality directory failed.
#[derive(Error, Debug)]
#[error("cannot scan {}: {source}", .path.display())]
pub struct LocateError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Fatal errors of a merge or align run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Table(#[from] TableError),

    /// Nothing survived alignment
    #[error("no {variable} data for any event in the requested span")]
    NoData { variable: String },
}
