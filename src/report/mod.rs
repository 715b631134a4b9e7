//! Run reporting for the sensor query tool.
//!
//! Counts what a run located, skipped and failed on, so a researcher can
//! see how much of a merged table is backed by sensor data.

pub mod log;

// Re-export commonly used types
pub use log::{RunLog, RunStats};
