//! Sensor log discovery and loading.
//!
//! This module provides the file naming scheme shared by both modalities,
//! the locator that picks the log covering a timestamp, and the CSV reader.

pub mod locator;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use locator::{locate, Tolerance};
pub use table::SensorTable;
pub use types::{parse_file_name, DeviceId, Modality, SensorFile};
