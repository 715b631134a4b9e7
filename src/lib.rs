//! Sensor Query Merge - windowed sensor-log queries for behavioral research.
//!
//! Research sessions record two sensor modalities per lab computer: a
//! facial-expression log and a skin-conductance log. Survey software records
//! when each screen was shown. This library finds the log covering each
//! screen, aggregates the samples in a window after it, and splices both
//! modalities' results back into the survey table by variable position.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Sensor Query Merge                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Locator   │──▶│  Windowed   │──▶│   Merger    │──▶ CSV  │
//! │  │ (Afdx/Leda) │   │ Aggregator  │   │ (by pos.)   │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         │                                                    │
//! │         ▼                                                    │
//! │  ┌─────────────┐   ┌─────────────┐                           │
//! │  │  Resampler  │──▶│   Aligner   │──▶ CSV                    │
//! │  │   (5 Hz)    │   │ (devices)   │                           │
//! │  └─────────────┘   └─────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sensor_query_merge::{config::MergeConfig, pipeline, report::RunLog};
//!
//! let config = MergeConfig {
//!     input_table: "survey.csv".into(),
//!     window_columns: vec!["player_time_screen3".to_string()],
//!     variables: vec!["joy".to_string(), "analysis.phasicData".to_string()],
//!     ..MergeConfig::default()
//! };
//! let log = RunLog::new();
//! pipeline::run_merge(&config, &log).expect("merge failed");
//! println!("{}", log.summary());
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod timestamp;

// Re-export key types at crate root for convenience
pub use config::{AlignConfig, Config, MergeConfig};
pub use crate::core::{aggregate, merge, AggregateFn, AggregateResult, ModalityOutcome, QueryWindow};
pub use error::{ConfigError, LocateError, ParseError, RunError, TableError};
pub use report::{RunLog, RunStats};
pub use source::{locate, DeviceId, Modality, SensorFile, SensorTable, Tolerance};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
