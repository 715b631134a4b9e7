//! Core functionality for the sensor query tool.
//!
//! This module contains:
//! - Aggregate functions over windows of samples
//! - Windowed aggregation of sensor tables around an event
//! - Position-aware merging of the two modalities' partial results
//! - Resampling and cross-device alignment around stimuli

pub mod align;
pub mod merge;
pub mod stats;
pub mod windowing;

// Re-export commonly used types
pub use align::{align_to_even, normalize, AlignedFrame, AlignedTable, ResampledLog};
pub use merge::{merge, ModalityOutcome};
pub use stats::{parse_functions, AggregateFn};
pub use windowing::{aggregate, AggregateResult, QueryWindow};
