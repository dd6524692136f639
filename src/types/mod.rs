//! Shared data structures for the equipment analysis pipeline
//!
//! - `equipment`: cleaned records, the dataset and the three numeric parameters
//! - `stats`: statistic result types and the `UndefinedReason` codes

mod equipment;
mod stats;

pub use equipment::*;
pub use stats::*;
