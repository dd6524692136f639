//! Numeric primitives shared by the analysis engines
//!
//! - `descriptive`: moments, linear-interpolated percentiles, the descriptive battery
//! - `correlation`: Pearson r with Student-t p-values (statrs)
//! - `normality`: Shapiro-Wilk test and the skew/kurtosis shape heuristic
//!
//! Functions here never return NaN: undefined results come back as `None`
//! or as an [`UndefinedReason`](crate::types::UndefinedReason).

pub mod correlation;
pub mod descriptive;
pub mod normality;

pub use correlation::CorrelationEngine;
pub use descriptive::{describe, mean, percentile, sorted, summarize};
pub use normality::{classify_shape, normality_test, shapiro_wilk};
