//! System-wide default constants.
//!
//! Domain thresholds are fixed operating limits for the equipment classes in
//! scope; they are not derived from the uploaded data. Every value here can be
//! overridden through `analyzer_config.toml`.

// ============================================================================
// Operational thresholds
// ============================================================================

/// Temperature at or above which a unit counts as running hot (type metrics).
pub const OPERATIONAL_TEMPERATURE: f64 = 120.0;

/// Pressure at or above which a unit counts as high pressure (type metrics).
pub const OPERATIONAL_PRESSURE: f64 = 7.0;

/// Flowrate at or above which a unit counts as high flow (type metrics).
pub const OPERATIONAL_FLOWRATE: f64 = 140.0;

/// Default threshold for the high-temperature report section.
pub const HIGH_TEMPERATURE_THRESHOLD: f64 = 100.0;

// ============================================================================
// Outlier detection
// ============================================================================

/// Tukey fence multiplier applied to the IQR.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// |z| above which a value is a Z-score outlier.
pub const Z_SCORE_THRESHOLD: f64 = 2.0;

// ============================================================================
// Correlation
// ============================================================================

/// |r| at or above which a parameter pair is reported as strongly correlated.
pub const STRONG_CORRELATION: f64 = 0.7;

/// |r| at or above which a strong pair is labelled "Strong" rather than "Moderate".
pub const VERY_STRONG_CORRELATION: f64 = 0.8;

/// Shapiro-Wilk p-value above which a column is reported as normal.
pub const NORMALITY_ALPHA: f64 = 0.05;

/// |skewness| and |kurtosis| bound for the "Normal" shape heuristic.
pub const SHAPE_TOLERANCE: f64 = 0.5;

// ============================================================================
// Reporting
// ============================================================================

/// Number of entries in each top-performer list.
pub const TOP_PERFORMER_COUNT: usize = 5;

/// Value assigned to a min-max normalized column whose min equals its max.
pub const DEGENERATE_NORMALIZED_VALUE: f64 = 0.0;

// ============================================================================
// Upload boundary
// ============================================================================

/// Largest accepted upload (bytes). 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Required file extension for uploads (compared case-insensitively).
pub const UPLOAD_EXTENSION: &str = "csv";

// ============================================================================
// Persistence boundary
// ============================================================================

/// Reports kept per user; older ones are evicted on insert.
pub const REPORTS_RETAINED_PER_USER: usize = 5;

/// Default on-disk location of the report history database.
pub const REPORT_DB_PATH: &str = "./data/reports";
