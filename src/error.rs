//! Analysis error taxonomy.

use thiserror::Error;

/// Failures that abort an analysis call.
///
/// Validation failures carry enough detail for an actionable message. A
/// failing call never produces a partial report.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing required column: {column}")]
    Schema { column: String },

    #[error("Column '{column}' contains no parseable numeric values")]
    DataQuality { column: String },

    #[error("No valid equipment rows remain after cleaning")]
    EmptyDataset,

    #[error("Malformed CSV: {0}")]
    Csv(String),

    #[error("Internal analysis error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Whether the failure is caused by the uploaded data rather than the pipeline.
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}
