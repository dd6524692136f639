//! Equipment Analyzer: process equipment analytics
//!
//! Turns a CSV of equipment readings (flowrate, pressure, temperature per
//! named, typed unit) into a JSON-safe analysis report.
//!
//! ## Architecture
//!
//! - **Data Loader**: schema check, mean imputation, deficient-row and duplicate removal
//! - **Metrics Engine**: descriptive statistics, per-type metrics, correlation and zones
//! - **Insights Engine**: distributions, high-temperature scan, narrative insights
//! - **Outlier Engine**: IQR fences, Z-scores, consensus and multi-parameter patterns
//! - **Efficiency Engine**: normalization, type-aware scoring, rankings
//! - **Orchestrator**: runs every engine and assembles the [`AnalysisReport`]
//! - **Storage / Upload**: per-user report history behind the [`storage::ReportStore`] trait

pub mod config;
pub mod data_loader;
pub mod efficiency_engine;
pub mod error;
pub mod insights_engine;
pub mod metrics_engine;
pub mod orchestrator;
pub mod outlier_engine;
pub mod report;
pub mod stats;
pub mod storage;
pub mod types;
pub mod upload;

// Re-export configuration
pub use config::AnalyzerConfig;

// Re-export commonly used types
pub use types::{EquipmentDataset, EquipmentRecord, Parameter, RecordSummary};

pub use data_loader::{CleaningSummary, DataLoader, LoadedDataset};
pub use error::AnalysisError;
pub use orchestrator::EquipmentAnalyzer;
pub use report::AnalysisReport;

// Re-export engines
pub use efficiency_engine::EfficiencyEngine;
pub use insights_engine::InsightsEngine;
pub use metrics_engine::MetricsEngine;
pub use outlier_engine::OutlierEngine;

pub use storage::{InMemoryReportStore, PersistenceError, ReportStore, SledReportStore};
pub use upload::{UploadError, UploadRequest, UploadService};
