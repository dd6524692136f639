//! Report Storage
//!
//! Keeps the latest analysis reports per user. The upload path only sees the
//! [`ReportStore`] trait; `open_configured` picks the sled backend from config.

pub mod history;
pub mod persistence;

pub use history::SledReportStore;
pub use persistence::{InMemoryReportStore, PersistenceError, ReportMetadata, ReportStore, StoredReport};

use crate::config::StorageConfig;

/// Open the durable store described by `[storage]`.
pub fn open_configured(config: &StorageConfig) -> Result<SledReportStore, PersistenceError> {
    SledReportStore::open(&config.path, config.retain_per_user)
}
