//! ReportStore trait - pluggable report persistence
//!
//! Abstracts where analysis reports live so the upload path does not care:
//! - `InMemoryReportStore`: for tests and one-shot CLI runs
//! - `SledReportStore`: durable local history
//!
//! Both backends keep only the newest `retain_per_user` reports per user and
//! evict older ones on insert.

use crate::report::AnalysisReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// Trait for pluggable persistence backends
///
/// Implementations must be thread-safe (Send + Sync) for shared access.
pub trait ReportStore: Send + Sync {
    /// Persist a report and return its new id.
    fn store(
        &self,
        user: &str,
        metadata: ReportMetadata,
        report: &AnalysisReport,
    ) -> Result<StoredReport, PersistenceError>;

    /// Fetch one report by id.
    fn get(&self, id: Uuid) -> Result<Option<StoredReport>, PersistenceError>;

    /// Newest first.
    fn list_for_user(&self, user: &str, limit: usize) -> Result<Vec<StoredReport>, PersistenceError>;

    /// Remove a report. `NotFound` if the id is unknown.
    fn delete(&self, id: Uuid) -> Result<(), PersistenceError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("not found")]
    NotFound,
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sled::Error> for PersistenceError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Upload facts recorded next to each report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub filename: String,
    pub file_size: u64,
    pub equipment_count: usize,
    pub upload_timestamp: DateTime<Utc>,
}

impl ReportMetadata {
    /// Metadata stamped with the current time.
    pub fn now(filename: impl Into<String>, file_size: u64, equipment_count: usize) -> Self {
        Self {
            filename: filename.into(),
            file_size,
            equipment_count,
            upload_timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: Uuid,
    pub user: String,
    pub metadata: ReportMetadata,
    pub report: AnalysisReport,
}

/// In-memory persistence for tests and single runs
///
/// Thread-safe via `RwLock`. Not durable.
pub struct InMemoryReportStore {
    reports: RwLock<Vec<StoredReport>>,
    retain_per_user: usize,
}

impl InMemoryReportStore {
    pub const fn new(retain_per_user: usize) -> Self {
        Self {
            reports: RwLock::new(Vec::new()),
            retain_per_user,
        }
    }

    pub fn len(&self) -> usize {
        self.reports.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new(crate::config::defaults::REPORTS_RETAINED_PER_USER)
    }
}

impl ReportStore for InMemoryReportStore {
    fn store(
        &self,
        user: &str,
        metadata: ReportMetadata,
        report: &AnalysisReport,
    ) -> Result<StoredReport, PersistenceError> {
        let mut store = self
            .reports
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let stored = StoredReport {
            id: Uuid::new_v4(),
            user: user.to_string(),
            metadata,
            report: report.clone(),
        };
        store.push(stored.clone());

        // Evict this user's oldest entries beyond the retention limit
        let owned = store.iter().filter(|r| r.user == user).count();
        let mut excess = owned.saturating_sub(self.retain_per_user);
        if excess > 0 {
            store.retain(|r| {
                if excess > 0 && r.user == user {
                    excess -= 1;
                    false
                } else {
                    true
                }
            });
        }

        Ok(stored)
    }

    fn get(&self, id: Uuid) -> Result<Option<StoredReport>, PersistenceError> {
        let store = self
            .reports
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        Ok(store.iter().find(|r| r.id == id).cloned())
    }

    fn list_for_user(&self, user: &str, limit: usize) -> Result<Vec<StoredReport>, PersistenceError> {
        let store = self
            .reports
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        Ok(store
            .iter()
            .rev()
            .filter(|r| r.user == user)
            .take(limit)
            .cloned()
            .collect())
    }

    fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        let mut store = self
            .reports
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let before = store.len();
        store.retain(|r| r.id != id);
        if store.len() == before {
            return Err(PersistenceError::NotFound);
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::Value;

    pub(crate) fn empty_report() -> AnalysisReport {
        AnalysisReport {
            summary_metrics: Value::Null,
            type_metrics: Value::Null,
            advanced_statistics: Value::Null,
            performance_statistics: Value::Null,
            distributions: Value::Null,
            correlations: Value::Null,
            high_temperature_analysis: Value::Null,
            top_performers: Value::Null,
            outliers: Value::Null,
            efficiency: Value::Null,
            comprehensive_insights: Value::Null,
            dataset_info: Value::Null,
            analysis_metadata: Value::Null,
        }
    }

    fn meta(name: &str) -> ReportMetadata {
        ReportMetadata::now(name, 128, 3)
    }

    #[test]
    fn test_store_and_get() {
        let store = InMemoryReportStore::default();
        let stored = store.store("alice", meta("a.csv"), &empty_report()).unwrap();
        let fetched = store.get(stored.id).unwrap().unwrap();
        assert_eq!(fetched.metadata.filename, "a.csv");
        assert_eq!(fetched.user, "alice");
    }

    #[test]
    fn test_list_newest_first_per_user() {
        let store = InMemoryReportStore::default();
        store.store("alice", meta("1.csv"), &empty_report()).unwrap();
        store.store("bob", meta("b.csv"), &empty_report()).unwrap();
        store.store("alice", meta("2.csv"), &empty_report()).unwrap();

        let list = store.list_for_user("alice", 10).unwrap();
        let names: Vec<&str> = list.iter().map(|r| r.metadata.filename.as_str()).collect();
        assert_eq!(names, vec!["2.csv", "1.csv"]);
    }

    #[test]
    fn test_retention_evicts_oldest_for_that_user_only() {
        let store = InMemoryReportStore::new(2);
        store.store("bob", meta("b.csv"), &empty_report()).unwrap();
        for i in 0..4 {
            store.store("alice", meta(&format!("{i}.csv")), &empty_report()).unwrap();
        }
        let alice = store.list_for_user("alice", 10).unwrap();
        let names: Vec<&str> = alice.iter().map(|r| r.metadata.filename.as_str()).collect();
        assert_eq!(names, vec!["3.csv", "2.csv"]);
        assert_eq!(store.list_for_user("bob", 10).unwrap().len(), 1);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_delete_unknown_is_not_found() {
        let store = InMemoryReportStore::default();
        let stored = store.store("alice", meta("a.csv"), &empty_report()).unwrap();
        store.delete(stored.id).unwrap();
        assert!(store.get(stored.id).unwrap().is_none());
        assert!(matches!(store.delete(stored.id), Err(PersistenceError::NotFound)));
    }

    #[test]
    fn test_trait_object() {
        let store: Box<dyn ReportStore> = Box::new(InMemoryReportStore::default());
        assert_eq!(store.backend_name(), "InMemory");
    }
}
