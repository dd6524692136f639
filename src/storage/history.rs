//! Report History Storage
//!
//! Persists analysis reports to Sled DB so earlier uploads can be listed and
//! reopened. Two trees:
//!
//! - `reports`: report id (16 bytes) -> JSON `StoredReport`
//! - `user_index`: `user \0 seq_be` -> report id
//!
//! `seq` comes from `Db::generate_id`, so a prefix scan over one user walks
//! that user's reports in upload order.

use super::persistence::{PersistenceError, ReportMetadata, ReportStore, StoredReport};
use crate::report::AnalysisReport;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

const REPORTS_TREE: &str = "reports";
const USER_INDEX_TREE: &str = "user_index";

/// Sled-backed report store
#[derive(Clone)]
pub struct SledReportStore {
    db: sled::Db,
    reports: sled::Tree,
    user_index: sled::Tree,
    retain_per_user: usize,
}

impl SledReportStore {
    /// Open or create the store at `path`
    pub fn open<P: AsRef<Path>>(path: P, retain_per_user: usize) -> Result<Self, PersistenceError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let reports = db.open_tree(REPORTS_TREE)?;
        let user_index = db.open_tree(USER_INDEX_TREE)?;

        info!(path = %path_ref.display(), reports = reports.len(), "Report storage opened");

        Ok(Self {
            db,
            reports,
            user_index,
            retain_per_user,
        })
    }

    /// Total number of stored reports across users
    pub fn count(&self) -> usize {
        self.reports.len()
    }

    fn user_prefix(user: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(user.len() + 1);
        prefix.extend_from_slice(user.as_bytes());
        prefix.push(0);
        prefix
    }

    fn decode(value: &[u8]) -> Result<StoredReport, PersistenceError> {
        Ok(serde_json::from_slice(value)?)
    }

    fn parse_id(bytes: &[u8]) -> Option<Uuid> {
        Uuid::from_slice(bytes).ok()
    }

    /// Drop the user's oldest reports beyond the retention limit.
    fn enforce_retention(&self, user: &str) -> Result<usize, PersistenceError> {
        let keys = self
            .user_index
            .scan_prefix(Self::user_prefix(user))
            .collect::<Result<Vec<_>, _>>()?;

        let excess = keys.len().saturating_sub(self.retain_per_user);
        for (index_key, id) in keys.into_iter().take(excess) {
            self.reports.remove(&id)?;
            self.user_index.remove(index_key)?;
        }

        if excess > 0 {
            debug!(user, evicted = excess, "Evicted old reports");
        }
        Ok(excess)
    }
}

impl ReportStore for SledReportStore {
    fn store(
        &self,
        user: &str,
        metadata: ReportMetadata,
        report: &AnalysisReport,
    ) -> Result<StoredReport, PersistenceError> {
        let stored = StoredReport {
            id: Uuid::new_v4(),
            user: user.to_string(),
            metadata,
            report: report.clone(),
        };

        let value = serde_json::to_vec(&stored)?;
        let seq = self.db.generate_id()?;
        let mut index_key = Self::user_prefix(user);
        index_key.extend_from_slice(&seq.to_be_bytes());

        self.reports.insert(stored.id.as_bytes(), value)?;
        self.user_index.insert(index_key, &stored.id.as_bytes()[..])?;
        self.enforce_retention(user)?;
        self.db.flush()?;

        debug!(
            id = %stored.id,
            user,
            filename = %stored.metadata.filename,
            equipment = stored.metadata.equipment_count,
            "Stored report"
        );
        Ok(stored)
    }

    fn get(&self, id: Uuid) -> Result<Option<StoredReport>, PersistenceError> {
        match self.reports.get(id.as_bytes())? {
            Some(value) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    fn list_for_user(&self, user: &str, limit: usize) -> Result<Vec<StoredReport>, PersistenceError> {
        let mut out = Vec::with_capacity(limit.min(self.retain_per_user));

        for item in self.user_index.scan_prefix(Self::user_prefix(user)).rev() {
            if out.len() >= limit {
                break;
            }
            let (_key, id) = item?;
            let Some(value) = self.reports.get(&id)? else {
                warn!(user, "Index entry points at a missing report");
                continue;
            };
            match Self::decode(&value) {
                Ok(stored) => out.push(stored),
                Err(e) => {
                    warn!(user, error = %e, "Failed to deserialize stored report");
                }
            }
        }

        Ok(out)
    }

    fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        let Some(value) = self.reports.remove(id.as_bytes())? else {
            return Err(PersistenceError::NotFound);
        };

        // Index cleanup needs the owner; a corrupt record leaves a dangling entry that
        // list_for_user skips.
        if let Ok(stored) = Self::decode(&value) {
            for item in self.user_index.scan_prefix(Self::user_prefix(&stored.user)) {
                let (key, indexed) = item?;
                if Self::parse_id(&indexed) == Some(id) {
                    self.user_index.remove(key)?;
                    break;
                }
            }
        }
        self.db.flush()?;

        debug!(id = %id, "Deleted report");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
