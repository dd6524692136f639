//! Upload boundary
//!
//! Validates a named CSV payload before any parsing, runs the analyzer and
//! records the report in a [`ReportStore`].

use crate::config::UploadConfig;
use crate::error::AnalysisError;
use crate::orchestrator::EquipmentAnalyzer;
use crate::report::AnalysisReport;
use crate::storage::{PersistenceError, ReportMetadata, ReportStore, StoredReport};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub user: String,
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadRequest {
    pub fn new(user: impl Into<String>, filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            user: user.into(),
            filename: filename.into(),
            content,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid file type: {filename}")]
    InvalidFileType { filename: String, expected: String },

    #[error("file too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("storage failed: {0}")]
    Storage(#[from] PersistenceError),
}

impl UploadError {
    /// True when the caller sent bad input, as opposed to an internal failure.
    pub const fn is_validation(&self) -> bool {
        match self {
            Self::InvalidFileType { .. } | Self::FileTooLarge { .. } => true,
            Self::Analysis(e) => e.is_validation(),
            Self::Storage(_) => false,
        }
    }

    /// Message safe to show to the uploader.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidFileType { expected, .. } => {
                format!("File must be a {}", expected.to_uppercase())
            }
            Self::FileTooLarge { max, .. } => {
                format!("File size exceeds {}MB limit", max.div_ceil(BYTES_PER_MB))
            }
            Self::Analysis(e) if e.is_validation() => e.to_string(),
            Self::Analysis(_) | Self::Storage(_) => "Analysis failed".to_string(),
        }
    }
}

/// What the uploader gets back.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub stored: StoredReport,
}

impl UploadReceipt {
    pub const fn id(&self) -> uuid::Uuid {
        self.stored.id
    }

    pub const fn report(&self) -> &AnalysisReport {
        &self.stored.report
    }
}

pub struct UploadService {
    analyzer: EquipmentAnalyzer,
    limits: UploadConfig,
    store: Arc<dyn ReportStore>,
}

impl UploadService {
    pub fn new(analyzer: EquipmentAnalyzer, store: Arc<dyn ReportStore>) -> Self {
        let limits = analyzer.config().upload.clone();
        Self {
            analyzer,
            limits,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Reject names without the allowed extension and oversized payloads.
    pub fn validate(&self, request: &UploadRequest) -> Result<(), UploadError> {
        let extension_ok = Path::new(&request.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.limits.allowed_extension));
        if !extension_ok {
            return Err(UploadError::InvalidFileType {
                filename: request.filename.clone(),
                expected: self.limits.allowed_extension.clone(),
            });
        }

        let size = request.content.len() as u64;
        if size > self.limits.max_file_bytes {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.limits.max_file_bytes,
            });
        }
        Ok(())
    }

    /// Validate, analyze and store one upload.
    pub fn handle(&self, request: &UploadRequest) -> Result<UploadReceipt, UploadError> {
        if let Err(e) = self.validate(request) {
            warn!(user = %request.user, filename = %request.filename, error = %e, "Upload rejected");
            return Err(e);
        }

        let report = match self.analyzer.analyze_bytes(&request.content) {
            Ok(report) => report,
            Err(e) => {
                warn!(user = %request.user, filename = %request.filename, error = %e, "Analysis failed");
                return Err(e.into());
            }
        };

        let metadata = ReportMetadata::now(
            request.filename.clone(),
            request.content.len() as u64,
            report.equipment_count(),
        );
        let stored = self.store.store(&request.user, metadata, &report)?;

        info!(
            id = %stored.id,
            user = %request.user,
            filename = %request.filename,
            equipment = stored.metadata.equipment_count,
            backend = self.store.backend_name(),
            "Upload analyzed"
        );
        Ok(UploadReceipt { stored })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::storage::InMemoryReportStore;

    fn service(max_bytes: u64) -> UploadService {
        let mut config = AnalyzerConfig::default();
        config.upload.max_file_bytes = max_bytes;
        UploadService::new(EquipmentAnalyzer::new(config), Arc::new(InMemoryReportStore::default()))
    }

    const CSV: &[u8] = b"Equipment Name,Type,Flowrate,Pressure,Temperature\nP1,Pump,100,5,70\n";

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let svc = service(1024);
        assert!(svc.validate(&UploadRequest::new("u", "DATA.CSV", CSV.to_vec())).is_ok());
        let err = svc
            .validate(&UploadRequest::new("u", "data.xlsx", CSV.to_vec()))
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidFileType { .. }));
        assert_eq!(err.user_message(), "File must be a CSV");
        assert!(err.is_validation());
    }

    #[test]
    fn test_no_extension_rejected() {
        let err = service(1024)
            .validate(&UploadRequest::new("u", "csv", CSV.to_vec()))
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidFileType { .. }));
    }

    #[test]
    fn test_size_cap() {
        let svc = service(10);
        let err = svc.validate(&UploadRequest::new("u", "a.csv", CSV.to_vec())).unwrap_err();
        assert!(matches!(err, UploadError::FileTooLarge { max: 10, .. }));
    }

    #[test]
    fn test_handle_stores_report() {
        let svc = service(1024);
        let receipt = svc.handle(&UploadRequest::new("u", "a.csv", CSV.to_vec())).unwrap();
        assert_eq!(receipt.stored.metadata.equipment_count, 1);
        assert_eq!(receipt.stored.metadata.file_size, CSV.len() as u64);
        assert!(svc.store().get(receipt.id()).unwrap().is_some());
    }

    #[test]
    fn test_schema_error_is_user_facing() {
        let svc = service(1024);
        let err = svc
            .handle(&UploadRequest::new("u", "a.csv", b"Type,Flowrate\nPump,1\n".to_vec()))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.user_message().contains("Equipment Name"));
    }

    #[test]
    fn test_internal_error_message_is_generic() {
        let err = UploadError::Analysis(AnalysisError::Internal("stack detail".into()));
        assert!(!err.is_validation());
        assert_eq!(err.user_message(), "Analysis failed");
    }
}
