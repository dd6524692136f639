//! Upload Boundary Integration Tests
//!
//! Validation happens before any parsing; accepted uploads are analyzed and
//! land in the store with their metadata.

use equipment_analyzer::config::AnalyzerConfig;
use equipment_analyzer::{
    AnalysisError, EquipmentAnalyzer, InMemoryReportStore, ReportStore, SledReportStore, UploadError,
    UploadRequest, UploadService,
};
use std::sync::Arc;

const GOOD_CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
    P1,Pump,120,5.2,110\n\
    V1,Valve,40,3.1,65\n\
    HX1,HeatExchanger,80,4.0,150\n";

fn service_with(config: AnalyzerConfig, store: Arc<dyn ReportStore>) -> UploadService {
    UploadService::new(EquipmentAnalyzer::new(config), store)
}

fn in_memory_service() -> UploadService {
    service_with(AnalyzerConfig::default(), Arc::new(InMemoryReportStore::default()))
}

#[test]
fn accepted_upload_is_stored_with_metadata() {
    let svc = in_memory_service();
    let receipt = svc
        .handle(&UploadRequest::new("alice", "plant.CSV", GOOD_CSV.as_bytes().to_vec()))
        .unwrap();

    let meta = &receipt.stored.metadata;
    assert_eq!(meta.filename, "plant.CSV");
    assert_eq!(meta.file_size, GOOD_CSV.len() as u64);
    assert_eq!(meta.equipment_count, 3);
    assert_eq!(receipt.report().equipment_count(), 3);

    let listed = svc.store().list_for_user("alice", 5).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, receipt.id());
}

#[test]
fn wrong_extension_rejected_before_parsing() {
    let store = Arc::new(InMemoryReportStore::default());
    let svc = service_with(AnalyzerConfig::default(), store.clone());

    // Content is not even CSV; the name alone decides.
    let err = svc
        .handle(&UploadRequest::new("alice", "plant.xlsx", vec![0xff, 0xfe, 0x00]))
        .unwrap_err();
    assert!(matches!(err, UploadError::InvalidFileType { .. }));
    assert!(err.is_validation());
    assert!(store.is_empty());
}

#[test]
fn oversized_payload_rejected_before_parsing() {
    let mut config = AnalyzerConfig::default();
    config.upload.max_file_bytes = 16;
    let store = Arc::new(InMemoryReportStore::default());
    let svc = service_with(config, store.clone());

    let err = svc
        .handle(&UploadRequest::new("alice", "plant.csv", GOOD_CSV.as_bytes().to_vec()))
        .unwrap_err();
    assert!(matches!(err, UploadError::FileTooLarge { max: 16, .. }));
    assert!(err.user_message().contains("MB limit"));
    assert!(store.is_empty());
}

#[test]
fn payload_at_the_cap_is_accepted() {
    let mut config = AnalyzerConfig::default();
    config.upload.max_file_bytes = GOOD_CSV.len() as u64;
    let svc = service_with(config, Arc::new(InMemoryReportStore::default()));
    assert!(svc
        .handle(&UploadRequest::new("alice", "plant.csv", GOOD_CSV.as_bytes().to_vec()))
        .is_ok());
}

#[test]
fn schema_failure_surfaces_column_and_stores_nothing() {
    let store = Arc::new(InMemoryReportStore::default());
    let svc = service_with(AnalyzerConfig::default(), store.clone());

    let csv = "Equipment Name,Type,Flowrate,Pressure\nP1,Pump,1,2\n";
    let err = svc
        .handle(&UploadRequest::new("alice", "plant.csv", csv.as_bytes().to_vec()))
        .unwrap_err();
    assert!(matches!(
        err,
        UploadError::Analysis(AnalysisError::Schema { ref column }) if column == "Temperature"
    ));
    assert!(err.is_validation());
    assert!(err.user_message().contains("Temperature"));
    assert!(store.is_empty());
}

#[test]
fn sled_backed_service_keeps_latest_reports() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SledReportStore::open(dir.path(), 2).unwrap());
    let svc = service_with(AnalyzerConfig::default(), store.clone());

    for name in ["a.csv", "b.csv", "c.csv"] {
        svc.handle(&UploadRequest::new("alice", name, GOOD_CSV.as_bytes().to_vec()))
            .unwrap();
    }

    let names: Vec<String> = store
        .list_for_user("alice", 10)
        .unwrap()
        .into_iter()
        .map(|r| r.metadata.filename)
        .collect();
    assert_eq!(names, vec!["c.csv".to_string(), "b.csv".to_string()]);
}
