//! Storage Integration Tests
//!
//! Real analysis reports persisted through both `ReportStore` backends.
//! The sled store runs on a `tempfile` directory and is reopened to check
//! durability.

use equipment_analyzer::config::{AnalyzerConfig, StorageConfig};
use equipment_analyzer::storage::{self, ReportMetadata};
use equipment_analyzer::{
    AnalysisReport, EquipmentAnalyzer, InMemoryReportStore, ReportStore, SledReportStore,
};

const CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
    P1,Pump,120,5.2,110\n\
    P2,Pump,95,4.8,105\n\
    C1,Compressor,60,8.5,95\n\
    R1,Reactor,140,6.1,130\n";

fn report() -> AnalysisReport {
    EquipmentAnalyzer::new(AnalyzerConfig::default())
        .analyze_bytes(CSV.as_bytes())
        .unwrap()
}

fn metadata(name: &str, report: &AnalysisReport) -> ReportMetadata {
    ReportMetadata::now(name, CSV.len() as u64, report.equipment_count())
}

fn exercise_backend(store: &dyn ReportStore) {
    let report = report();

    let first = store.store("alice", metadata("first.csv", &report), &report).unwrap();
    let second = store.store("alice", metadata("second.csv", &report), &report).unwrap();
    store.store("bob", metadata("bob.csv", &report), &report).unwrap();

    let alice = store.list_for_user("alice", 10).unwrap();
    assert_eq!(alice.len(), 2);
    assert_eq!(alice[0].id, second.id);
    assert_eq!(alice[1].id, first.id);

    let fetched = store.get(first.id).unwrap().unwrap();
    assert_eq!(fetched.metadata.equipment_count, 4);
    assert_eq!(fetched.report.equipment_count(), 4);
    assert_eq!(
        fetched.report.pointer("distributions.equipment_types"),
        report.pointer("distributions.equipment_types")
    );

    store.delete(first.id).unwrap();
    assert_eq!(store.list_for_user("alice", 10).unwrap().len(), 1);
    assert_eq!(store.list_for_user("bob", 10).unwrap().len(), 1);
}

#[test]
fn in_memory_backend_contract() {
    exercise_backend(&InMemoryReportStore::default());
}

#[test]
fn sled_backend_contract() {
    let dir = tempfile::tempdir().unwrap();
    let store = SledReportStore::open(dir.path(), 5).unwrap();
    exercise_backend(&store);
}

#[test]
fn sled_reports_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let report = report();
    let id = {
        let store = SledReportStore::open(dir.path(), 5).unwrap();
        store.store("alice", metadata("plant.csv", &report), &report).unwrap().id
    };

    let reopened = SledReportStore::open(dir.path(), 5).unwrap();
    let stored = reopened.get(id).unwrap().unwrap();
    assert_eq!(stored.metadata.filename, "plant.csv");
    assert_eq!(stored.report.equipment_count(), report.equipment_count());
    assert!(stored.report.is_json_safe());
}

#[test]
fn only_latest_five_per_user_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        path: dir.path().join("reports"),
        retain_per_user: 5,
    };
    let store = storage::open_configured(&config).unwrap();
    let report = report();

    let ids: Vec<_> = (0..7)
        .map(|i| {
            store
                .store("alice", metadata(&format!("{i}.csv"), &report), &report)
                .unwrap()
                .id
        })
        .collect();

    let kept = store.list_for_user("alice", 10).unwrap();
    assert_eq!(kept.len(), 5);
    assert_eq!(kept[0].metadata.filename, "6.csv");
    assert_eq!(kept[4].metadata.filename, "2.csv");
    assert!(store.get(ids[0]).unwrap().is_none());
    assert!(store.get(ids[1]).unwrap().is_none());
    assert_eq!(store.count(), 5);
}

#[test]
fn list_limit_is_respected() {
    let store = InMemoryReportStore::default();
    let report = report();
    for i in 0..4 {
        store
            .store("alice", metadata(&format!("{i}.csv"), &report), &report)
            .unwrap();
    }
    assert_eq!(store.list_for_user("alice", 2).unwrap().len(), 2);
    assert!(store.list_for_user("nobody", 2).unwrap().is_empty());
}
