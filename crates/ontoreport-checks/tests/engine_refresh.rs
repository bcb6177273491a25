//! End-to-end refreshes through the driver and the report store.

mod support;

use ontoreport_checks::ReportEngine;
use ontoreport_core::{CatalogSnapshot, OntologyRegistry, ReportCollection, ReportError};
use ontoreport_store::{InMemoryLease, ReportStore};
use std::path::Path;
use std::sync::Arc;
use support::*;

fn engine(registry: Arc<dyn OntologyRegistry>, report_path: &Path) -> ReportEngine {
    let mut config = config();
    config.report_path = report_path.to_path_buf();
    config.lock.poll_interval_ms = 5;
    let store = ReportStore::new(
        report_path,
        config.lock.clone(),
        Arc::new(InMemoryLease::new()),
    );
    let index = Arc::new(LabelIndex::new(LABELS));
    ReportEngine::new(config, registry, index.clone(), index, store)
}

fn three_ontologies() -> CatalogSnapshot {
    let mut empty_flat = ontology("FLAT", vec![submission("FLAT", 1, READY)]);
    empty_flat.ontology.flat = true;
    catalog(vec![
        ontology("GO", vec![submission("GO", 1, READY), submission("GO", 2, READY)]),
        ontology("EMPTY", vec![]),
        empty_flat,
    ])
}

fn without_timestamps(mut collection: ReportCollection) -> ReportCollection {
    collection.report_date_generated = None;
    for report in collection.ontologies.values_mut() {
        report.report_date_updated = None;
    }
    collection
}

#[test]
fn test_full_regeneration_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ontologies_report.json");
    let engine = engine(Arc::new(three_ontologies()), &path);

    let first = engine.run().unwrap();
    let snapshot = engine.report(false).unwrap();
    engine.run().unwrap();
    let again = engine.report(false).unwrap();

    assert_eq!(first.reported, ["EMPTY", "FLAT", "GO"]);
    assert!(first.skipped.is_empty());
    assert_eq!(first.total_in_report, 3);
    assert!(again.report_date_generated.is_some());
    assert_eq!(without_timestamps(snapshot), without_timestamps(again));
}

#[test]
fn test_targeted_refresh_only_touches_named_ontology() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ontologies_report.json");
    engine(Arc::new(three_ontologies()), &path).run().unwrap();
    let before = engine(Arc::new(three_ontologies()), &path).report(false).unwrap();

    // GO loses its submissions upstream; only GO is refreshed.
    let mut changed = three_ontologies();
    changed.ontologies[0].submissions.clear();
    changed.ontologies[1].submissions.push(submission("EMPTY", 1, READY));
    let summary = engine(Arc::new(changed), &path)
        .refresh_report(&["GO".to_string()])
        .unwrap();
    let after = engine(Arc::new(three_ontologies()), &path).report(false).unwrap();

    assert_eq!(summary.reported, ["GO"]);
    assert_eq!(after.report_date_generated, before.report_date_generated);
    assert_eq!(after.ontologies["EMPTY"], before.ontologies["EMPTY"]);
    assert_eq!(after.ontologies["FLAT"], before.ontologies["FLAT"]);
    assert!(after.ontologies["GO"].has_code("errNoSubmissions"));
}

#[test]
fn test_failed_ontology_is_skipped_and_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ontologies_report.json");
    let mut registry = Flaky::new(three_ontologies());
    registry.fail_submissions_for = Some("GO".to_string());

    let summary = engine(Arc::new(registry), &path).run().unwrap();

    assert_eq!(summary.skipped, ["GO"]);
    assert_eq!(summary.reported, ["EMPTY", "FLAT"]);
    let collection = engine(Arc::new(three_ontologies()), &path).report(false).unwrap();
    assert!(!collection.ontologies.contains_key("GO"));
}

#[test]
fn test_report_missing_before_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Arc::new(three_ontologies()), &dir.path().join("none.json"));

    assert!(matches!(engine.report(false), Err(ReportError::NotFound(_))));
    assert!(engine.report(true).unwrap().ontologies.is_empty());
}

#[test]
fn test_delete_ontologies_through_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ontologies_report.json");
    let engine = engine(Arc::new(three_ontologies()), &path);
    engine.run().unwrap();

    engine.delete_ontologies(&["EMPTY".to_string()]).unwrap();

    let collection = engine.report(false).unwrap();
    assert_eq!(collection.ontologies.keys().collect::<Vec<_>>(), ["FLAT", "GO"]);
}
