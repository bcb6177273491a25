//! Report driver: selects ontologies, runs the pipeline on each and hands the
//! results to the report store
use crate::pipeline::DiagnosticPipeline;
use ontoreport_core::{
    Annotator, EngineConfig, OntologyRegistry, ReportCollection, ReportError, SearchIndex,
};
use ontoreport_store::ReportStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span};
use uuid::Uuid;

/// Outcome of one refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    /// Ontologies whose report was written
    pub reported: Vec<String>,
    /// Ontologies dropped from this run after a failure
    pub skipped: Vec<String>,
    /// Entries in the artifact after the merge
    pub total_in_report: usize,
    pub elapsed_ms: u64,
}

pub struct ReportEngine {
    config: EngineConfig,
    registry: Arc<dyn OntologyRegistry>,
    search: Arc<dyn SearchIndex>,
    annotator: Arc<dyn Annotator>,
    store: ReportStore,
}

impl ReportEngine {
    pub fn new(
        config: EngineConfig,
        registry: Arc<dyn OntologyRegistry>,
        search: Arc<dyn SearchIndex>,
        annotator: Arc<dyn Annotator>,
        store: ReportStore,
    ) -> Self {
        Self {
            config,
            registry,
            search,
            annotator,
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Regenerate the report for every ontology.
    pub fn run(&self) -> Result<RunSummary, ReportError> {
        self.refresh_report(&[])
    }

    /// Report on `acronyms`, or on every ontology when the list is empty.
    pub fn refresh_report(&self, acronyms: &[String]) -> Result<RunSummary, ReportError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("ontologies_report", run_id = %run_id);
        let _enter = span.enter();
        let started = Instant::now();

        let mut ontologies = self.registry.ontologies()?;
        if !acronyms.is_empty() {
            ontologies.retain(|ont| acronyms.contains(&ont.acronym));
        }
        let (scope, verb) = if acronyms.is_empty() {
            ("ALL ontologies".to_string(), "generating")
        } else {
            (format!("ontologies {}", acronyms.join(", ")), "updating")
        };
        info!("Running ontologies report for {}...", scope);

        let pipeline = DiagnosticPipeline::new(
            &self.config,
            &*self.registry,
            &*self.search,
            &*self.annotator,
        );

        let total = ontologies.len();
        let mut reports = BTreeMap::new();
        let mut skipped = Vec::new();
        for (index, ontology) in ontologies.iter().enumerate() {
            info!(
                "Processing report for {} - {} of {} ontologies.",
                ontology.acronym,
                index + 1,
                total
            );
            let step_started = Instant::now();
            match pipeline.generate_report(ontology) {
                Ok(report) => {
                    reports.insert(ontology.acronym.clone(), report);
                    info!(
                        "Finished report for {} in {:.3} sec.",
                        ontology.acronym,
                        step_started.elapsed().as_secs_f64()
                    );
                }
                Err(err) => {
                    error!(acronym = %ontology.acronym, error = %err, "report failed, ontology skipped");
                    skipped.push(ontology.acronym.clone());
                }
            }
        }

        let reported: Vec<String> = reports.keys().cloned().collect();
        let collection = self.store.refresh(acronyms, reports)?;
        info!(
            "Finished {} report for {}. Wrote report data to {}.",
            verb,
            scope,
            self.store.path().display()
        );

        Ok(RunSummary {
            run_id,
            reported,
            skipped,
            total_in_report: collection.ontologies.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// The persisted report.
    pub fn report(&self, suppress_missing: bool) -> Result<ReportCollection, ReportError> {
        self.store.read(suppress_missing)
    }

    pub fn delete_ontologies(&self, acronyms: &[String]) -> Result<(), ReportError> {
        self.store.delete_entities(acronyms)
    }
}
