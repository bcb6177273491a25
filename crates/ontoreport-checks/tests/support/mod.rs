//! Shared fixtures: catalog builders, a label-matching search/annotator and a
//! registry wrapper that injects failures.
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use ontoreport_core::catalog::{OntologyEntry, SubmissionEntry};
use ontoreport_core::codes::TERM_DELIMITER;
use ontoreport_core::{
    Administrator, Annotation, Annotator, CatalogSnapshot, ClassItem, ClassPage, EngineConfig,
    Metrics, Ontology, OntologyRegistry, PageRequest, SearchIndex, SearchQuery, SearchResponse,
    ServiceError, Submission, SubmissionStatus,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const READY: &[&str] = &[
    "UPLOADED", "RDF", "RDF_LABELS", "OBSOLETE", "INDEXED", "METRICS", "ANNOTATOR",
];

pub const CATALOG_STATUSES: &[&str] = &[
    "UPLOADED", "RDF", "RDF_LABELS", "OBSOLETE", "INDEXED", "METRICS", "ANNOTATOR", "DIFF",
    "ARCHIVED", "ERROR_RDF", "ERROR_METRICS",
];

pub const LABELS: &[&str] = &["heart", "lung", "liver", "kidney", "spleen"];

pub fn config() -> EngineConfig {
    EngineConfig {
        admin_retry_delay_ms: 0,
        repository_folder: "does-not-exist".into(),
        ..EngineConfig::default()
    }
}

pub fn submission(acronym: &str, n: u64, statuses: &[&str]) -> SubmissionEntry {
    SubmissionEntry {
        submission: Submission {
            acronym: acronym.to_string(),
            submission_id: n,
            id: format!("http://data.example.org/ontologies/{}/submissions/{}", acronym, n),
            creation_date: Some(Utc.with_ymd_and_hms(2024, 1, n as u32, 9, 30, 0).unwrap()),
            has_ontology_language: Some("OWL".to_string()),
            submission_status: statuses.iter().map(|s| SubmissionStatus::new(*s)).collect(),
            metrics: Some(Metrics {
                classes: Some(120),
                properties: Some(8),
            }),
        },
        roots: vec!["http://purl.example.org/root".to_string()],
        classes: LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| ClassItem {
                id: format!("http://purl.example.org/{}/C{}", acronym, i),
                pref_label: Some(label.to_string()),
            })
            .collect(),
    }
}

pub fn ontology(acronym: &str, submissions: Vec<SubmissionEntry>) -> OntologyEntry {
    OntologyEntry {
        ontology: Ontology {
            acronym: acronym.to_string(),
            summary_only: false,
            flat: false,
        },
        administered_by: vec![Administrator {
            id: "http://data.example.org/users/jdoe".to_string(),
            username: Some("jdoe".to_string()),
        }],
        submissions,
    }
}

pub fn catalog(ontologies: Vec<OntologyEntry>) -> CatalogSnapshot {
    CatalogSnapshot {
        statuses: CATALOG_STATUSES.iter().map(|s| SubmissionStatus::new(*s)).collect(),
        ontologies,
    }
}

/// Finds exactly the labels it was built with.
pub struct LabelIndex {
    labels: HashSet<String>,
}

impl LabelIndex {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches(&self, text: &str) -> Vec<u32> {
        text.split(TERM_DELIMITER)
            .enumerate()
            .filter(|(_, part)| self.labels.contains(*part))
            .map(|(i, _)| i as u32)
            .collect()
    }
}

impl SearchIndex for LabelIndex {
    fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ServiceError> {
        let text = query.text.replace(r"\ \|\ ", TERM_DELIMITER).replace(r"\ ", " ");
        Ok(SearchResponse {
            num_found: self.matches(&text).len() as u64,
        })
    }
}

impl Annotator for LabelIndex {
    fn annotate(&self, text: &str, _ontologies: &[String]) -> Result<Vec<Annotation>, ServiceError> {
        Ok(self
            .matches(text)
            .into_iter()
            .map(|i| Annotation {
                class_id: format!("C{}", i),
                from: i * 100 + 1,
                to: i * 100 + 4,
            })
            .collect())
    }
}

/// Delegates to a snapshot, failing where told to.
pub struct Flaky {
    pub inner: CatalogSnapshot,
    pub admin_failures: AtomicUsize,
    pub fail_submissions_for: Option<String>,
    pub fail_roots: bool,
}

impl Flaky {
    pub fn new(inner: CatalogSnapshot) -> Self {
        Self {
            inner,
            admin_failures: AtomicUsize::new(0),
            fail_submissions_for: None,
            fail_roots: false,
        }
    }
}

impl OntologyRegistry for Flaky {
    fn ontologies(&self) -> Result<Vec<Ontology>, ServiceError> {
        self.inner.ontologies()
    }

    fn administrators(&self, acronym: &str) -> Result<Vec<Administrator>, ServiceError> {
        let remaining = self.admin_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.admin_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ServiceError::Unavailable("triple store busy".into()));
        }
        self.inner.administrators(acronym)
    }

    fn submissions(&self, acronym: &str) -> Result<Vec<Submission>, ServiceError> {
        if self.fail_submissions_for.as_deref() == Some(acronym) {
            return Err(ServiceError::Query("submission query failed".into()));
        }
        self.inner.submissions(acronym)
    }

    fn status_catalog(&self) -> Result<Vec<SubmissionStatus>, ServiceError> {
        self.inner.status_catalog()
    }

    fn roots(&self, submission: &Submission) -> Result<Vec<String>, ServiceError> {
        if self.fail_roots {
            return Err(ServiceError::Query("roots query timed out".into()));
        }
        self.inner.roots(submission)
    }

    fn class_count(&self, submission: &Submission) -> Result<Option<u64>, ServiceError> {
        self.inner.class_count(submission)
    }

    fn class_page(
        &self,
        submission: &Submission,
        request: PageRequest,
    ) -> Result<ClassPage, ServiceError> {
        self.inner.class_page(submission, request)
    }
}
