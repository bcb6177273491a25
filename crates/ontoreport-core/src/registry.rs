//! Collaborator contracts: the metadata registry, the search index and the annotator
//!
//! Implementations are blocking. Each call returns complete values; the
//! pipeline never fetches attributes lazily.

use crate::data_model::{
    Administrator, Annotation, ClassPage, Ontology, PageRequest, SearchQuery, SearchResponse,
    Submission, SubmissionStatus,
};
use crate::error::ServiceError;

/// Read access to the ontology metadata store.
pub trait OntologyRegistry: Send + Sync {
    /// Every ontology in the catalog
    fn ontologies(&self) -> Result<Vec<Ontology>, ServiceError>;

    fn administrators(&self, acronym: &str) -> Result<Vec<Administrator>, ServiceError>;

    /// All submissions of an ontology, in any state
    fn submissions(&self, acronym: &str) -> Result<Vec<Submission>, ServiceError>;

    /// Every status code the store knows about
    fn status_catalog(&self) -> Result<Vec<SubmissionStatus>, ServiceError>;

    fn roots(&self, submission: &Submission) -> Result<Vec<String>, ServiceError>;

    /// Class count when the store has one precomputed
    fn class_count(&self, submission: &Submission) -> Result<Option<u64>, ServiceError>;

    /// One page of classes in a stable order
    fn class_page(
        &self,
        submission: &Submission,
        request: PageRequest,
    ) -> Result<ClassPage, ServiceError>;
}

/// Text search over indexed classes.
pub trait SearchIndex: Send + Sync {
    fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ServiceError>;
}

/// Concept recognition over free text.
pub trait Annotator: Send + Sync {
    fn annotate(&self, text: &str, ontologies: &[String]) -> Result<Vec<Annotation>, ServiceError>;
}
