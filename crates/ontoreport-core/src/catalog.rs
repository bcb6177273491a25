//! Catalog snapshot: an in-memory [`OntologyRegistry`] loaded from a JSON dump of the metadata store
use crate::data_model::{
    Administrator, ClassItem, ClassPage, Ontology, PageRequest, Submission, SubmissionStatus,
};
use crate::error::{ReportError, ServiceError};
use crate::registry::OntologyRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Status catalog of the store
    #[serde(default)]
    pub statuses: Vec<SubmissionStatus>,
    #[serde(default)]
    pub ontologies: Vec<OntologyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyEntry {
    #[serde(flatten)]
    pub ontology: Ontology,
    #[serde(default)]
    pub administered_by: Vec<Administrator>,
    #[serde(default)]
    pub submissions: Vec<SubmissionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionEntry {
    #[serde(flatten)]
    pub submission: Submission,
    #[serde(default)]
    pub roots: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassItem>,
}

impl CatalogSnapshot {
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let mut snapshot: Self = serde_json::from_str(json)?;
        // Submissions nested under an ontology may omit their acronym.
        for entry in &mut snapshot.ontologies {
            for sub in &mut entry.submissions {
                if sub.submission.acronym.is_empty() {
                    sub.submission.acronym = entry.ontology.acronym.clone();
                }
            }
        }
        Ok(snapshot)
    }

    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn entry(&self, acronym: &str) -> Result<&OntologyEntry, ServiceError> {
        self.ontologies
            .iter()
            .find(|e| e.ontology.acronym == acronym)
            .ok_or_else(|| ServiceError::Query(format!("unknown ontology {}", acronym)))
    }

    fn submission_entry(&self, submission: &Submission) -> Result<&SubmissionEntry, ServiceError> {
        self.entry(&submission.acronym)?
            .submissions
            .iter()
            .find(|s| s.submission.id == submission.id)
            .ok_or_else(|| ServiceError::Query(format!("unknown submission {}", submission.id)))
    }
}

impl OntologyRegistry for CatalogSnapshot {
    fn ontologies(&self) -> Result<Vec<Ontology>, ServiceError> {
        Ok(self.ontologies.iter().map(|e| e.ontology.clone()).collect())
    }

    fn administrators(&self, acronym: &str) -> Result<Vec<Administrator>, ServiceError> {
        Ok(self.entry(acronym)?.administered_by.clone())
    }

    fn submissions(&self, acronym: &str) -> Result<Vec<Submission>, ServiceError> {
        Ok(self
            .entry(acronym)?
            .submissions
            .iter()
            .map(|s| s.submission.clone())
            .collect())
    }

    fn status_catalog(&self) -> Result<Vec<SubmissionStatus>, ServiceError> {
        Ok(self.statuses.clone())
    }

    fn roots(&self, submission: &Submission) -> Result<Vec<String>, ServiceError> {
        Ok(self.submission_entry(submission)?.roots.clone())
    }

    fn class_count(&self, submission: &Submission) -> Result<Option<u64>, ServiceError> {
        Ok(submission.metrics.and_then(|m| m.classes))
    }

    fn class_page(
        &self,
        submission: &Submission,
        request: PageRequest,
    ) -> Result<ClassPage, ServiceError> {
        let classes = &self.submission_entry(submission)?.classes;
        let size = request.size.max(1) as usize;
        let start = (request.page.max(1) as usize - 1).saturating_mul(size);
        let end = start.saturating_add(size).min(classes.len());
        if start >= classes.len() {
            return Ok(ClassPage::default());
        }
        Ok(ClassPage {
            classes: classes[start..end].to_vec(),
            has_next: end < classes.len(),
        })
    }
}
