//! Data Model: catalog DTOs consumed from the registry and the report shapes we persist
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Timestamp layout used for every date field of the report.
pub const REPORT_DATE_FORMAT: &str = "%m/%d/%Y, %I:%M %p";

/// Render a timestamp the way the report stores it (`MM/DD/YYYY, HH:MM AM/PM`).
pub fn report_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(REPORT_DATE_FORMAT).to_string()
}

/// The current time in report layout. Every report date is UTC.
pub fn report_now() -> String {
    report_timestamp(&Utc::now())
}

// ============================================================================
// CATALOG
// ============================================================================

/// An ontology as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ontology {
    pub acronym: String,
    #[serde(default)]
    pub summary_only: bool,
    #[serde(default)]
    pub flat: bool,
}

/// A user referenced by an ontology's `administeredBy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Administrator {
    /// User IRI (ex: "http://data.example.org/users/jdoe")
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl Administrator {
    /// Last path segment of the user IRI.
    pub fn id_segment(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

/// A submission status code (ex: "RDF", "ERROR_METRICS").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionStatus(pub String);

impl SubmissionStatus {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn is_error(&self) -> bool {
        self.0.starts_with("ERROR_")
    }

    pub fn is_diff(&self) -> bool {
        self.0.contains("DIFF")
    }

    pub fn is_archived(&self) -> bool {
        self.0.contains("ARCHIVED")
    }

    pub fn is_rdf_labels(&self) -> bool {
        self.0.contains("RDF_LABELS")
    }
}

impl Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Class and property counts computed for a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default)]
    pub classes: Option<u64>,
    #[serde(default)]
    pub properties: Option<u64>,
}

impl Metrics {
    /// Classes plus properties, missing counts taken as zero.
    pub fn entity_total(&self) -> u64 {
        self.classes
            .unwrap_or(0)
            .saturating_add(self.properties.unwrap_or(0))
    }
}

/// One versioned content unit of an ontology, returned complete by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Owning ontology
    #[serde(default)]
    pub acronym: String,
    /// Sequence number within the ontology
    pub submission_id: u64,
    /// Submission IRI
    pub id: String,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    /// Ontology language code (ex: "OWL", "OBO")
    #[serde(default)]
    pub has_ontology_language: Option<String>,
    #[serde(default)]
    pub submission_status: Vec<SubmissionStatus>,
    #[serde(default)]
    pub metrics: Option<Metrics>,
}

impl Submission {
    pub fn has_status(&self, status: &SubmissionStatus) -> bool {
        self.submission_status.contains(status)
    }

    /// Ready when every one of `ready_statuses` is present.
    pub fn is_ready(&self, ready_statuses: &[String]) -> bool {
        ready_statuses
            .iter()
            .all(|code| self.submission_status.iter().any(|st| st.code() == code))
    }

    pub fn error_statuses(&self) -> impl Iterator<Item = &SubmissionStatus> {
        self.submission_status.iter().filter(|st| st.is_error())
    }
}

/// A class as seen by the sampler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassItem {
    pub id: String,
    #[serde(default)]
    pub pref_label: Option<String>,
}

/// Page cursor over a submission's classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    pub size: u32,
    /// Total class count when already known, so the store can skip counting
    pub known_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassPage {
    pub classes: Vec<ClassItem>,
    pub has_next: bool,
}

/// One span matched by the annotator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub class_id: String,
    pub from: u32,
    pub to: u32,
}

/// A search request: escaped query text plus the index parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    pub num_found: u64,
}

// ============================================================================
// REPORT
// ============================================================================

/// Value stored under a diagnostic code key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeValue {
    Message(String),
    Entries(Vec<String>),
}

/// Per-ontology diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub problem: bool,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(rename = "administeredBy", default)]
    pub administered_by: Vec<String>,
    #[serde(rename = "logFilePath", default)]
    pub log_file_path: String,
    #[serde(default)]
    pub report_date_updated: Option<String>,
    /// Emitted codes keyed by their identifier
    #[serde(flatten)]
    pub codes: BTreeMap<String, CodeValue>,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self {
            problem: false,
            format: String::new(),
            date_created: String::new(),
            administered_by: Vec::new(),
            log_file_path: String::new(),
            report_date_updated: None,
            codes: BTreeMap::new(),
        }
    }

    pub fn code(&self, id: &str) -> Option<&CodeValue> {
        self.codes.get(id)
    }

    pub fn has_code(&self, id: &str) -> bool {
        self.codes.contains_key(id)
    }

    /// Rendered message of a static or templated code.
    pub fn message(&self, id: &str) -> Option<&str> {
        match self.codes.get(id) {
            Some(CodeValue::Message(msg)) => Some(msg),
            _ => None,
        }
    }

    /// Collected values of an accumulating code.
    pub fn entries(&self, id: &str) -> &[String] {
        match self.codes.get(id) {
            Some(CodeValue::Entries(values)) => values,
            _ => &[],
        }
    }
}

impl Default for DiagnosticReport {
    fn default() -> Self {
        Self::new()
    }
}

/// The persisted artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCollection {
    #[serde(default)]
    pub ontologies: BTreeMap<String, DiagnosticReport>,
    #[serde(default)]
    pub report_date_generated: Option<String>,
}

impl ReportCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge reports by acronym, replacing entries on collision.
    pub fn merge(&mut self, reports: BTreeMap<String, DiagnosticReport>) {
        self.ontologies.extend(reports);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_report_timestamp_layout() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(15, 4, 0)
            .unwrap()
            .and_utc();
        assert_eq!(report_timestamp(&at), "03/07/2024, 03:04 PM");
    }

    #[test]
    fn test_status_classification() {
        assert!(SubmissionStatus::new("ERROR_RDF").is_error());
        assert!(!SubmissionStatus::new("RDF").is_error());
        assert!(SubmissionStatus::new("RDF_LABELS").is_rdf_labels());
        assert!(SubmissionStatus::new("DIFF").is_diff());
        assert!(SubmissionStatus::new("ARCHIVED").is_archived());
    }

    #[test]
    fn test_submission_ready_requires_all_statuses() {
        let sub = Submission {
            acronym: "GO".into(),
            submission_id: 1,
            id: "http://data.example.org/ontologies/GO/submissions/1".into(),
            creation_date: None,
            has_ontology_language: None,
            submission_status: vec![SubmissionStatus::new("UPLOADED"), SubmissionStatus::new("RDF")],
            metrics: None,
        };
        assert!(sub.is_ready(&["UPLOADED".into(), "RDF".into()]));
        assert!(!sub.is_ready(&["UPLOADED".into(), "RDF".into(), "RDF_LABELS".into()]));
    }

    #[test]
    fn test_report_serializes_codes_inline() {
        let mut report = DiagnosticReport::new();
        report.codes.insert("flat".into(), CodeValue::Message("FLAT".into()));
        report
            .codes
            .insert("errMissingStatus".into(), CodeValue::Entries(vec!["METRICS".into()]));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["flat"], "FLAT");
        assert_eq!(json["errMissingStatus"][0], "METRICS");
        assert_eq!(json["administeredBy"], serde_json::json!([]));
        assert!(json["report_date_updated"].is_null());

        let back: DiagnosticReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_entity_total_saturates() {
        let metrics = Metrics {
            classes: Some(u64::MAX),
            properties: Some(3),
        };
        assert_eq!(metrics.entity_total(), u64::MAX);
        assert_eq!(Metrics { classes: Some(7), properties: None }.entity_total(), 7);
    }

    #[test]
    fn test_administrator_id_segment() {
        let admin = Administrator {
            id: "http://data.example.org/users/jdoe".into(),
            username: None,
        };
        assert_eq!(admin.id_segment(), "jdoe");
    }
}
