//! Diagnostic code catalog
//!
//! Every finding the pipeline can record is a [`DiagnosticCode`]. A single
//! lookup ([`DiagnosticCode::kind`]) resolves a code to how it is stored:
//! a fixed message, a message rendered from data, or a list that collects
//! values across the whole report.

use crate::data_model::{CodeValue, DiagnosticReport};
use serde::{Deserialize, Serialize};

/// Marker prefix of codes that flag the report as a problem.
pub const ERROR_CODE_PREFIX: &str = "err";

/// Delimiter used to join sampled labels in cross-check messages.
pub const TERM_DELIMITER: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    #[serde(rename = "summaryOnly")]
    SummaryOnly,
    #[serde(rename = "flat")]
    Flat,
    #[serde(rename = "errSummaryOnlyWithSubmissions")]
    SummaryOnlyWithSubmissions,
    #[serde(rename = "errNoSubmissions")]
    NoSubmissions,
    #[serde(rename = "errNoReadySubmission")]
    NoReadySubmission,
    #[serde(rename = "errNoLatestReadySubmission")]
    NoLatestReadySubmission,
    #[serde(rename = "errNoClassesLatestSubmission")]
    NoClassesLatestSubmission,
    #[serde(rename = "errNoRootsLatestSubmission")]
    NoRootsLatestSubmission,
    #[serde(rename = "errNoMetricsLatestSubmission")]
    NoMetricsLatestSubmission,
    #[serde(rename = "errIncorrectMetricsLatestSubmission")]
    IncorrectMetricsLatestSubmission,
    #[serde(rename = "errNoAnnotator")]
    NoAnnotator,
    #[serde(rename = "errNoSearch")]
    NoSearch,
    #[serde(rename = "errRunningReport")]
    RunningReport,
    #[serde(rename = "errErrorStatus")]
    ErrorStatus,
    #[serde(rename = "errMissingStatus")]
    MissingStatus,
}

/// Data attached to an emitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeData {
    /// A plain value, collected as-is by list codes
    Text(String),
    /// Revision count for staleness
    Count(u64),
    /// Cross-check outcome: matches for the combined query and the rendered term list
    Coverage { matched: u64, terms: String },
    /// A step that failed while building the report
    Failure {
        component: String,
        kind: String,
        message: String,
    },
}

impl CodeData {
    pub fn failure(
        component: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Failure {
            component: component.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Value appended by list codes.
    fn collected(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Count(n) => n.to_string(),
            Self::Coverage { terms, .. } => terms.clone(),
            Self::Failure {
                component,
                kind,
                message,
            } => format!(
                "Error while running report on component {}: {}: {}",
                component, kind, message
            ),
        }
    }
}

/// How a code is materialised in the report.
#[derive(Debug, Clone, Copy)]
pub enum CodeKind {
    Static(&'static str),
    Templated(fn(&CodeData) -> Option<String>),
    Accumulating,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 15] = [
        Self::SummaryOnly,
        Self::Flat,
        Self::SummaryOnlyWithSubmissions,
        Self::NoSubmissions,
        Self::NoReadySubmission,
        Self::NoLatestReadySubmission,
        Self::NoClassesLatestSubmission,
        Self::NoRootsLatestSubmission,
        Self::NoMetricsLatestSubmission,
        Self::IncorrectMetricsLatestSubmission,
        Self::NoAnnotator,
        Self::NoSearch,
        Self::RunningReport,
        Self::ErrorStatus,
        Self::MissingStatus,
    ];

    /// Key under which the code is stored in the report.
    pub fn id(self) -> &'static str {
        match self {
            Self::SummaryOnly => "summaryOnly",
            Self::Flat => "flat",
            Self::SummaryOnlyWithSubmissions => "errSummaryOnlyWithSubmissions",
            Self::NoSubmissions => "errNoSubmissions",
            Self::NoReadySubmission => "errNoReadySubmission",
            Self::NoLatestReadySubmission => "errNoLatestReadySubmission",
            Self::NoClassesLatestSubmission => "errNoClassesLatestSubmission",
            Self::NoRootsLatestSubmission => "errNoRootsLatestSubmission",
            Self::NoMetricsLatestSubmission => "errNoMetricsLatestSubmission",
            Self::IncorrectMetricsLatestSubmission => "errIncorrectMetricsLatestSubmission",
            Self::NoAnnotator => "errNoAnnotator",
            Self::NoSearch => "errNoSearch",
            Self::RunningReport => "errRunningReport",
            Self::ErrorStatus => "errErrorStatus",
            Self::MissingStatus => "errMissingStatus",
        }
    }

    pub fn kind(self) -> CodeKind {
        match self {
            Self::SummaryOnly => CodeKind::Static("Ontology is summary-only"),
            Self::Flat => CodeKind::Static("This ontology is designated as FLAT"),
            Self::SummaryOnlyWithSubmissions => {
                CodeKind::Static("Ontology has submissions but it is set to summary-only")
            }
            Self::NoSubmissions => CodeKind::Static("Ontology has no submissions"),
            Self::NoReadySubmission => {
                CodeKind::Static("Ontology has no submissions in a ready state")
            }
            Self::NoLatestReadySubmission => CodeKind::Templated(render_revisions_ahead),
            Self::NoClassesLatestSubmission => {
                CodeKind::Static("The latest ready submission has no classes")
            }
            Self::NoRootsLatestSubmission => {
                CodeKind::Static("The latest ready submission has no roots")
            }
            Self::NoMetricsLatestSubmission => {
                CodeKind::Static("The latest ready submission has no metrics")
            }
            Self::IncorrectMetricsLatestSubmission => {
                CodeKind::Static("The latest ready submission has incorrect metrics")
            }
            Self::NoAnnotator => CodeKind::Templated(render_annotator_coverage),
            Self::NoSearch => CodeKind::Templated(render_search_coverage),
            Self::RunningReport | Self::ErrorStatus | Self::MissingStatus => {
                CodeKind::Accumulating
            }
        }
    }

    pub fn is_error(self) -> bool {
        self.id().starts_with(ERROR_CODE_PREFIX)
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.id() == id)
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

fn render_revisions_ahead(data: &CodeData) -> Option<String> {
    let CodeData::Count(n) = data else {
        return None;
    };
    Some(format!(
        "The latest submission is not ready and is ahead of the latest ready by {} revision{}",
        n,
        if *n > 1 { "s" } else { "" }
    ))
}

fn render_coverage(service: &str, data: &CodeData) -> Option<String> {
    let CodeData::Coverage { matched, terms } = data else {
        return None;
    };
    Some(format!(
        "{} - {} results for: {}",
        service,
        if *matched > 0 { "FEW" } else { "NO" },
        terms
    ))
}

fn render_annotator_coverage(data: &CodeData) -> Option<String> {
    render_coverage("Annotator", data)
}

fn render_search_coverage(data: &CodeData) -> Option<String> {
    render_coverage("Search", data)
}

/// Record `code` in `report`.
///
/// List codes append `data` and templated codes render it; both ignore a
/// missing `data`. Static codes always store their message. Error codes set
/// `problem` even when nothing else was stored.
pub fn emit(report: &mut DiagnosticReport, code: DiagnosticCode, data: Option<CodeData>) {
    match code.kind() {
        CodeKind::Accumulating => {
            if let Some(data) = data {
                let value = data.collected();
                match report
                    .codes
                    .entry(code.id().to_string())
                    .or_insert_with(|| CodeValue::Entries(Vec::new()))
                {
                    CodeValue::Entries(values) => values.push(value),
                    slot => *slot = CodeValue::Entries(vec![value]),
                }
            }
        }
        CodeKind::Templated(render) => {
            if let Some(message) = data.as_ref().and_then(render) {
                report
                    .codes
                    .insert(code.id().to_string(), CodeValue::Message(message));
            }
        }
        CodeKind::Static(message) => {
            report
                .codes
                .insert(code.id().to_string(), CodeValue::Message(message.to_string()));
        }
    }

    if code.is_error() {
        report.problem = true;
    }
}
