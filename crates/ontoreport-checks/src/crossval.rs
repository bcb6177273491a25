//! Cross validation of sampled labels against the annotator and the search index
//!
//! Both services should find every label sampled from a ready submission.
//! A shortfall on the combined query triggers one query per label so the
//! report can point at the labels that are missing.

use once_cell::sync::Lazy;
use ontoreport_core::codes::TERM_DELIMITER;
use ontoreport_core::{
    emit, recover, Annotator, CodeData, DiagnosticCode, DiagnosticReport, SearchIndex,
    SearchQuery, ServiceError,
};
use regex::Regex;
use std::collections::HashSet;

static SOLR_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([+\-&|!(){}\[\]^"~*?:\\/])"#).expect("valid escape pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Escape `text` for the search index query syntax.
pub fn solr_escape(text: &str) -> String {
    let escaped = SOLR_SPECIAL.replace_all(text, r"\$1");
    WHITESPACE.replace_all(&escaped, r"\ ").into_owned()
}

/// Search request restricted to one ontology's non-obsolete classes.
pub fn search_query(text: &str, acronym: &str) -> SearchQuery {
    let params = [
        ("defType", "edismax".to_string()),
        ("stopwords", "true".to_string()),
        ("lowercaseOperators", "true".to_string()),
        ("fl", "*,score".to_string()),
        ("hl", "on".to_string()),
        ("hl.simple.pre", "<em>".to_string()),
        ("hl.simple.post", "</em>".to_string()),
        (
            "qf",
            "resource_id^100 prefLabelExact^90 prefLabel^70 synonymExact^50 synonym^10 notation cui semanticType"
                .to_string(),
        ),
        (
            "hl.fl",
            "resource_id prefLabelExact prefLabel synonymExact synonym notation cui semanticType"
                .to_string(),
        ),
        ("fq", format!("submissionAcronym:\"{}\" AND obsolete:false", acronym)),
        ("start", "0".to_string()),
        ("rows", "50".to_string()),
    ];

    SearchQuery {
        text: solr_escape(text),
        params: params
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    }
}

/// Marks a label that produced no result.
pub fn flag_missing(label: &str) -> String {
    format!("<span class='missing_term'>{}</span>", label)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CrossValidator;

impl CrossValidator {
    pub fn new() -> Self {
        Self
    }

    /// Emit `errNoAnnotator` / `errNoSearch` when a service misses samples.
    pub fn cross_check(
        &self,
        samples: &[String],
        acronym: &str,
        search: &dyn SearchIndex,
        annotator: &dyn Annotator,
        report: &mut DiagnosticReport,
    ) {
        if samples.is_empty() {
            return;
        }

        let annotator_gap = recover(report, "annotator", None, || {
            annotator_shortfall(samples, acronym, annotator)
        });
        if let Some(data) = annotator_gap {
            emit(report, DiagnosticCode::NoAnnotator, Some(data));
        }

        let search_gap = recover(report, "search", None, || {
            search_shortfall(samples, acronym, search)
        });
        if let Some(data) = search_gap {
            emit(report, DiagnosticCode::NoSearch, Some(data));
        }
    }
}

fn annotator_shortfall(
    samples: &[String],
    acronym: &str,
    annotator: &dyn Annotator,
) -> Result<Option<CodeData>, ServiceError> {
    let scope = [acronym.to_string()];
    let annotations = annotator.annotate(&samples.join(TERM_DELIMITER), &scope)?;
    let spans: HashSet<(u32, u32)> = annotations.iter().map(|a| (a.from, a.to)).collect();
    if spans.len() >= samples.len() {
        return Ok(None);
    }

    let mut terms = Vec::with_capacity(samples.len());
    for label in samples {
        let found = !annotator.annotate(label, &scope)?.is_empty();
        terms.push(if found { label.clone() } else { flag_missing(label) });
    }
    Ok(Some(CodeData::Coverage {
        matched: spans.len() as u64,
        terms: terms.join(TERM_DELIMITER),
    }))
}

fn search_shortfall(
    samples: &[String],
    acronym: &str,
    search: &dyn SearchIndex,
) -> Result<Option<CodeData>, ServiceError> {
    let combined = search.search(&search_query(&samples.join(TERM_DELIMITER), acronym))?;
    if combined.num_found >= samples.len() as u64 {
        return Ok(None);
    }

    let mut terms = Vec::with_capacity(samples.len());
    for label in samples {
        let found = search.search(&search_query(label, acronym))?.num_found > 0;
        terms.push(if found { label.clone() } else { flag_missing(label) });
    }
    Ok(Some(CodeData::Coverage {
        matched: combined.num_found,
        terms: terms.join(TERM_DELIMITER),
    }))
}
