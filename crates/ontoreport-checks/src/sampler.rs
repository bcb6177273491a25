//! Class sampling
//!
//! Collects a handful of representative class labels from a submission by
//! paging through its classes. The walk stops as soon as enough labels are
//! found, so huge ontologies usually cost a single page.

use ontoreport_core::{
    recover, ClassItem, ClassPage, DiagnosticReport, OntologyRegistry, PageRequest,
    SamplerConfig, Submission,
};
use std::collections::HashSet;

/// Shortest label worth sampling, in characters.
const MIN_LABEL_CHARS: usize = 3;

/// Identifier markers of skolemized or raw blank nodes.
const BLANK_NODE_MARKERS: [&str; 2] = [".well-known/genid", "_:"];

pub struct ClassSampler {
    target_size: usize,
    page_size: u32,
    stop_words: HashSet<String>,
}

impl ClassSampler {
    pub fn new(config: &SamplerConfig) -> Self {
        Self {
            target_size: config.target_size,
            page_size: config.page_size.max(1),
            stop_words: config.stop_words.iter().map(|w| w.to_uppercase()).collect(),
        }
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Up to `target_size` distinct labels, in class order.
    ///
    /// Fetch failures are recorded in `report` and end the walk.
    pub fn sample(
        &self,
        registry: &dyn OntologyRegistry,
        submission: &Submission,
        report: &mut DiagnosticReport,
    ) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        if self.target_size == 0 {
            return labels;
        }

        // A known count spares the store a COUNT query per page; without it
        // the pages are still fetched.
        let known_count = match registry.class_count(submission) {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(submission = %submission.id, error = %err, "class count unavailable");
                None
            }
        };

        let mut page = 1u32;
        loop {
            let request = PageRequest {
                page,
                size: self.page_size,
                known_count,
            };
            let batch = recover(report, "good_classes", ClassPage::default(), || {
                registry.class_page(submission, request)
            });
            if batch.classes.is_empty() {
                tracing::debug!(submission = %submission.id, page, "no more classes to sample");
                break;
            }

            for item in &batch.classes {
                let Some(label) = self.accepted_label(item) else {
                    continue;
                };
                if !labels.iter().any(|l| l == label) {
                    labels.push(label.to_string());
                }
                if labels.len() >= self.target_size {
                    break;
                }
            }

            if labels.len() >= self.target_size || !batch.has_next {
                break;
            }
            page += 1;
        }

        labels
    }

    fn accepted_label<'c>(&self, item: &'c ClassItem) -> Option<&'c str> {
        let label = item.pref_label.as_deref()?;
        if label.chars().count() < MIN_LABEL_CHARS {
            return None;
        }
        if BLANK_NODE_MARKERS.iter().any(|m| item.id.contains(m)) {
            return None;
        }
        if self.stop_words.contains(&label.to_uppercase()) {
            return None;
        }
        Some(label)
    }
}
