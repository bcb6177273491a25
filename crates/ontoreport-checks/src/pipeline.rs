//! Diagnostic pipeline: the per-ontology waterfall of checks
//!
//! Checks run in a fixed order. Structural findings (summary-only, no
//! submissions, no ready submission) end the waterfall early; everything after
//! the readiness check runs against the latest ready submission. A failing
//! step is recorded in the report and the waterfall carries on with empty
//! values.

use crate::crossval::CrossValidator;
use crate::sampler::ClassSampler;
use ontoreport_core::step::record_failure;
use ontoreport_core::{
    emit, recover, report_now, report_timestamp, Annotator, CodeData, DiagnosticCode, DiagnosticReport,
    EngineConfig, Ontology, OntologyRegistry, ReportError, SearchIndex, ServiceError, Submission,
};
use std::path::Path;
use std::thread;
use tracing::{debug, warn};

pub struct DiagnosticPipeline<'a> {
    config: &'a EngineConfig,
    registry: &'a dyn OntologyRegistry,
    search: &'a dyn SearchIndex,
    annotator: &'a dyn Annotator,
    sampler: ClassSampler,
    validator: CrossValidator,
}

impl<'a> DiagnosticPipeline<'a> {
    pub fn new(
        config: &'a EngineConfig,
        registry: &'a dyn OntologyRegistry,
        search: &'a dyn SearchIndex,
        annotator: &'a dyn Annotator,
    ) -> Self {
        Self {
            config,
            registry,
            search,
            annotator,
            sampler: ClassSampler::new(&config.sampler),
            validator: CrossValidator::new(),
        }
    }

    /// Build a fresh report for `ontology`.
    ///
    /// Only a failure to list the ontology's submissions is returned as an
    /// error; every other failure ends up inside the report.
    pub fn generate_report(&self, ontology: &Ontology) -> Result<DiagnosticReport, ReportError> {
        let mut report = DiagnosticReport::new();
        self.run_checks(ontology, &mut report)?;
        report.report_date_updated = Some(report_now());
        Ok(report)
    }

    fn run_checks(
        &self,
        ontology: &Ontology,
        report: &mut DiagnosticReport,
    ) -> Result<(), ReportError> {
        let acronym = ontology.acronym.as_str();

        // === Administration ===
        report.administered_by = self.administrators(acronym, report);

        let submissions = self.registry.submissions(acronym)?;

        // === Summary-only ===
        if ontology.summary_only {
            if submissions.is_empty() {
                emit(report, DiagnosticCode::SummaryOnly, None);
            } else {
                emit(report, DiagnosticCode::SummaryOnlyWithSubmissions, None);
            }
            return Ok(());
        }

        // === Existence ===
        let Some(latest_any) = submissions.iter().max_by_key(|s| s.submission_id) else {
            emit(report, DiagnosticCode::NoSubmissions, None);
            return Ok(());
        };

        // === Creation date ===
        // The first submission is the one with the smallest identifier.
        if let Some(first) = submissions.iter().min_by(|a, b| a.id.cmp(&b.id)) {
            let created = recover(report, "first_submission.creationDate", None, || {
                first.creation_date.map(Some).ok_or_else(|| {
                    ServiceError::MissingAttribute(format!("creationDate of {}", first.id))
                })
            });
            if let Some(created) = created {
                report.date_created = report_timestamp(&created);
            }
        }

        // === Format and log file ===
        report.log_file_path = latest_log_file(
            &self.config.repository_folder,
            acronym,
            latest_any.submission_id,
        );
        report.format = latest_any.has_ontology_language.clone().unwrap_or_default();

        // === Readiness ===
        let ready_statuses = &self.config.ready_statuses;
        let Some(latest_ready) = submissions
            .iter()
            .filter(|s| s.is_ready(ready_statuses))
            .max_by_key(|s| s.submission_id)
        else {
            emit(report, DiagnosticCode::NoReadySubmission, None);
            copy_error_statuses(latest_any, report);
            return Ok(());
        };

        // === Staleness ===
        if latest_any.id != latest_ready.id {
            let ahead = submissions
                .iter()
                .filter(|s| s.submission_id > latest_ready.submission_id)
                .count();
            emit(
                report,
                DiagnosticCode::NoLatestReadySubmission,
                Some(CodeData::Count(ahead as u64)),
            );
        }

        self.check_ready_submission(ontology, latest_ready, report);
        Ok(())
    }

    fn check_ready_submission(
        &self,
        ontology: &Ontology,
        sub: &Submission,
        report: &mut DiagnosticReport,
    ) {
        // Statuses
        copy_error_statuses(sub, report);
        let catalog = recover(report, "submission_status.catalog", Vec::new(), || {
            self.registry.status_catalog()
        });
        for expected in catalog.iter().filter(|st| {
            !st.is_error() && !st.is_diff() && !st.is_archived() && !st.is_rdf_labels()
        }) {
            if !sub.has_status(expected) {
                emit(
                    report,
                    DiagnosticCode::MissingStatus,
                    Some(CodeData::Text(expected.code().to_string())),
                );
            }
        }

        // Roots
        if ontology.flat {
            emit(report, DiagnosticCode::Flat, None);
        } else {
            let roots = recover(report, "submission.roots", Vec::new(), || self.registry.roots(sub));
            if roots.is_empty() {
                emit(report, DiagnosticCode::NoRootsLatestSubmission, None);
            }
        }

        // Metrics
        match sub.metrics {
            None => emit(report, DiagnosticCode::NoMetricsLatestSubmission, None),
            Some(metrics) if metrics.entity_total() < 10 => {
                emit(report, DiagnosticCode::IncorrectMetricsLatestSubmission, None)
            }
            Some(_) => {}
        }

        // Classes
        let samples = self.sampler.sample(self.registry, sub, report);
        debug!(acronym = %ontology.acronym, samples = samples.len(), "sampled classes");
        if samples.is_empty() {
            emit(report, DiagnosticCode::NoClassesLatestSubmission, None);
        } else {
            self.validator.cross_check(
                &samples,
                &ontology.acronym,
                self.search,
                self.annotator,
                report,
            );
        }
    }

    /// Usernames of the ontology's administrators.
    ///
    /// The lookup is retried once after a short pause; a second failure
    /// leaves the list empty.
    fn administrators(&self, acronym: &str, report: &mut DiagnosticReport) -> Vec<String> {
        let admins = match self.registry.administrators(acronym) {
            Ok(admins) => admins,
            Err(err) => {
                warn!(acronym, error = %err, "administrators lookup failed, retrying once");
                thread::sleep(self.config.admin_retry_delay());
                recover(report, "ontology.administeredBy", Vec::new(), || {
                    self.registry.administrators(acronym)
                })
            }
        };

        admins
            .into_iter()
            .map(|admin| match admin.username {
                Some(username) => username,
                None => {
                    record_failure(
                        report,
                        "administrator.username",
                        &ServiceError::MissingAttribute(format!("username of {}", admin.id)),
                    );
                    admin.id_segment().to_string()
                }
            })
            .collect()
    }
}

fn copy_error_statuses(sub: &Submission, report: &mut DiagnosticReport) {
    for status in sub.error_statuses() {
        emit(
            report,
            DiagnosticCode::ErrorStatus,
            Some(CodeData::Text(status.code().to_string())),
        );
    }
}

/// Most recently modified `*.log` of a submission, relative to `repository`.
///
/// Empty when the submission directory or its logs are missing.
pub fn latest_log_file(repository: &Path, acronym: &str, submission_id: u64) -> String {
    let dir = repository.join(acronym).join(submission_id.to_string());
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return String::new();
    };

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "log"))
        .filter_map(|path| {
            let modified = path.metadata().ok()?.modified().ok()?;
            Some((modified, path))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| {
            path.strip_prefix(repository)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_latest_log_file_picks_newest_and_strips_root() {
        let repo = tempfile::tempdir().unwrap();
        let dir = repo.path().join("GO").join("4");
        fs::create_dir_all(&dir).unwrap();

        let old = File::create(dir.join("parsing.log")).unwrap();
        old.set_modified(SystemTime::now() - Duration::from_secs(3600)).unwrap();
        File::create(dir.join("latest.log")).unwrap();
        File::create(dir.join("ontology.owl")).unwrap();

        assert_eq!(latest_log_file(repo.path(), "GO", 4), "GO/4/latest.log");
    }

    #[test]
    fn test_latest_log_file_missing_directory_is_empty() {
        let repo = tempfile::tempdir().unwrap();
        assert_eq!(latest_log_file(repo.path(), "GO", 1), "");
    }
}
