//! Step recovery: the single wrapper every recoverable pipeline step runs through
use crate::codes::{emit, CodeData, DiagnosticCode};
use crate::data_model::DiagnosticReport;
use crate::error::ServiceError;

/// Run `step`; on failure record `errRunningReport` for `component` and
/// continue with `fallback`.
pub fn recover<T>(
    report: &mut DiagnosticReport,
    component: &str,
    fallback: T,
    step: impl FnOnce() -> Result<T, ServiceError>,
) -> T {
    match step() {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(component, kind = err.kind(), error = %err, "report step failed");
            record_failure(report, component, &err);
            fallback
        }
    }
}

/// Fold a collaborator failure into the report.
pub fn record_failure(report: &mut DiagnosticReport, component: &str, err: &ServiceError) {
    emit(
        report,
        DiagnosticCode::RunningReport,
        Some(CodeData::failure(component, err.kind(), err.to_string())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_value_through() {
        let mut report = DiagnosticReport::new();
        let value = recover(&mut report, "roots", Vec::<String>::new(), || {
            Ok(vec!["Thing".to_string()])
        });
        assert_eq!(value, vec!["Thing".to_string()]);
        assert!(!report.problem);
        assert!(report.codes.is_empty());
    }

    #[test]
    fn test_failure_records_and_falls_back() {
        let mut report = DiagnosticReport::new();
        let value = recover(&mut report, "roots", 0u64, || {
            Err(ServiceError::Unavailable("store offline".into()))
        });
        assert_eq!(value, 0);
        assert!(report.problem);
        assert_eq!(
            report.entries("errRunningReport"),
            ["Error while running report on component roots: Unavailable: store offline"]
        );
    }
}
