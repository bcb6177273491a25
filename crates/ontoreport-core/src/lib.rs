//! Ontoreport Core: data model, diagnostic codes and collaborator contracts
//!
//! Shared by the diagnostic pipeline, the report store and the CLI.

pub mod catalog;
pub mod codes;
pub mod config;
pub mod data_model;
pub mod error;
pub mod registry;
pub mod step;

pub use catalog::CatalogSnapshot;
pub use codes::{emit, CodeData, CodeKind, DiagnosticCode};
pub use config::{EngineConfig, LockConfig, SamplerConfig};
pub use data_model::{
    report_now, report_timestamp, Administrator, Annotation, ClassItem, ClassPage, CodeValue,
    DiagnosticReport, Metrics, Ontology, PageRequest, ReportCollection, SearchQuery,
    SearchResponse, Submission, SubmissionStatus,
};
pub use error::{ReportError, ServiceError};
pub use registry::{Annotator, OntologyRegistry, SearchIndex};
pub use step::recover;
