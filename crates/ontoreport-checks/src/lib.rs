//! Ontoreport Checks: per-ontology diagnostics
//!
//! # Pipeline Flow
//!
//! ```text
//! Registry → DiagnosticPipeline → ClassSampler → CrossValidator → ReportStore
//!               ↓                      ↓              ↓
//!          structural codes       sample labels   coverage codes
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ontoreport_checks::ReportEngine;
//!
//! let engine = ReportEngine::new(config, registry, search, annotator, store);
//! let summary = engine.refresh_report(&["GO".to_string()])?;
//! println!("reported {:?}, skipped {:?}", summary.reported, summary.skipped);
//! ```

pub mod crossval;
pub mod engine;
pub mod pipeline;
pub mod sampler;

pub use crossval::{search_query, solr_escape, CrossValidator};
pub use engine::{ReportEngine, RunSummary};
pub use pipeline::DiagnosticPipeline;
pub use sampler::ClassSampler;
