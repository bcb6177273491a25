//! Unified Error Model
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: these abort a refresh and reach the caller.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("REPORT/NOT_FOUND: ontologies report file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("REGISTRY/{0}")]
    Registry(#[from] ServiceError),

    #[error("LOCK/UNAVAILABLE: {0}")]
    LockUnavailable(String),

    #[error("LOCK/TIMEOUT: lease {key} still held after {waited_ms}ms")]
    LockTimeout { key: String, waited_ms: u64 },

    #[error("IO/{0}")]
    Io(#[from] std::io::Error),

    #[error("SERIALIZE/{0}")]
    Serialize(#[from] serde_json::Error),

    #[error("CONFIG/{0}")]
    Config(String),
}

/// Failure reported by an external collaborator (registry, search, annotator).
///
/// These never escape a pipeline step: they are folded into the
/// `errRunningReport` code using [`ServiceError::kind`] as the failure kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Query(String),

    #[error("{0}")]
    MissingAttribute(String),

    #[error("{0}")]
    Decode(String),
}

impl ServiceError {
    /// Stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "Unavailable",
            Self::Query(_) => "QueryError",
            Self::MissingAttribute(_) => "AttributeNotLoaded",
            Self::Decode(_) => "DecodeError",
        }
    }
}
