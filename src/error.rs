//! Error taxonomy for pipeline runs.
//!
//! Stage code returns `eyre::Result` so context can be attached as errors
//! propagate, but the root cause is always one of these variants. Callers
//! classify a failure with `report.downcast_ref::<EtlError>()`.

use thiserror::Error;

/// Errors that can abort a pipeline run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EtlError {
    /// The source database or the search index could not be reached.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The extraction query was malformed or failed.
    #[error("Query error: {0}")]
    Query(String),

    /// An intermediate artifact could not be read, written or cleaned.
    #[error("Transform error: {0}")]
    Transform(String),

    /// Two source columns normalize to the same name and collisions are rejected.
    #[error("Transform error: columns {first:?} and {second:?} both normalize to {normalized:?}")]
    ColumnCollision {
        first: String,
        second: String,
        normalized: String,
    },

    /// A single document could not be published.
    #[error("Index error: {0}")]
    Index(String),
}

impl EtlError {
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// Short label for log lines and run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connectivity(_) => "connectivity",
            Self::Query(_) => "query",
            Self::Transform(_) | Self::ColumnCollision { .. } => "transform",
            Self::Index(_) => "index",
        }
    }
}

/// Find the [`EtlError`] at the root of an `eyre` report, if any.
pub fn classify(report: &eyre::Report) -> Option<&EtlError> {
    report
        .downcast_ref::<EtlError>()
        .or_else(|| report.chain().find_map(|cause| cause.downcast_ref::<EtlError>()))
}
