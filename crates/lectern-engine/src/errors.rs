//! Error types for the instruction engine.

use serde::Serialize;
use thiserror::Error;

use lectern_core::DocumentId;

/// Errors raised while building snapshots or answering queries.
///
/// Pattern errors never fail a whole corpus: the offending document is
/// excluded and reported through a [`DocumentRejection`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A glob failed to compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The pattern as declared by the document.
        pattern: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A document declared no usable patterns.
    #[error("document declares no patterns")]
    EmptyPatternSet,

    /// Another document with the same id was kept instead.
    #[error("duplicate document id (kept {kept_source})")]
    DuplicateId {
        /// Source of the document that was kept.
        kept_source: String,
    },

    /// A query referenced a snapshot version that is no longer current.
    #[error("snapshot version {requested} is stale (current is {current})")]
    StaleSnapshot {
        /// Version named by the caller.
        requested: u64,
        /// Version currently published.
        current: u64,
    },

    /// A snapshot was published out of order.
    #[error("snapshot version {proposed} does not follow current version {current}")]
    NonMonotonicVersion {
        /// Version currently published.
        current: u64,
        /// Version that was offered.
        proposed: u64,
    },
}

/// A document excluded from a snapshot, with the reason.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRejection {
    /// Id of the excluded document.
    pub id: DocumentId,
    /// Where the document came from.
    pub source_ref: String,
    /// Why it was excluded.
    #[serde(serialize_with = "serialize_display")]
    pub error: EngineError,
}

fn serialize_display<S: serde::Serializer>(
    error: &EngineError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
