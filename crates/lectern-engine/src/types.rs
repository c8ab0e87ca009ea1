//! Query result types.
//!
//! All of them serialize to camelCase JSON for hosts that forward results
//! over the wire. Document bodies are not serialized with match results;
//! they travel in [`ComposedContext::text`].

use std::sync::Arc;

use serde::Serialize;

use lectern_core::{DocumentId, InstructionDocument};

use crate::specificity::Specificity;

/// A matching document with the specificity that placed it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDocument {
    /// Document id.
    pub id: DocumentId,
    /// Packed specificity of the best matching alternative.
    pub score: u64,
    /// Components behind `score`.
    pub specificity: Specificity,
    /// The alternative that produced `score`.
    pub matched_pattern: String,
    /// The document itself.
    #[serde(skip)]
    pub document: Arc<InstructionDocument>,
}

impl RankedDocument {
    /// Instruction text of the ranked document.
    pub fn body(&self) -> &str {
        self.document.body()
    }
}

/// Two matching documents giving opposite directives on one subject.
///
/// A signal for the caller. It never blocks composition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictPair {
    /// The higher-ranked document.
    pub preferred: DocumentId,
    /// The lower-ranked document.
    pub other: DocumentId,
    /// What both documents talk about, lowercased.
    pub subject: String,
    /// The directive line from `preferred`.
    pub preferred_directive: String,
    /// The directive line from `other`.
    pub other_directive: String,
}

/// Every document applicable to one path, most specific first.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// The normalized query path.
    pub path: String,
    /// Snapshot the result was computed against.
    pub snapshot_version: u64,
    /// Ranked matches.
    pub documents: Vec<RankedDocument>,
    /// Contradictions among `documents`.
    pub conflicts: Vec<ConflictPair>,
}

impl MatchResult {
    /// Ids of the matched documents in rank order.
    pub fn ids(&self) -> Vec<&DocumentId> {
        self.documents.iter().map(|d| &d.id).collect()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Instruction context assembled for one path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedContext {
    /// Documents whose bodies are in `text`, in output order.
    pub included: Vec<DocumentId>,
    /// The composed instruction text.
    pub text: String,
    /// Whether any document was left out for budget reasons.
    pub truncated: bool,
    /// Documents left out for budget reasons.
    pub omitted: Vec<DocumentId>,
    /// Documents skipped because an identical body was already included.
    pub deduplicated: Vec<DocumentId>,
    /// Size of `text` in the budget unit.
    pub size: usize,
}

impl ComposedContext {
    /// Context for a path that matched nothing.
    pub fn empty() -> Self {
        Self::default()
    }
}
