//! The instruction document, the unit of the corpus.

use serde::{Deserialize, Serialize};

use crate::ids::DocumentId;

/// A single instruction document.
///
/// Constructed once by a loader and never mutated: fields are private and
/// only exposed through accessors. Pattern validity is checked when the
/// document is added to a snapshot, not here, so that an invalid document
/// can still be built and reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionDocument {
    id: DocumentId,
    patterns: Vec<String>,
    description: String,
    body: String,
    source_ref: String,
}

impl InstructionDocument {
    /// Create a document. `source_ref` defaults to the id.
    #[must_use]
    pub fn new(
        id: impl Into<DocumentId>,
        patterns: Vec<String>,
        body: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let source_ref = id.as_str().to_owned();
        Self {
            id,
            patterns,
            description: String::new(),
            body: body.into(),
            source_ref,
        }
    }

    /// Set the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the provenance pointer (path or origin).
    #[must_use]
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = source_ref.into();
        self
    }

    /// Stable identifier.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Glob patterns, in declaration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Short summary; may be empty.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Instruction text payload.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Where the document came from. Diagnostics and tie-breaking only.
    pub fn source_ref(&self) -> &str {
        &self.source_ref
    }
}
