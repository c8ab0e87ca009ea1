//! Immutable, versioned corpus snapshots.
//!
//! A [`CorpusSnapshot`] is built once from a batch of documents and never
//! changes afterwards. Documents whose patterns fail to compile, declare no
//! patterns, or reuse another document's id are excluded and listed as
//! [`DocumentRejection`]s; the rest form the active corpus.
//!
//! ## Determinism
//!
//! Active documents are stored sorted by id, and duplicate ids are resolved by
//! keeping the valid document with the lexically smallest `source_ref`. The
//! input order of the batch therefore never influences a query result.

use std::sync::Arc;

use lectern_core::{InstructionDocument, normalize_path};
use tracing::{debug, info, warn};

use crate::conflicts;
use crate::errors::{DocumentRejection, EngineError};
use crate::matcher::{self, CompiledMatcher};
use crate::ranker;
use crate::types::{MatchResult, RankedDocument};

/// An active document with its compiled patterns.
#[derive(Clone, Debug)]
pub struct IndexedDocument {
    document: Arc<InstructionDocument>,
    matcher: CompiledMatcher,
}

impl IndexedDocument {
    /// The document.
    pub fn document(&self) -> &Arc<InstructionDocument> {
        &self.document
    }

    /// Its compiled patterns.
    pub fn matcher(&self) -> &CompiledMatcher {
        &self.matcher
    }
}

/// Versioned, read-only view of the instruction corpus.
#[derive(Clone, Debug)]
pub struct CorpusSnapshot {
    version: u64,
    documents: Vec<IndexedDocument>,
    rejections: Vec<DocumentRejection>,
}

impl CorpusSnapshot {
    /// Snapshot with no documents.
    #[must_use]
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            documents: Vec::new(),
            rejections: Vec::new(),
        }
    }

    /// Validate and index `documents` as snapshot `version`.
    ///
    /// Never fails: invalid documents end up in [`rejections`](Self::rejections).
    #[must_use]
    pub fn build(version: u64, documents: impl IntoIterator<Item = InstructionDocument>) -> Self {
        let mut batch: Vec<InstructionDocument> = documents.into_iter().collect();
        batch.sort_by(|a, b| a.id().cmp(b.id()).then_with(|| a.source_ref().cmp(b.source_ref())));

        let mut active: Vec<IndexedDocument> = Vec::with_capacity(batch.len());
        let mut rejections = Vec::new();

        for document in batch {
            // Batch is sorted, so an already-active twin is always the last entry.
            if let Some(kept) = active.last().map(|entry| &entry.document) {
                if kept.id() == document.id() {
                    let error = EngineError::DuplicateId {
                        kept_source: kept.source_ref().to_owned(),
                    };
                    rejections.push(reject(&document, error));
                    continue;
                }
            }

            match matcher::compile(document.patterns()) {
                Ok(matcher) => active.push(IndexedDocument {
                    document: Arc::new(document),
                    matcher,
                }),
                Err(error) => rejections.push(reject(&document, error)),
            }
        }

        for rejection in &rejections {
            warn!(
                id = %rejection.id,
                source = %rejection.source_ref,
                error = %rejection.error,
                "instruction document rejected"
            );
        }
        info!(
            version,
            active = active.len(),
            rejected = rejections.len(),
            "corpus snapshot built"
        );

        Self {
            version,
            documents: active,
            rejections,
        }
    }

    /// Monotonic version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Active documents, sorted by id.
    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    /// Excluded documents with the reason, sorted by id.
    pub fn rejections(&self) -> &[DocumentRejection] {
        &self.rejections
    }

    /// Number of active documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether there are no active documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Active document by id.
    pub fn get(&self, id: &str) -> Option<&IndexedDocument> {
        self.documents
            .binary_search_by(|entry| entry.document.id().as_str().cmp(id))
            .ok()
            .and_then(|idx| self.documents.get(idx))
    }

    /// Rank the active documents matching an already-normalized path.
    pub fn rank(&self, normalized_path: &str) -> Vec<RankedDocument> {
        ranker::rank(
            normalized_path,
            self.documents.iter().map(|entry| (&entry.document, &entry.matcher)),
        )
    }

    /// Full match result for `path`, with or without conflict detection.
    pub fn evaluate(&self, path: &str, detect_conflicts: bool) -> MatchResult {
        let path = normalize_path(path);
        let documents = self.rank(&path);
        let conflicts = if detect_conflicts {
            conflicts::detect(&documents)
        } else {
            Vec::new()
        };
        debug!(
            path = %path,
            version = self.version,
            matched = documents.len(),
            conflicts = conflicts.len(),
            "evaluated path"
        );
        MatchResult {
            path,
            snapshot_version: self.version,
            documents,
            conflicts,
        }
    }
}

fn reject(document: &InstructionDocument, error: EngineError) -> DocumentRejection {
    DocumentRejection {
        id: document.id().clone(),
        source_ref: document.source_ref().to_owned(),
        error,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
