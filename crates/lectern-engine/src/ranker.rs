//! Specificity ranking of matched documents.
//!
//! Broad documents act as defaults and narrow documents override them, so the
//! output runs from most specific to least specific. Each document is scored
//! by the best alternative that matched the path.
//!
//! ## Ordering
//!
//! 1. Higher packed [`Specificity::score`](crate::Specificity::score).
//! 2. More literal characters in the matched alternative.
//! 3. Ascending document id.
//!
//! Load order never participates, so the ranking is a total order over any
//! set of distinct ids.

use std::cmp::Ordering;
use std::sync::Arc;

use globset::Candidate;
use lectern_core::InstructionDocument;

use crate::matcher::CompiledMatcher;
use crate::types::RankedDocument;

/// Rank every document whose matcher accepts `normalized_path`.
///
/// Documents that do not match are skipped. The result is sorted with
/// [`compare`].
pub fn rank<'a, I>(normalized_path: &str, candidates: I) -> Vec<RankedDocument>
where
    I: IntoIterator<Item = (&'a Arc<InstructionDocument>, &'a CompiledMatcher)>,
{
    let candidate = Candidate::new(normalized_path);

    let mut ranked: Vec<RankedDocument> = candidates
        .into_iter()
        .filter_map(|(document, matcher)| {
            let hit = matcher.best_match_candidate(&candidate)?;
            Some(RankedDocument {
                id: document.id().clone(),
                score: hit.specificity.score(),
                specificity: hit.specificity,
                matched_pattern: hit.pattern.to_owned(),
                document: Arc::clone(document),
            })
        })
        .collect();

    ranked.sort_by(compare);
    ranked
}

/// Total order used by [`rank`]: most specific first.
pub fn compare(a: &RankedDocument, b: &RankedDocument) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(b.specificity.literal_total.cmp(&a.specificity.literal_total))
        .then_with(|| a.id.cmp(&b.id))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
