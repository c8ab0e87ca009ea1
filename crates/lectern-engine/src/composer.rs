//! Budgeted composition of ranked instruction bodies.
//!
//! Bodies are emitted most specific first and joined with a separator. The
//! first document that would push the text past the budget is dropped along
//! with everything ranked below it; a document is either present in full or
//! absent. Bodies identical to one already emitted are skipped, and an empty
//! body adds no separator.

use std::collections::HashSet;

use lectern_settings::{BudgetUnit, ComposeSettings};
use tracing::{debug, info};

use crate::types::{ComposedContext, RankedDocument};

/// Separator placed between bodies unless configured otherwise.
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// A size limit and the unit it is measured in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    /// Maximum size of the composed text.
    pub limit: usize,
    /// Unit of `limit`.
    pub unit: BudgetUnit,
    /// Characters per token when `unit` is [`BudgetUnit::Tokens`].
    pub chars_per_token: usize,
}

impl Budget {
    /// Budget in Unicode scalar values.
    pub fn chars(limit: usize) -> Self {
        Self {
            limit,
            unit: BudgetUnit::Chars,
            chars_per_token: 4,
        }
    }

    /// Budget in UTF-8 bytes.
    pub fn bytes(limit: usize) -> Self {
        Self {
            unit: BudgetUnit::Bytes,
            ..Self::chars(limit)
        }
    }

    /// Budget in estimated tokens.
    pub fn tokens(limit: usize, chars_per_token: usize) -> Self {
        Self {
            limit,
            unit: BudgetUnit::Tokens,
            chars_per_token,
        }
    }

    /// Budget described by composition settings.
    pub fn from_settings(settings: &ComposeSettings) -> Self {
        Self {
            limit: settings.budget,
            unit: settings.budget_unit,
            chars_per_token: settings.chars_per_token,
        }
    }

    /// Size of `text` in this budget's unit.
    pub fn measure(&self, text: &str) -> usize {
        self.measure_counts(text.chars().count(), text.len())
    }

    fn measure_counts(&self, chars: usize, bytes: usize) -> usize {
        match self.unit {
            BudgetUnit::Chars => chars,
            BudgetUnit::Bytes => bytes,
            BudgetUnit::Tokens => chars.div_ceil(self.chars_per_token.max(1)),
        }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::from_settings(&ComposeSettings::default())
    }
}

/// Joins ranked bodies under a budget.
#[derive(Clone, Debug)]
pub struct Composer {
    separator: String,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl Composer {
    /// Composer using `separator` between bodies.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Separator placed between bodies.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Compose `ranked` (most specific first) within `budget`.
    pub fn compose(&self, ranked: &[RankedDocument], budget: &Budget) -> ComposedContext {
        let sep_chars = self.separator.chars().count();
        let sep_bytes = self.separator.len();

        let mut context = ComposedContext::empty();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut chars = 0usize;
        let mut bytes = 0usize;

        for doc in ranked {
            let body = doc.body();
            if seen.contains(body) {
                context.deduplicated.push(doc.id.clone());
                continue;
            }
            if context.truncated {
                context.omitted.push(doc.id.clone());
                continue;
            }

            let joined = !context.text.is_empty() && !body.is_empty();
            let next_chars = chars + body.chars().count() + if joined { sep_chars } else { 0 };
            let next_bytes = bytes + body.len() + if joined { sep_bytes } else { 0 };

            if budget.measure_counts(next_chars, next_bytes) > budget.limit {
                context.truncated = true;
                context.omitted.push(doc.id.clone());
                continue;
            }

            if joined {
                context.text.push_str(&self.separator);
            }
            context.text.push_str(body);
            context.included.push(doc.id.clone());
            let _ = seen.insert(body);
            chars = next_chars;
            bytes = next_bytes;
        }

        context.size = budget.measure_counts(chars, bytes);

        if context.truncated {
            info!(
                included = context.included.len(),
                omitted = context.omitted.len(),
                limit = budget.limit,
                unit = ?budget.unit,
                "instruction budget exceeded, lower-ranked documents omitted"
            );
        } else {
            debug!(
                included = context.included.len(),
                deduplicated = context.deduplicated.len(),
                size = context.size,
                "composed instruction context"
            );
        }

        context
    }
}

/// Compose with the default separator.
pub fn compose(ranked: &[RankedDocument], budget: &Budget) -> ComposedContext {
    Composer::default().compose(ranked, budget)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use lectern_core::{DocumentId, InstructionDocument};

    fn ranked(id: &str, body: &str) -> RankedDocument {
        let doc = InstructionDocument::new(id, vec!["**".into()], body);
        RankedDocument {
            id: doc.id().clone(),
            score: 0,
            specificity: crate::Specificity::default(),
            matched_pattern: "**".into(),
            document: Arc::new(doc),
        }
    }

    fn ids(list: &[DocumentId]) -> Vec<&str> {
        list.iter().map(DocumentId::as_str).collect()
    }

    // -- measuring --

    #[test]
    fn measures_in_each_unit() {
        let text = "héllo"; // 5 chars, 6 bytes
        assert_eq!(Budget::chars(0).measure(text), 5);
        assert_eq!(Budget::bytes(0).measure(text), 6);
        assert_eq!(Budget::tokens(0, 4).measure(text), 2);
        assert_eq!(Budget::tokens(0, 5).measure(text), 1);
        assert_eq!(Budget::tokens(0, 4).measure(""), 0);
    }

    #[test]
    fn zero_chars_per_token_counts_chars() {
        assert_eq!(Budget::tokens(0, 0).measure("abc"), 3);
    }

    #[test]
    fn budget_from_settings() {
        let budget = Budget::from_settings(&ComposeSettings::default());
        assert_eq!(budget.limit, 32_000);
        assert_eq!(budget.unit, BudgetUnit::Chars);
        assert_eq!(budget, Budget::default());
    }

    // -- composing --

    #[test]
    fn single_document_is_emitted_verbatim() {
        let ctx = compose(&[ranked("all", "Be concise.")], &Budget::chars(100));
        assert_eq!(ctx.text, "Be concise.");
        assert_eq!(ids(&ctx.included), vec!["all"]);
        assert!(!ctx.truncated);
        assert!(ctx.omitted.is_empty());
        assert_eq!(ctx.size, 11);
    }

    #[test]
    fn joins_in_rank_order_with_separator() {
        let docs = [ranked("narrow", "N"), ranked("broad", "B")];
        let ctx = compose(&docs, &Budget::chars(100));
        assert_eq!(ctx.text, "N\n\nB");
        assert_eq!(ctx.size, 4);
    }

    #[test]
    fn custom_separator() {
        let docs = [ranked("a", "one"), ranked("b", "two")];
        let ctx = Composer::new("\n---\n").compose(&docs, &Budget::chars(100));
        assert_eq!(ctx.text, "one\n---\ntwo");
    }

    #[test]
    fn omits_whole_documents_past_budget() {
        let docs = [ranked("X", "12345678"), ranked("Y", "abcdefgh")];
        let ctx = compose(&docs, &Budget::chars(10));
        assert_eq!(ctx.text, "12345678");
        assert!(ctx.truncated);
        assert_eq!(ids(&ctx.omitted), vec!["Y"]);
        assert_eq!(ids(&ctx.included), vec!["X"]);
    }

    #[test]
    fn later_small_documents_are_omitted_too() {
        let docs = [ranked("a", "aaaa"), ranked("big", "bbbbbbbbbb"), ranked("c", "c")];
        let ctx = compose(&docs, &Budget::chars(10));
        assert_eq!(ctx.text, "aaaa");
        assert_eq!(ids(&ctx.omitted), vec!["big", "c"]);
    }

    #[test]
    fn separator_counts_against_budget() {
        let docs = [ranked("a", "aaaa"), ranked("b", "bbbb")];
        assert!(!compose(&docs, &Budget::chars(10)).truncated);
        assert!(compose(&docs, &Budget::chars(9)).truncated);
    }

    #[test]
    fn first_document_over_budget_yields_empty_text() {
        let ctx = compose(&[ranked("huge", "0123456789")], &Budget::chars(5));
        assert!(ctx.text.is_empty());
        assert!(ctx.truncated);
        assert_eq!(ids(&ctx.omitted), vec!["huge"]);
        assert_eq!(ctx.size, 0);
    }

    #[test]
    fn identical_bodies_appear_once() {
        let docs = [ranked("a", "Same."), ranked("b", "Other."), ranked("c", "Same.")];
        let ctx = compose(&docs, &Budget::chars(100));
        assert_eq!(ctx.text, "Same.\n\nOther.");
        assert_eq!(ids(&ctx.deduplicated), vec!["c"]);
    }

    #[test]
    fn empty_body_adds_no_separator() {
        let docs = [ranked("X", "a"), ranked("Y", ""), ranked("Z", "b")];
        let ctx = compose(&docs, &Budget::chars(100));
        assert_eq!(ctx.text, "a\n\nb");
        assert_eq!(ctx.size, 4);
        assert_eq!(ids(&ctx.included), vec!["X", "Y", "Z"]);

        let docs = [ranked("Y", ""), ranked("X", "a")];
        let ctx = compose(&docs, &Budget::chars(1));
        assert_eq!(ctx.text, "a");
        assert!(!ctx.truncated);
    }

    #[test]
    fn empty_input_gives_empty_context() {
        assert_eq!(compose(&[], &Budget::chars(10)), ComposedContext::empty());
    }

    #[test]
    fn byte_budget_counts_multibyte_text() {
        let docs = [ranked("a", "ééééé")]; // 5 chars, 10 bytes
        assert!(!compose(&docs, &Budget::chars(5)).truncated);
        assert!(compose(&docs, &Budget::bytes(9)).truncated);
    }

    #[test]
    fn logs_truncation_at_info() {
        let (logs, _guard) = lectern_logging::capture_logs();
        let docs = [ranked("X", "12345678"), ranked("Y", "abcdefgh")];
        let _ = compose(&docs, &Budget::chars(10));
        assert!(logs.has_event(tracing::Level::INFO, "budget exceeded"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn respects_budget_and_flags(
                bodies in proptest::collection::vec("[a-zé ]{0,12}", 0..8),
                limit in 0usize..60,
                unit in 0u8..3,
            ) {
                let docs: Vec<_> = bodies
                    .iter()
                    .enumerate()
                    .map(|(i, b)| ranked(&format!("d{i}"), b))
                    .collect();
                let budget = match unit {
                    0 => Budget::chars(limit),
                    1 => Budget::bytes(limit),
                    _ => Budget::tokens(limit, 3),
                };
                let ctx = compose(&docs, &budget);

                prop_assert!(budget.measure(&ctx.text) <= limit);
                prop_assert_eq!(budget.measure(&ctx.text), ctx.size);
                prop_assert_eq!(ctx.truncated, !ctx.omitted.is_empty());
                prop_assert_eq!(
                    ctx.included.len() + ctx.omitted.len() + ctx.deduplicated.len(),
                    docs.len()
                );
                prop_assert_eq!(compose(&docs, &budget), ctx);
            }
        }
    }
}
