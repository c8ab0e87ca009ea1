//! Contradiction detection between matched documents.
//!
//! A directive is a body line whose first word is a marker:
//!
//! ```text
//! positive: use, prefer, always
//! negative: avoid, never, don't, do not
//! ```
//!
//! The subject is the first significant word after the marker, so
//! `- **Never** use the \`unwrap()\` method` is a negative directive on
//! `unwrap`. `prefer X over Y` and `use X instead of Y` also yield an opposite
//! directive on `Y`. Lines inside fenced code blocks are ignored.
//!
//! Two documents conflict when they hold opposite directives on the same
//! subject. The result is informational: composition never consults it.

use std::collections::BTreeMap;

use crate::types::{ConflictPair, RankedDocument};

/// Words skipped between a marker and its subject.
const FILLERS: &[&str] = &[
    "use", "using", "the", "a", "an", "to", "prefer", "always", "only", "of",
];

/// Direction of a directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    /// Asks for something.
    Positive,
    /// Forbids something.
    Negative,
}

impl Polarity {
    fn flip(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

/// One directive extracted from a document body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    /// Direction.
    pub polarity: Polarity,
    /// Lowercased subject word.
    pub subject: String,
    /// The source line, trimmed.
    pub line: String,
}

/// Extract every directive from a document body, in line order.
pub fn extract_directives(body: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    let mut in_fence = false;

    for raw in body.lines() {
        let trimmed = raw.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || trimmed.is_empty() {
            continue;
        }

        let normalized = normalize_line(trimmed);
        let tokens: Vec<&str> = normalized
            .split_whitespace()
            .map(clean_token)
            .filter(|t| !t.is_empty())
            .collect();

        let (polarity, rest) = match tokens.as_slice() {
            ["do" | "does", "not", rest @ ..] => (Polarity::Negative, rest),
            ["don't" | "dont" | "never" | "avoid", rest @ ..] => (Polarity::Negative, rest),
            ["use" | "prefer" | "always", rest @ ..] => (Polarity::Positive, rest),
            _ => continue,
        };

        let mut polarity = polarity;
        let mut idx = 0;
        // "always avoid X", "never use X"
        if let Some(&("avoid" | "never")) = rest.first() {
            polarity = polarity.flip();
            idx = 1;
        }

        let Some((subject_idx, subject)) = next_subject(rest, idx) else {
            continue;
        };
        directives.push(Directive {
            polarity,
            subject: subject.to_owned(),
            line: trimmed.to_owned(),
        });

        let tail = &rest[subject_idx + 1..];
        let alternative = match tail.iter().position(|t| *t == "over" || *t == "instead") {
            Some(pos) => next_subject(tail, pos + 1),
            None => None,
        };
        if let Some((_, other)) = alternative {
            directives.push(Directive {
                polarity: polarity.flip(),
                subject: other.to_owned(),
                line: trimmed.to_owned(),
            });
        }
    }

    directives
}

/// Find every pair of documents holding opposite directives on one subject.
///
/// Pairs follow rank order (`preferred` always ranks above `other`), then
/// subject in lexical order. A pair appears once per subject.
pub fn detect(ranked: &[RankedDocument]) -> Vec<ConflictPair> {
    let stances: Vec<BTreeMap<String, Stance>> = ranked
        .iter()
        .map(|doc| stance_map(&extract_directives(doc.body())))
        .collect();

    let mut conflicts = Vec::new();
    for (i, preferred) in ranked.iter().enumerate() {
        for (j, other) in ranked.iter().enumerate().skip(i + 1) {
            if preferred.id == other.id {
                continue;
            }
            for (subject, ours) in &stances[i] {
                let Some(theirs) = stances[j].get(subject) else {
                    continue;
                };
                let opposed = match (&ours.positive, &theirs.negative) {
                    (Some(a), Some(b)) => Some((a, b)),
                    _ => match (&ours.negative, &theirs.positive) {
                        (Some(a), Some(b)) => Some((a, b)),
                        _ => None,
                    },
                };
                if let Some((a, b)) = opposed {
                    conflicts.push(ConflictPair {
                        preferred: preferred.id.clone(),
                        other: other.id.clone(),
                        subject: subject.clone(),
                        preferred_directive: a.clone(),
                        other_directive: b.clone(),
                    });
                }
            }
        }
    }
    conflicts
}

/// First positive and first negative line a document has on a subject.
#[derive(Debug, Default)]
struct Stance {
    positive: Option<String>,
    negative: Option<String>,
}

fn stance_map(directives: &[Directive]) -> BTreeMap<String, Stance> {
    let mut map: BTreeMap<String, Stance> = BTreeMap::new();
    for d in directives {
        let stance = map.entry(d.subject.clone()).or_default();
        let slot = match d.polarity {
            Polarity::Positive => &mut stance.positive,
            Polarity::Negative => &mut stance.negative,
        };
        if slot.is_none() {
            *slot = Some(d.line.clone());
        }
    }
    map
}

fn next_subject<'a>(tokens: &[&'a str], from: usize) -> Option<(usize, &'a str)> {
    tokens
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, t)| !FILLERS.contains(*t) && !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|(_, t)| !matches!(**t, "over" | "instead"))
        .map(|(i, t)| (i, *t))
}

/// Strip list and quote markers, emphasis, and code ticks, then lowercase.
fn normalize_line(line: &str) -> String {
    let mut rest = line;
    loop {
        let stripped = rest
            .strip_prefix("- ")
            .or_else(|| rest.strip_prefix("* "))
            .or_else(|| rest.strip_prefix("+ "))
            .or_else(|| rest.strip_prefix('>'))
            .or_else(|| strip_ordinal(rest));
        match stripped {
            Some(s) => rest = s.trim_start(),
            None => break,
        }
    }

    rest.replace("**", "")
        .replace("__", "")
        .replace('`', "")
        .replace('\u{2019}', "'")
        .to_lowercase()
}

/// Strip `1. ` or `1) ` style numbering.
fn strip_ordinal(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") "))
}

fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| !(c.is_alphanumeric() || c == '#' || c == '+'))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
