//! Specificity of a single (brace-free) glob alternative.
//!
//! Narrow patterns override broad ones. Components, most significant first:
//!
//! 1. `exact`: no wildcard at all
//! 2. fewer `**` tokens (`**` is strictly broader than `*`)
//! 3. `anchored_name`: the final path segment carries literal text, as in
//!    `**/*.ts` or `**/Dockerfile`, unlike `**/*` or `src/**`
//! 4. more literal characters before the first and after the last wildcard
//! 5. fewer `*` tokens
//! 6. fewer single-character wildcards (`?` and `[...]` classes)
//!
//! [`Specificity::score`] packs these into a `u64` whose natural order is the
//! order above.

use serde::Serialize;

/// Structural breadth measurements of one glob alternative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Specificity {
    /// No wildcard characters.
    pub exact: bool,
    /// Number of `**` tokens.
    pub globstars: u32,
    /// Number of single `*` tokens.
    pub stars: u32,
    /// Number of `?` and `[...]` tokens.
    pub singles: u32,
    /// Final path segment contains literal characters.
    pub anchored_name: bool,
    /// Literal characters before the first wildcard plus after the last.
    pub literal_edges: u32,
    /// All literal characters.
    pub literal_total: u32,
}

impl Specificity {
    /// Measure a glob alternative. Braces must already be expanded.
    pub fn of(pattern: &str) -> Self {
        let mut spec = Self::default();
        let mut prefix: u32 = 0;
        let mut tail: u32 = 0;
        let mut seen_wildcard = false;
        let mut segment_has_literal = false;

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            let wildcard = match c {
                '*' => {
                    if chars.peek() == Some(&'*') {
                        while chars.peek() == Some(&'*') {
                            let _ = chars.next();
                        }
                        spec.globstars += 1;
                    } else {
                        spec.stars += 1;
                    }
                    true
                }
                '?' => {
                    spec.singles += 1;
                    true
                }
                '[' => {
                    for class_char in chars.by_ref() {
                        if class_char == ']' {
                            break;
                        }
                    }
                    spec.singles += 1;
                    true
                }
                _ => false,
            };

            if wildcard {
                seen_wildcard = true;
                tail = 0;
                continue;
            }

            if c == '\\' {
                let _ = chars.next();
            }
            spec.literal_total += 1;
            tail += 1;
            if !seen_wildcard {
                prefix += 1;
            }
            if c == '/' {
                segment_has_literal = false;
            } else {
                segment_has_literal = true;
            }
        }

        spec.exact = !seen_wildcard;
        spec.anchored_name = segment_has_literal;
        spec.literal_edges = if spec.exact {
            spec.literal_total
        } else {
            prefix + tail
        };
        spec
    }

    /// Packed score; higher means more specific.
    pub fn score(&self) -> u64 {
        let inverse = |n: u32| u64::from(255 - n.min(255));
        (u64::from(self.exact) << 60)
            | (inverse(self.globstars) << 52)
            | (u64::from(self.anchored_name) << 51)
            | (u64::from(self.literal_edges.min(0xFFFF)) << 35)
            | (inverse(self.stars) << 27)
            | (inverse(self.singles) << 19)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
