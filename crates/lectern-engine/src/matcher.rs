//! Glob compilation and matching.
//!
//! A document's pattern list is compiled into one [`CompiledMatcher`]:
//!
//! 1. Each declared pattern is split on top-level commas
//!    (`"**/*.ts, **/*.js"` is two patterns).
//! 2. Brace groups are expanded here, not by `globset`, so every alternative
//!    can be scored on its own (`**/*.{ts,js}` → `**/*.ts`, `**/*.js`).
//!    Groups may nest; expansion is capped at [`MAX_ALTERNATIVES`].
//! 3. Each alternative is compiled with `*` not crossing `/`, and all of them
//!    are combined into one [`GlobSet`]. A `**` sharing its segment with other
//!    text (`src/**.ts`) is compiled as `src/*.ts` plus `src/*/**/*.ts`, since
//!    `globset` only recurses on `**` that is a whole path component.
//!
//! Matching is pure: the same pattern set and path always give the same
//! answer, independent of the file system and the OS path separator.

use std::iter::Peekable;
use std::str::CharIndices;

use globset::{Candidate, GlobBuilder, GlobSet, GlobSetBuilder};
use lectern_core::normalize_path;

use crate::errors::{EngineError, Result};
use crate::specificity::Specificity;

/// Upper bound on brace-expanded alternatives per declared pattern.
pub const MAX_ALTERNATIVES: usize = 256;

/// One brace-free glob alternative with its measured specificity.
#[derive(Clone, Debug)]
struct Alternative {
    pattern: String,
    specificity: Specificity,
}

/// The most specific alternative that matched a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternMatch<'a> {
    /// Alternative text, after brace expansion.
    pub pattern: &'a str,
    /// Its measured specificity.
    pub specificity: Specificity,
}

/// Compiled form of a document's pattern list.
#[derive(Clone, Debug)]
pub struct CompiledMatcher {
    alternatives: Vec<Alternative>,
    /// Alternative index for each glob in `set`.
    owners: Vec<usize>,
    set: GlobSet,
}

impl CompiledMatcher {
    /// Whether any alternative matches `path` (normalized first).
    pub fn matches(&self, path: &str) -> bool {
        self.set.is_match(normalize_path(path))
    }

    /// Most specific matching alternative for an already-normalized path.
    pub fn best_match(&self, normalized_path: &str) -> Option<PatternMatch<'_>> {
        self.best_match_candidate(&Candidate::new(normalized_path))
    }

    /// Like [`best_match`](Self::best_match), reusing a prepared candidate
    /// across many matchers.
    pub(crate) fn best_match_candidate(
        &self,
        candidate: &Candidate<'_>,
    ) -> Option<PatternMatch<'_>> {
        self.set
            .matches_candidate(candidate)
            .into_iter()
            .filter_map(|idx| self.owners.get(idx))
            .filter_map(|&owner| self.alternatives.get(owner))
            .max_by(|a, b| {
                a.specificity
                    .score()
                    .cmp(&b.specificity.score())
                    .then(a.specificity.literal_total.cmp(&b.specificity.literal_total))
                    // Reverse so the lexically smaller pattern wins a full tie
                    .then(b.pattern.cmp(&a.pattern))
            })
            .map(|alt| PatternMatch {
                pattern: &alt.pattern,
                specificity: alt.specificity,
            })
    }

    /// Every alternative after splitting and brace expansion.
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().map(|a| a.pattern.as_str())
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Always `false` for a successfully compiled matcher.
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}

/// Compile a document's declared patterns.
///
/// Fails with [`EngineError::EmptyPatternSet`] when nothing usable is left
/// after splitting and trimming, and [`EngineError::InvalidPattern`] when any
/// pattern is malformed. A partially valid list is an error: a document is
/// either fully active or excluded.
pub fn compile(patterns: &[String]) -> Result<CompiledMatcher> {
    let declared: Vec<&str> = patterns
        .iter()
        .flat_map(|p| split_top_level(p))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if declared.is_empty() {
        return Err(EngineError::EmptyPatternSet);
    }

    let mut builder = GlobSetBuilder::new();
    let mut alternatives = Vec::new();
    let mut owners = Vec::new();

    for source in declared {
        let invalid = |reason: String| EngineError::InvalidPattern {
            pattern: source.to_owned(),
            reason,
        };

        for alternative in expand_braces(source).map_err(invalid)? {
            let owner = alternatives.len();
            for form in recursive_forms(&alternative).map_err(invalid)? {
                let glob = GlobBuilder::new(&form)
                    .literal_separator(true)
                    .backslash_escape(true)
                    .build()
                    .map_err(|e| invalid(e.kind().to_string()))?;
                let _ = builder.add(glob);
                owners.push(owner);
            }
            alternatives.push(Alternative {
                specificity: Specificity::of(&alternative),
                pattern: alternative,
            });
        }
    }

    let set = builder.build().map_err(|e| EngineError::InvalidPattern {
        pattern: e.glob().unwrap_or_default().to_owned(),
        reason: e.kind().to_string(),
    })?;

    Ok(CompiledMatcher {
        alternatives,
        owners,
        set,
    })
}

/// Globs that together match what `pattern` means when every `**` may cross
/// separators.
///
/// ```text
/// recursive_forms("src/**.ts") → ["src/*.ts", "src/*/**/*.ts"]
/// recursive_forms("**.md")     → ["*.md", "*/**/*.md"]
/// recursive_forms("src/**")    → ["src/**"]
/// ```
fn recursive_forms(pattern: &str) -> std::result::Result<Vec<String>, String> {
    let embedded = embedded_globstars(pattern);
    if embedded.len() > MAX_ALTERNATIVES.ilog2() as usize {
        return Err(format!("expands to more than {MAX_ALTERNATIVES} alternatives"));
    }

    let mut forms = vec![String::new()];
    let mut last = 0;
    for (start, end) in embedded {
        let literal = &pattern[last..start];
        forms = forms
            .into_iter()
            .flat_map(|form| [format!("{form}{literal}*"), format!("{form}{literal}*/**/*")])
            .collect();
        last = end;
    }
    let rest = &pattern[last..];
    for form in &mut forms {
        form.push_str(rest);
    }
    Ok(forms)
}

/// Byte ranges of `**` runs that are not a whole path component.
fn embedded_globstars(pattern: &str) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                let _ = chars.next();
            }
            '[' => skip_class(&mut chars),
            '*' => {
                let mut end = idx + 1;
                while let Some(&(next, '*')) = chars.peek() {
                    end = next + 1;
                    let _ = chars.next();
                }
                let whole_segment = (idx == 0 || pattern[..idx].ends_with('/'))
                    && (end == pattern.len() || pattern[end..].starts_with('/'));
                if end - idx >= 2 && !whole_segment {
                    found.push((idx, end));
                }
            }
            _ => {}
        }
    }
    found
}

/// Expand brace groups into the list of brace-free alternatives.
///
/// ```text
/// expand_braces("**/*.{ts,js}")   → ["**/*.ts", "**/*.js"]
/// expand_braces("{a,b{1,2}}.md")  → ["a.md", "b1.md", "b2.md"]
/// expand_braces("**/*.{ts,")      → Err("unclosed alternate group")
/// ```
///
/// Backslash escapes and `[...]` classes are respected: braces inside them
/// are literal.
pub fn expand_braces(pattern: &str) -> std::result::Result<Vec<String>, String> {
    let mut out = Vec::new();
    expand_into(pattern, &mut out)?;
    Ok(out)
}

fn expand_into(pattern: &str, out: &mut Vec<String>) -> std::result::Result<(), String> {
    let Some((open, close)) = find_group(pattern)? else {
        if out.len() >= MAX_ALTERNATIVES {
            return Err(format!("expands to more than {MAX_ALTERNATIVES} alternatives"));
        }
        out.push(pattern.to_owned());
        return Ok(());
    };

    let prefix = &pattern[..open];
    let options = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];

    for option in split_top_level(options) {
        expand_into(&format!("{prefix}{option}{suffix}"), out)?;
    }
    Ok(())
}

/// Byte offsets of the first top-level `{` and its matching `}`.
fn find_group(pattern: &str) -> std::result::Result<Option<(usize, usize)>, String> {
    let mut chars = pattern.char_indices().peekable();
    let mut open = None;
    let mut depth = 0usize;

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                let _ = chars.next();
            }
            '[' => skip_class(&mut chars),
            '{' => {
                if depth == 0 {
                    open = Some(idx);
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    return Err("unopened alternate group".to_string());
                }
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = open {
                        return Ok(Some((start, idx)));
                    }
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        Err("unclosed alternate group".to_string())
    } else {
        Ok(None)
    }
}

/// Split on commas that are outside braces, classes, and escapes.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut chars = s.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                let _ = chars.next();
            }
            '[' => skip_class(&mut chars),
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Consume a character class body up to and including its closing `]`.
///
/// A `]` directly after `[`, `[!` or `[^` is a literal member. An
/// unterminated class consumes the rest of the input; `globset` reports it.
fn skip_class(chars: &mut Peekable<CharIndices<'_>>) {
    if matches!(chars.peek(), Some((_, '!' | '^'))) {
        let _ = chars.next();
    }
    if matches!(chars.peek(), Some((_, ']'))) {
        let _ = chars.next();
    }
    for (_, c) in chars.by_ref() {
        if c == ']' {
            break;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
