//! Instruction file parser.
//!
//! Instruction files are markdown with optional front-matter delimited by
//! `---` lines. Only two keys are read:
//!
//! ```text
//! ---
//! description: Rust conventions
//! applyTo: "**/*.rs, Cargo.toml"
//! ---
//! Use clippy.
//! ```
//!
//! `applyTo` (or `apply_to`) may be a scalar with comma-separated patterns, an
//! inline array, or a block list; all three produce the same pattern list.
//! Commas inside `{...}` or `[...]` belong to the pattern. A hand-written
//! YAML subset reader is enough for this shape.

/// Maximum length of a description taken from the body.
const MAX_DERIVED_DESCRIPTION: usize = 200;

/// Result of parsing one instruction file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// `description` value, or the first prose line of the body.
    pub description: String,
    /// Declared glob patterns, in order. Empty when `applyTo` is missing.
    pub apply_to: Vec<String>,
    /// Markdown after the front-matter, trimmed.
    pub body: String,
    /// Whether a front-matter block was present.
    pub has_frontmatter: bool,
}

/// Parse raw file content.
pub fn parse_instruction_file(raw: &str) -> ParsedInstruction {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let (yaml, body) = split_frontmatter(raw);
    let body = body.trim().to_owned();

    let mut parsed = ParsedInstruction {
        has_frontmatter: yaml.is_some(),
        ..ParsedInstruction::default()
    };
    if let Some(yaml) = yaml {
        read_keys(yaml, &mut parsed);
    }
    if parsed.description.is_empty() {
        parsed.description = derive_description(&body);
    }
    parsed.body = body;
    parsed
}

/// Split `(front-matter, body)`. Without a closing `---` everything is body.
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, content);
    };
    if first.trim_end() != "---" {
        return (None, content);
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == "---" {
            return (Some(&content[start..offset]), &content[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, content)
}

fn read_keys(yaml: &str, parsed: &mut ParsedInstruction) {
    let lines: Vec<&str> = yaml.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        match key.trim() {
            "description" => parsed.description = unquote(value),
            "applyTo" | "apply_to" => {
                parsed.apply_to = parse_patterns(value.trim(), &lines, &mut i);
            }
            _ => {}
        }
    }
}

/// Read a pattern list in any of the accepted shapes.
fn parse_patterns(value: &str, lines: &[&str], i: &mut usize) -> Vec<String> {
    if let Some(inner) = value.strip_prefix('[') {
        let inner = inner.strip_suffix(']').unwrap_or(inner);
        return split_items(inner);
    }
    if !value.is_empty() {
        return split_items(value);
    }

    let mut items = Vec::new();
    while *i < lines.len() {
        let trimmed = lines[*i].trim();
        let Some(item) = trimmed.strip_prefix('-') else {
            break;
        };
        items.extend(split_items(item));
        *i += 1;
    }
    items
}

/// Split a list value into unquoted items.
///
/// A quoted item is split once more, so `'a, b'` and `a, b` agree.
fn split_items(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    for piece in split_top_level(value) {
        let piece = piece.trim();
        let inner = unquote(piece);
        if inner.len() == piece.len() {
            items.push(inner);
        } else {
            items.extend(split_top_level(&inner).into_iter().map(|s| s.trim().to_owned()));
        }
    }
    items.retain(|item| !item.is_empty());
    items
}

/// Split on commas outside quotes, braces, and brackets.
fn split_top_level(value: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (idx, c) in value.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '{' | '[') => depth += 1,
            (None, '}' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                pieces.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&value[start..]);
    pieces
}

/// Remove surrounding quotes from a scalar.
fn unquote(s: &str) -> String {
    let trimmed = s.trim();
    let quoted = trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')));
    if quoted {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// First line of prose: not a heading, rule, or code.
fn derive_description(body: &str) -> String {
    let mut in_code_block = false;

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block
            || trimmed.is_empty()
            || trimmed.starts_with('#')
            || is_horizontal_rule(trimmed)
        {
            continue;
        }
        return trimmed.chars().take(MAX_DERIVED_DESCRIPTION).collect();
    }

    String::new()
}

fn is_horizontal_rule(line: &str) -> bool {
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_') && line.len() >= 3 && chars.all(|c| c == first)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
