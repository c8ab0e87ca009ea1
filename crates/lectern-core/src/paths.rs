//! Query path normalization.
//!
//! The matcher only ever sees forward-slash, relative paths. Normalization is
//! purely textual so results never depend on the host OS separator or on
//! file-system state:
//!
//! ```text
//! normalize_path("./src//lib.rs")         → "src/lib.rs"
//! normalize_path("src\\app\\main.ts")     → "src/app/main.ts"
//! normalize_path("/docs/./guide/../a.md") → "docs/a.md"
//! ```

/// Normalize a path to forward-slash, relative form.
///
/// - `\` becomes `/`
/// - leading `/`, empty segments and `.` segments are dropped
/// - `..` removes the previous segment when there is one; leading `..`
///   segments are kept
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    let _ = parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    parts.join("/")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
