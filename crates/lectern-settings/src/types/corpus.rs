//! Corpus discovery and logging settings.

use serde::{Deserialize, Serialize};

/// Directories excluded from corpus scanning by default.
const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "dist",
    "build",
    "target",
    "out",
    "coverage",
    "__pycache__",
];

/// Corpus discovery settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorpusSettings {
    /// Directory holding the instruction files. `None` = current directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Maximum directory depth to scan.
    pub max_depth: usize,
    /// Directory names skipped while scanning.
    pub exclude_dirs: Vec<String>,
    /// File name suffixes recognised as instruction documents.
    pub file_suffixes: Vec<String>,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            root: None,
            max_depth: 10,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| (*s).to_owned()).collect(),
            file_suffixes: vec![".instructions.md".to_string()],
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}
