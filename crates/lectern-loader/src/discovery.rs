//! Instruction file discovery.
//!
//! Walks the corpus root and selects files whose name ends with one of the
//! configured suffixes (`.instructions.md` by default). Hidden and excluded
//! directories below the root are not entered. Results are sorted by path so
//! discovery order is stable across platforms.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use lectern_settings::CorpusSettings;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for instruction discovery.
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Corpus root directory.
    pub root: PathBuf,
    /// Maximum walk depth. Files directly under `root` are at depth 1.
    pub max_depth: usize,
    /// Directory names never entered.
    pub exclude_dirs: HashSet<String>,
    /// File name suffixes that mark instruction files.
    pub file_suffixes: Vec<String>,
}

impl DiscoveryConfig {
    /// Configuration from corpus settings. A missing root means the current
    /// directory.
    pub fn from_settings(settings: &CorpusSettings) -> Self {
        Self {
            root: settings
                .root
                .as_deref()
                .map_or_else(|| PathBuf::from("."), PathBuf::from),
            max_depth: settings.max_depth,
            exclude_dirs: settings.exclude_dirs.iter().cloned().collect(),
            file_suffixes: settings.file_suffixes.clone(),
        }
    }

    /// Same configuration rooted at `root`.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Suffix of `file_name` if it marks an instruction file.
    ///
    /// The longest matching suffix wins; a file named exactly like a suffix is
    /// not an instruction file.
    pub fn matching_suffix(&self, file_name: &str) -> Option<&str> {
        self.file_suffixes
            .iter()
            .filter(|suffix| file_name.len() > suffix.len() && file_name.ends_with(suffix.as_str()))
            .max_by_key(|suffix| suffix.len())
            .map(String::as_str)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::from_settings(&CorpusSettings::default())
    }
}

/// A discovered instruction file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path.
    pub path: PathBuf,
    /// Relative to the corpus root, forward-slash separated.
    pub relative_path: String,
    /// The suffix that selected this file.
    pub suffix: String,
}

impl DiscoveredFile {
    /// Relative path without the selecting suffix.
    pub fn stem(&self) -> &str {
        self.relative_path
            .strip_suffix(self.suffix.as_str())
            .unwrap_or(&self.relative_path)
    }
}

/// Find every instruction file below `config.root`.
///
/// A missing root yields an empty list. Unreadable directory entries are
/// logged and skipped.
pub fn discover_instruction_files(config: &DiscoveryConfig) -> Vec<DiscoveredFile> {
    if !config.root.is_dir() {
        debug!(root = %config.root.display(), "corpus root is not a directory");
        return Vec::new();
    }

    let walker = WalkDir::new(&config.root)
        .max_depth(config.max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !config.exclude_dirs.contains(name.as_ref())
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "failed to read corpus entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let Some(suffix) = config.matching_suffix(&name) else {
            continue;
        };

        files.push(DiscoveredFile {
            relative_path: relative_path(entry.path(), &config.root),
            suffix: suffix.to_owned(),
            path: entry.into_path(),
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    debug!(root = %config.root.display(), count = files.len(), "discovered instruction files");
    files
}

/// Forward-slash path of `path` relative to `root`.
fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
