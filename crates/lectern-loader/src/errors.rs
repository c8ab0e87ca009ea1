//! Loader error types.

use std::path::PathBuf;

use thiserror::Error;

/// Largest instruction file the loader will read (512 KiB).
pub const MAX_INSTRUCTION_FILE_SIZE: u64 = 512 * 1024;

/// Failure reading a single instruction file.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file exceeds [`MAX_INSTRUCTION_FILE_SIZE`].
    #[error("file too large: {size} bytes (max {max} bytes)")]
    FileTooLarge {
        /// Actual size.
        size: u64,
        /// Allowed size.
        max: u64,
    },
}

/// A file that was discovered but could not be loaded.
///
/// Collected instead of aborting so one bad file never hides the rest of the
/// corpus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadError {
    /// Path relative to the corpus root, forward-slash separated.
    pub path: String,
    /// Human-readable reason.
    pub message: String,
}

impl LoadError {
    pub(crate) fn new(path: impl Into<String>, error: &LoaderError) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
