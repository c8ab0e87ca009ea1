//! Corpus loading: discovery, reading, and parsing into documents.

use lectern_core::InstructionDocument;
use tracing::{debug, info, warn};

use crate::discovery::{DiscoveredFile, DiscoveryConfig, discover_instruction_files};
use crate::errors::{LoadError, LoaderError, MAX_INSTRUCTION_FILE_SIZE};
use crate::frontmatter::parse_instruction_file;

/// Result of loading a corpus directory.
#[derive(Clone, Debug, Default)]
pub struct LoadOutcome {
    /// Documents built from readable files, in path order.
    pub documents: Vec<InstructionDocument>,
    /// Files that could not be loaded.
    pub errors: Vec<LoadError>,
}

/// Discover and load every instruction file under `config.root`.
///
/// Files without front-matter or without `applyTo` still become documents;
/// they carry no patterns and are rejected later by the engine, where the
/// rejection is reported.
pub fn load_corpus(config: &DiscoveryConfig) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();

    for file in discover_instruction_files(config) {
        match load_file(&file) {
            Ok(document) => {
                debug!(
                    id = %document.id(),
                    patterns = document.patterns().len(),
                    "loaded instruction"
                );
                outcome.documents.push(document);
            }
            Err(error) => {
                warn!(
                    path = %file.relative_path,
                    error = %error,
                    "failed to load instruction file"
                );
                outcome.errors.push(LoadError::new(&file.relative_path, &error));
            }
        }
    }

    info!(
        root = %config.root.display(),
        documents = outcome.documents.len(),
        errors = outcome.errors.len(),
        "instruction corpus loaded"
    );
    outcome
}

/// Read and parse one discovered file.
pub fn load_file(file: &DiscoveredFile) -> Result<InstructionDocument, LoaderError> {
    let io = |source| LoaderError::Io {
        path: file.path.clone(),
        source,
    };

    let size = std::fs::metadata(&file.path).map_err(io)?.len();
    if size > MAX_INSTRUCTION_FILE_SIZE {
        return Err(LoaderError::FileTooLarge {
            size,
            max: MAX_INSTRUCTION_FILE_SIZE,
        });
    }

    let raw = std::fs::read_to_string(&file.path).map_err(io)?;
    let parsed = parse_instruction_file(&raw);

    Ok(InstructionDocument::new(document_id_for(file), parsed.apply_to, parsed.body)
        .with_description(parsed.description)
        .with_source_ref(file.relative_path.clone()))
}

/// Document id for a discovered file: its relative path minus the suffix.
///
/// ```text
/// lang/rust.instructions.md → lang/rust
/// ```
pub fn document_id_for(file: &DiscoveredFile) -> String {
    file.stem().to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
