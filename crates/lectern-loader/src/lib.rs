//! # lectern-loader
//!
//! Builds [`InstructionDocument`](lectern_core::InstructionDocument)s from a
//! directory of instruction files.
//!
//! - [`discovery`]: finds `*.instructions.md` files under a corpus root
//! - [`frontmatter`]: reads `description` and `applyTo` from front-matter
//! - [`corpus`]: ties both together and collects per-file errors
//!
//! The engine never sees raw front-matter; it only receives typed documents.

#![deny(unsafe_code)]

pub mod corpus;
pub mod discovery;
pub mod errors;
pub mod frontmatter;

pub use corpus::{LoadOutcome, document_id_for, load_corpus, load_file};
pub use discovery::{DiscoveredFile, DiscoveryConfig, discover_instruction_files};
pub use errors::{LoadError, LoaderError, MAX_INSTRUCTION_FILE_SIZE};
pub use frontmatter::{ParsedInstruction, parse_instruction_file};
