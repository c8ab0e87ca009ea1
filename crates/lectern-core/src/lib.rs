//! # lectern-core
//!
//! Foundation types shared by every Lectern crate.
//!
//! - **Document IDs**: [`DocumentId`], a newtype over `String` derived from a
//!   document's source path
//! - **Documents**: [`InstructionDocument`], the immutable corpus entry
//! - **Paths**: [`paths::normalize_path`] turns any query path into the
//!   forward-slash, relative form the matcher works on

#![deny(unsafe_code)]

pub mod document;
pub mod ids;
pub mod paths;

pub use document::InstructionDocument;
pub use ids::DocumentId;
pub use paths::normalize_path;
