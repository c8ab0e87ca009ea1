//! # lectern-engine
//!
//! Selects, ranks, and composes the instruction documents that apply to a
//! file path.
//!
//! ## Pipeline
//!
//! ```text
//! documents ──► CorpusSnapshot::build ──► (active, rejections)
//!                                           │
//! path ──► normalize ──► matcher ──► ranker ──► conflicts ──► MatchResult
//!                                                               │
//!                                              composer ◄───────┘
//!                                                  │
//!                                           ComposedContext
//! ```
//!
//! - [`matcher`]: brace expansion and glob compilation per document
//! - [`specificity`]: how narrow a single glob alternative is
//! - [`ranker`]: orders matches from most to least specific
//! - [`conflicts`]: flags opposite directives between matched documents
//! - [`composer`]: joins bodies under a size budget
//! - [`cache`]: `(version, path)` result cache
//! - [`snapshot`]: immutable versioned corpus
//! - [`engine`]: the facade tying these together

#![deny(unsafe_code)]

pub mod cache;
pub mod composer;
pub mod conflicts;
pub mod engine;
pub mod errors;
pub mod matcher;
pub mod ranker;
pub mod snapshot;
pub mod specificity;
pub mod types;

pub use cache::{CacheStats, LookupCache};
pub use composer::{Budget, Composer, DEFAULT_SEPARATOR, compose};
pub use engine::{Engine, EngineConfig};
pub use errors::{DocumentRejection, EngineError, Result};
pub use lectern_settings::BudgetUnit;
pub use matcher::{CompiledMatcher, MAX_ALTERNATIVES, PatternMatch, compile};
pub use snapshot::{CorpusSnapshot, IndexedDocument};
pub use specificity::Specificity;
pub use types::{ComposedContext, ConflictPair, MatchResult, RankedDocument};
