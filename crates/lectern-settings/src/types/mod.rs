//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so partial JSON is accepted; missing fields get their default value.

mod compose;
mod corpus;

pub use compose::*;
pub use corpus::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the Lectern engine.
///
/// ```json
/// {
///   "compose": { "budget": 8000, "budgetUnit": "tokens" },
///   "cache": { "cacheSize": 256 },
///   "conflicts": { "enabled": false }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LecternSettings {
    /// Settings schema version.
    pub version: String,
    /// Context composition settings.
    pub compose: ComposeSettings,
    /// Match-result cache settings.
    pub cache: CacheSettings,
    /// Conflict detection settings.
    pub conflicts: ConflictSettings,
    /// Corpus discovery settings.
    pub corpus: CorpusSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for LecternSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            compose: ComposeSettings::default(),
            cache: CacheSettings::default(),
            conflicts: ConflictSettings::default(),
            corpus: CorpusSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
