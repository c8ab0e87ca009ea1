//! Composition, caching, and conflict detection settings.

use serde::{Deserialize, Serialize};

/// Unit in which the composition budget is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetUnit {
    /// Unicode scalar values.
    #[default]
    Chars,
    /// UTF-8 bytes.
    Bytes,
    /// Estimated tokens: `ceil(chars / chars_per_token)`.
    Tokens,
}

impl BudgetUnit {
    /// Parse a unit name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "chars" | "characters" => Some(Self::Chars),
            "bytes" => Some(Self::Bytes),
            "tokens" => Some(Self::Tokens),
            _ => None,
        }
    }
}

/// Context composition settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposeSettings {
    /// Maximum composed size, measured in `budget_unit`.
    pub budget: usize,
    /// Unit the budget is measured in.
    pub budget_unit: BudgetUnit,
    /// Approximate characters per token for [`BudgetUnit::Tokens`].
    pub chars_per_token: usize,
    /// Text placed between consecutive document bodies.
    pub separator: String,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            budget: 32_000,
            budget_unit: BudgetUnit::Chars,
            chars_per_token: 4,
            separator: "\n\n".to_string(),
        }
    }
}

/// Match-result cache settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Maximum cached `(version, path)` entries. `0` disables caching.
    pub cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { cache_size: 1024 }
    }
}

/// Conflict detection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConflictSettings {
    /// Run the conflict heuristic on every match. Disable for hot paths.
    pub enabled: bool,
}

impl Default for ConflictSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}
