//! # lectern-settings
//!
//! Configuration management with layered sources for the Lectern engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`LecternSettings::default()`]
//! 2. **User file**: `~/.lectern/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `LECTERN_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use lectern_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("budget: {}", settings.compose.budget);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`]. Falls back to compiled
/// defaults if loading fails.
static SETTINGS: OnceLock<LecternSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.lectern/settings.json` with env var
/// overrides. On subsequent calls, returns the cached value.
pub fn get_settings() -> &'static LecternSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// Returns `Err(settings)` if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: LecternSettings) -> std::result::Result<(), LecternSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
