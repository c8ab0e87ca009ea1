//! Match-result cache keyed by `(snapshot version, normalized path)`.
//!
//! Entries belong to exactly one snapshot version. Only the current version
//! is ever served: asking for another one is a [`EngineError::StaleSnapshot`],
//! and [`LookupCache::retire`] drops everything older when a snapshot is
//! replaced. Eviction is least-recently-used via `moka`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::Serialize;
use tracing::debug;

use crate::errors::{EngineError, Result};
use crate::types::MatchResult;

type CacheKey = (u64, String);

/// Counters describing cache effectiveness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to be computed.
    pub misses: u64,
    /// Entries currently held.
    pub entries: u64,
    /// Configured capacity. `0` means caching is disabled.
    pub capacity: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache (0.0–1.0).
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded, version-aware cache of match results.
pub struct LookupCache {
    entries: Option<Cache<CacheKey, Arc<MatchResult>>>,
    capacity: u64,
    current_version: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LookupCache {
    /// Cache holding at most `capacity` results for `version`.
    /// A capacity of `0` disables caching.
    pub fn new(capacity: u64, version: u64) -> Self {
        let entries = (capacity > 0).then(|| {
            Cache::builder()
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build()
        });
        Self {
            entries,
            capacity,
            current_version: AtomicU64::new(version),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Version whose results are currently served.
    pub fn current_version(&self) -> u64 {
        self.current_version.load(Ordering::Acquire)
    }

    /// Look up the result for `path` computed against `version`.
    pub fn get(&self, version: u64, path: &str) -> Result<Option<Arc<MatchResult>>> {
        let current = self.current_version();
        if version != current {
            return Err(EngineError::StaleSnapshot {
                requested: version,
                current,
            });
        }

        let found = self
            .entries
            .as_ref()
            .and_then(|cache| cache.get(&(version, path.to_owned())));

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        let _ = counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    /// Store a result. Results for a superseded version are dropped.
    pub fn put(&self, version: u64, path: String, result: Arc<MatchResult>) {
        let Some(cache) = &self.entries else {
            return;
        };
        let current = self.current_version();
        if version != current {
            debug!(version, current, path = %path, "dropping result for superseded snapshot");
            return;
        }
        cache.insert((version, path), result);
    }

    /// Switch to `new_version` and discard every older entry.
    pub fn retire(&self, new_version: u64) {
        let previous = self.current_version.fetch_max(new_version, Ordering::AcqRel);
        if let Some(cache) = &self.entries {
            cache.invalidate_all();
        }
        debug!(previous, new_version, "lookup cache retired");
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entry_count(),
            capacity: self.capacity,
        }
    }

    /// Number of entries held (approximate under concurrent writes).
    pub fn entry_count(&self) -> u64 {
        self.entries.as_ref().map_or(0, |cache| {
            cache.run_pending_tasks();
            cache.entry_count()
        })
    }

    /// Whether results are cached at all.
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }
}

impl std::fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupCache")
            .field("capacity", &self.capacity)
            .field("current_version", &self.current_version())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
