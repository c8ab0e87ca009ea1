//! The engine facade: current snapshot, cache, and composer behind one type.
//!
//! Readers clone the current `Arc<CorpusSnapshot>` under a read lock and work
//! on it lock-free; a replacement swaps the pointer and retires the cache.
//! A query in flight during a swap finishes against the snapshot it started
//! with.

use std::sync::Arc;

use lectern_core::{InstructionDocument, normalize_path};
use lectern_settings::LecternSettings;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::{CacheStats, LookupCache};
use crate::composer::{Budget, Composer};
use crate::errors::{EngineError, Result};
use crate::snapshot::CorpusSnapshot;
use crate::types::{ComposedContext, MatchResult};

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Budget used by [`Engine::compose`].
    pub budget: Budget,
    /// Text placed between composed bodies.
    pub separator: String,
    /// Match-result cache capacity. `0` disables caching.
    pub cache_size: u64,
    /// Run conflict detection on every match.
    pub conflict_detection_enabled: bool,
}

impl EngineConfig {
    /// Configuration taken from loaded settings.
    pub fn from_settings(settings: &LecternSettings) -> Self {
        Self {
            budget: Budget::from_settings(&settings.compose),
            separator: settings.compose.separator.clone(),
            cache_size: settings.cache.cache_size,
            conflict_detection_enabled: settings.conflicts.enabled,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(&LecternSettings::default())
    }
}

/// Instruction selection and composition engine.
///
/// `Engine` is `Send + Sync`; share it behind an `Arc`.
pub struct Engine {
    config: EngineConfig,
    current: RwLock<Arc<CorpusSnapshot>>,
    publish_lock: Mutex<()>,
    cache: LookupCache,
    composer: Composer,
}

impl Engine {
    /// Engine with an empty corpus at version 0.
    pub fn new(config: EngineConfig) -> Self {
        let cache = LookupCache::new(config.cache_size, 0);
        let composer = Composer::new(config.separator.clone());
        Self {
            config,
            current: RwLock::new(Arc::new(CorpusSnapshot::empty(0))),
            publish_lock: Mutex::new(()),
            cache,
            composer,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Build a snapshot from `documents` as the next version and publish it.
    pub fn replace_corpus(
        &self,
        documents: impl IntoIterator<Item = InstructionDocument>,
    ) -> Arc<CorpusSnapshot> {
        let _guard = self.publish_lock.lock();
        let version = self.current.read().version() + 1;
        let snapshot = Arc::new(CorpusSnapshot::build(version, documents));
        self.swap(Arc::clone(&snapshot));
        snapshot
    }

    /// Publish a prebuilt snapshot. Its version must exceed the current one.
    pub fn publish(&self, snapshot: Arc<CorpusSnapshot>) -> Result<()> {
        let _guard = self.publish_lock.lock();
        let current = self.current.read().version();
        if snapshot.version() <= current {
            return Err(EngineError::NonMonotonicVersion {
                current,
                proposed: snapshot.version(),
            });
        }
        self.swap(snapshot);
        Ok(())
    }

    /// Every document applicable to `path`, most specific first.
    pub fn match_path(&self, path: &str) -> Arc<MatchResult> {
        let snapshot = self.snapshot();
        self.lookup(&snapshot, path)
    }

    /// Like [`match_path`](Self::match_path), pinned to snapshot `version`.
    pub fn match_path_at(&self, version: u64, path: &str) -> Result<Arc<MatchResult>> {
        let snapshot = self.snapshot();
        if snapshot.version() != version {
            return Err(EngineError::StaleSnapshot {
                requested: version,
                current: snapshot.version(),
            });
        }
        Ok(self.lookup(&snapshot, path))
    }

    /// Compose the instruction context for `path` with the configured budget.
    pub fn compose(&self, path: &str) -> ComposedContext {
        self.compose_with_budget(path, &self.config.budget)
    }

    /// Compose the instruction context for `path` within `budget`.
    pub fn compose_with_budget(&self, path: &str, budget: &Budget) -> ComposedContext {
        let result = self.match_path(path);
        self.composer.compose(&result.documents, budget)
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn lookup(&self, snapshot: &CorpusSnapshot, path: &str) -> Arc<MatchResult> {
        let path = normalize_path(path);
        let version = snapshot.version();

        match self.cache.get(version, &path) {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                let result = self.evaluate(snapshot, &path);
                self.cache.put(version, path, Arc::clone(&result));
                result
            }
            Err(error) => {
                // Snapshot replaced mid-query; answer from the one we hold.
                debug!(%error, path = %path, "bypassing cache");
                self.evaluate(snapshot, &path)
            }
        }
    }

    fn evaluate(&self, snapshot: &CorpusSnapshot, path: &str) -> Arc<MatchResult> {
        Arc::new(snapshot.evaluate(path, self.config.conflict_detection_enabled))
    }

    fn swap(&self, snapshot: Arc<CorpusSnapshot>) {
        let version = snapshot.version();
        let active = snapshot.len();
        let rejected = snapshot.rejections().len();
        let previous = {
            let mut current = self.current.write();
            std::mem::replace(&mut *current, snapshot).version()
        };
        self.cache.retire(version);
        info!(previous, version, active, rejected, "corpus snapshot published");
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("version", &self.current.read().version())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use lectern_settings::BudgetUnit;

    fn doc(id: &str, patterns: &[&str], body: &str) -> InstructionDocument {
        InstructionDocument::new(id, patterns.iter().map(|p| (*p).to_owned()).collect(), body)
    }

    fn engine_with(docs: Vec<InstructionDocument>) -> Engine {
        let engine = Engine::default();
        let _ = engine.replace_corpus(docs);
        engine
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn starts_empty_at_version_zero() {
        let engine = Engine::default();
        assert_eq!(engine.snapshot().version(), 0);
        assert!(engine.match_path("src/a.rs").is_empty());
        assert_eq!(engine.compose("src/a.rs"), ComposedContext::empty());
    }

    #[test]
    fn config_from_settings() {
        let mut settings = LecternSettings::default();
        settings.compose.budget = 500;
        settings.compose.budget_unit = BudgetUnit::Tokens;
        settings.compose.separator = "\n---\n".into();
        settings.cache.cache_size = 0;
        settings.conflicts.enabled = false;

        let config = EngineConfig::from_settings(&settings);
        assert_eq!(config.budget, Budget::tokens(500, 4));
        assert_eq!(config.separator, "\n---\n");
        assert_eq!(config.cache_size, 0);
        assert!(!config.conflict_detection_enabled);
    }

    #[test]
    fn replace_corpus_increments_version() {
        let engine = Engine::default();
        assert_eq!(engine.replace_corpus(vec![]).version(), 1);
        assert_eq!(engine.replace_corpus(vec![doc("a", &["**"], "a")]).version(), 2);
        assert_eq!(engine.snapshot().version(), 2);
        assert_eq!(engine.snapshot().len(), 1);
    }

    #[test]
    fn publish_requires_increasing_version() {
        let engine = Engine::default();
        engine
            .publish(Arc::new(CorpusSnapshot::build(5, vec![doc("a", &["**"], "a")])))
            .unwrap();
        assert_eq!(engine.snapshot().version(), 5);

        let err = engine
            .publish(Arc::new(CorpusSnapshot::empty(5)))
            .unwrap_err();
        assert_eq!(err, EngineError::NonMonotonicVersion { current: 5, proposed: 5 });
        assert_eq!(engine.snapshot().len(), 1);
    }

    #[test]
    fn match_path_ranks_most_specific_first() {
        let engine = engine_with(vec![
            doc("A", &["**/*.md"], "a"),
            doc("B", &["docs/**/*.md"], "b"),
        ]);
        let result = engine.match_path("docs/readme.md");
        assert_eq!(result.ids(), vec!["B", "A"]);
        assert_eq!(result.snapshot_version, 1);
    }

    #[test]
    fn repeated_queries_hit_the_cache() {
        let engine = engine_with(vec![doc("all", &["**"], "x")]);
        let first = engine.match_path("src/a.rs");
        let second = engine.match_path("./src/a.rs");
        assert!(Arc::ptr_eq(&first, &second));

        let stats = engine.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn replacing_the_corpus_invalidates_cached_results() {
        let engine = engine_with(vec![doc("old", &["**"], "old")]);
        assert_eq!(engine.match_path("a.rs").ids(), vec!["old"]);

        let _ = engine.replace_corpus(vec![doc("new", &["**"], "new")]);
        let result = engine.match_path("a.rs");
        assert_eq!(result.ids(), vec!["new"]);
        assert_eq!(result.snapshot_version, 2);
    }

    #[test]
    fn pinned_query_on_old_version_is_stale() {
        let engine = engine_with(vec![doc("a", &["**"], "a")]);
        assert!(engine.match_path_at(1, "x").is_ok());

        let _ = engine.replace_corpus(vec![doc("a", &["**"], "a2")]);
        assert_matches!(
            engine.match_path_at(1, "x"),
            Err(EngineError::StaleSnapshot { requested: 1, current: 2 })
        );
        assert_eq!(engine.match_path_at(2, "x").unwrap().snapshot_version, 2);
    }

    #[test]
    fn disabled_cache_still_answers() {
        let engine = Engine::new(EngineConfig {
            cache_size: 0,
            ..EngineConfig::default()
        });
        let _ = engine.replace_corpus(vec![doc("all", &["**"], "x")]);
        assert_eq!(engine.match_path("a").ids(), vec!["all"]);
        assert_eq!(engine.match_path("a").ids(), vec!["all"]);
        assert_eq!(engine.cache_stats().hits, 0);
    }

    #[test]
    fn conflict_detection_can_be_disabled() {
        let docs = || vec![doc("n", &["src/**"], "Never use tabs"), doc("b", &["**"], "Use tabs")];

        let on = engine_with(docs());
        assert_eq!(on.match_path("src/a.rs").conflicts.len(), 1);

        let off = Engine::new(EngineConfig {
            conflict_detection_enabled: false,
            ..EngineConfig::default()
        });
        let _ = off.replace_corpus(docs());
        assert!(off.match_path("src/a.rs").conflicts.is_empty());
    }

    #[test]
    fn compose_uses_configured_budget_and_separator() {
        let engine = Engine::new(EngineConfig {
            budget: Budget::chars(10),
            separator: "|".into(),
            ..EngineConfig::default()
        });
        let _ = engine.replace_corpus(vec![
            doc("narrow", &["src/*.rs"], "1234"),
            doc("broad", &["**"], "5678"),
            doc("tail", &["**/*"], "90"),
        ]);
        let ctx = engine.compose("src/a.rs");
        assert_eq!(ctx.text, "1234|5678");
        assert_eq!(ctx.omitted, vec!["tail"]);
        assert!(ctx.truncated);

        let wide = engine.compose_with_budget("src/a.rs", &Budget::chars(100));
        assert_eq!(wide.text, "1234|5678|90");
    }
}
