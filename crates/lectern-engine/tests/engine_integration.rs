//! End-to-end tests: instruction files on disk through the loader into the
//! engine.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use assert_matches::assert_matches;
use lectern_core::InstructionDocument;
use lectern_engine::{Budget, CorpusSnapshot, Engine, EngineConfig, EngineError};
use lectern_loader::{DiscoveryConfig, load_corpus};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, apply_to: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("---\napplyTo: {apply_to}\n---\n{body}\n")).unwrap();
}

fn load_engine(root: &Path, config: EngineConfig) -> Engine {
    let outcome = load_corpus(&DiscoveryConfig::default().with_root(root));
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    let engine = Engine::new(config);
    let _ = engine.replace_corpus(outcome.documents);
    engine
}

fn doc(id: &str, pattern: &str, body: &str) -> InstructionDocument {
    InstructionDocument::new(id, vec![pattern.to_owned()], body)
}

// ── Cascade ──────────────────────────────────────────────────────────────────

#[test]
fn narrow_document_ranks_above_broad() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "A.instructions.md", "'**/*.md'", "broad");
    write(tmp.path(), "B.instructions.md", "'docs/**/*.md'", "narrow");

    let engine = load_engine(tmp.path(), EngineConfig::default());
    let result = engine.match_path("docs/readme.md");
    assert_eq!(result.ids(), vec!["B", "A"]);

    let ctx = engine.compose("docs/readme.md");
    assert_eq!(ctx.text, "narrow\n\nbroad");
    assert_eq!(ctx.included, vec!["B", "A"]);
}

#[test]
fn single_catch_all_document() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "all.instructions.md", "'**'", "Be concise.");

    let engine = load_engine(tmp.path(), EngineConfig::default());
    let ctx = engine.compose("src/x.ts");
    assert_eq!(ctx.text, "Be concise.");
    assert!(!ctx.truncated);
}

#[test]
fn budget_omits_lower_ranked_documents() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "X.instructions.md", "'src/**'", "12345678");
    write(tmp.path(), "Y.instructions.md", "'**'", "abcdefgh");

    let engine = load_engine(
        tmp.path(),
        EngineConfig {
            budget: Budget::chars(10),
            ..EngineConfig::default()
        },
    );
    let ctx = engine.compose("src/main.rs");
    assert_eq!(ctx.text, "12345678");
    assert!(ctx.truncated);
    assert_eq!(ctx.omitted, vec!["Y"]);
}

#[test]
fn malformed_pattern_is_rejected_not_fatal() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "C.instructions.md", "'**/*.{ts,'", "broken");
    write(tmp.path(), "D.instructions.md", "'**/*.ts'", "fine");

    let engine = load_engine(tmp.path(), EngineConfig::default());
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.rejections().len(), 1);
    assert_eq!(snapshot.rejections()[0].id, "C");
    assert_eq!(snapshot.rejections()[0].source_ref, "C.instructions.md");
    assert_matches!(snapshot.rejections()[0].error, EngineError::InvalidPattern { .. });

    assert_eq!(engine.match_path("app/main.ts").ids(), vec!["D"]);
}

#[test]
fn file_without_apply_to_is_reported() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("loose.instructions.md"), "No front-matter.").unwrap();

    let engine = load_engine(tmp.path(), EngineConfig::default());
    let snapshot = engine.snapshot();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.rejections()[0].error, EngineError::EmptyPatternSet);
}

#[test]
fn unmatched_path_gives_empty_context() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "py.instructions.md", "'**/*.py'", "pep8");

    let engine = load_engine(tmp.path(), EngineConfig::default());
    assert!(engine.match_path("src/lib.rs").is_empty());
    let ctx = engine.compose("src/lib.rs");
    assert!(ctx.text.is_empty());
    assert!(!ctx.truncated);
}

#[test]
fn brace_and_list_patterns_from_files() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "web.instructions.md", "'**/*.{ts,tsx}, **/*.css'", "web");
    write(tmp.path(), "list.instructions.md", "['Makefile', '**/*.mk']", "make");

    let engine = load_engine(tmp.path(), EngineConfig::default());
    assert_eq!(engine.match_path("ui/app.tsx").ids(), vec!["web"]);
    assert_eq!(engine.match_path("styles/site.css").ids(), vec!["web"]);
    assert_eq!(engine.match_path("Makefile").ids(), vec!["list"]);
    assert!(engine.match_path("ui/app.js").is_empty());
}

#[test]
fn conflicts_are_flagged_but_do_not_block() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "style.instructions.md", "'**'", "- Use tabs for indentation.");
    write(tmp.path(), "python.instructions.md", "'**/*.py'", "- Never use tabs.");

    let engine = load_engine(tmp.path(), EngineConfig::default());
    let result = engine.match_path("app/main.py");
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].preferred, "python");
    assert_eq!(result.conflicts[0].other, "style");
    assert_eq!(result.conflicts[0].subject, "tabs");

    let ctx = engine.compose("app/main.py");
    assert_eq!(ctx.included.len(), 2);
}

#[test]
fn identical_bodies_are_composed_once() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.instructions.md", "'src/**'", "Shared text.");
    write(tmp.path(), "b.instructions.md", "'**'", "Shared text.");

    let engine = load_engine(tmp.path(), EngineConfig::default());
    let ctx = engine.compose("src/x.rs");
    assert_eq!(ctx.text, "Shared text.");
    assert_eq!(ctx.deduplicated, vec!["b"]);
}

// ── Determinism ──────────────────────────────────────────────────────────────

#[test]
fn composition_is_byte_identical_across_engines() {
    let docs = || {
        vec![
            doc("z", "**", "zeta"),
            doc("m", "**/*.rs", "mu"),
            doc("a", "**/*.rs", "alpha"),
            doc("s", "src/**", "sigma"),
        ]
    };
    let first = Engine::default();
    let _ = first.replace_corpus(docs());
    let second = Engine::default();
    let mut reversed = docs();
    reversed.reverse();
    let _ = second.replace_corpus(reversed);

    let one = first.compose("src/lib.rs");
    let two = second.compose("src/lib.rs");
    assert_eq!(one, two);
    assert_eq!(one.included, vec!["a", "m", "s", "z"]);
}

// ── Snapshots and concurrency ────────────────────────────────────────────────

#[test]
fn stale_version_is_refused_after_reload() {
    let engine = Engine::default();
    let v1 = engine.replace_corpus(vec![doc("a", "**", "one")]).version();
    let _ = engine.match_path("x");

    let v2 = engine.replace_corpus(vec![doc("a", "**", "two")]).version();
    assert!(v2 > v1);
    assert_matches!(
        engine.match_path_at(v1, "x"),
        Err(EngineError::StaleSnapshot { requested, current }) if requested == v1 && current == v2
    );
    assert_eq!(engine.compose("x").text, "two");
}

#[test]
fn published_snapshot_must_advance() {
    let engine = Engine::default();
    let _ = engine.replace_corpus(vec![doc("a", "**", "one")]);
    assert_matches!(
        engine.publish(Arc::new(CorpusSnapshot::empty(1))),
        Err(EngineError::NonMonotonicVersion { current: 1, proposed: 1 })
    );
    assert!(engine.publish(Arc::new(CorpusSnapshot::empty(10))).is_ok());
    assert_eq!(engine.snapshot().version(), 10);
}

#[test]
fn queries_during_reloads_see_a_consistent_snapshot() {
    let engine = Engine::default();
    let _ = engine.replace_corpus(vec![doc("gen", "**", "0"), doc("all", "**/*", "0")]);

    std::thread::scope(|scope| {
        let _ = scope.spawn(|| {
            for generation in 1..50 {
                let body = generation.to_string();
                let _ = engine.replace_corpus(vec![
                    doc("gen", "**", &body),
                    doc("all", "**/*", &body),
                ]);
            }
        });

        for _ in 0..4 {
            let _ = scope.spawn(|| {
                for _ in 0..200 {
                    let result = engine.match_path("src/lib.rs");
                    assert_eq!(result.documents.len(), 2);
                    let first = result.documents[0].body();
                    let second = result.documents[1].body();
                    assert_eq!(first, second, "mixed snapshot generations");
                }
            });
        }
    });

    assert_eq!(engine.snapshot().version(), 50);
}
