//! # lectern
//!
//! Command-line front end: loads an instruction corpus from disk and answers
//! which instructions apply to a file.
//!
//! ```text
//! lectern --corpus .github/instructions match src/lib.rs
//! lectern compose src/lib.rs --budget 2000 --unit tokens
//! lectern check
//! ```

#![deny(unsafe_code)]

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lectern_engine::{Budget, BudgetUnit, ComposedContext, Engine, EngineConfig, MatchResult};
use lectern_loader::{DiscoveryConfig, LoadError, load_corpus};
use lectern_settings::LecternSettings;
use serde_json::json;
use tracing::debug;

/// Select and compose instruction documents for a file path.
#[derive(Parser, Debug)]
#[command(name = "lectern", version, about = "Select and compose instructions for a file")]
struct Cli {
    /// Directory holding the instruction files (overrides settings).
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Settings file (default: `~/.lectern/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level (overrides settings; `RUST_LOG` wins over both).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// List the documents that apply to a path, most specific first.
    Match {
        /// File path, relative to the project root.
        path: String,
    },
    /// Print the composed instruction text for a path.
    Compose {
        /// File path, relative to the project root.
        path: String,
        /// Size limit (overrides settings).
        #[arg(long)]
        budget: Option<usize>,
        /// Unit of the budget: chars, bytes, or tokens.
        #[arg(long, value_parser = parse_unit)]
        unit: Option<BudgetUnit>,
    },
    /// Validate the corpus and list rejected documents.
    Check,
}

fn parse_unit(value: &str) -> std::result::Result<BudgetUnit, String> {
    BudgetUnit::parse(value)
        .ok_or_else(|| format!("unknown unit `{value}` (expected chars, bytes, or tokens)"))
}

/// Rendered command output and whether the command succeeded.
#[derive(Debug)]
struct Outcome {
    output: String,
    success: bool,
}

impl Cli {
    fn load_settings(&self) -> Result<LecternSettings> {
        match &self.settings {
            Some(path) => lectern_settings::load_settings_from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display())),
            None => Ok(lectern_settings::load_settings().unwrap_or_default()),
        }
    }

    fn discovery_config(&self, settings: &LecternSettings) -> DiscoveryConfig {
        let config = DiscoveryConfig::from_settings(&settings.corpus);
        match &self.corpus {
            Some(root) => config.with_root(root),
            None => config,
        }
    }
}

fn execute(cli: &Cli, settings: &LecternSettings) -> Result<Outcome> {
    let discovery = cli.discovery_config(settings);
    if !discovery.root.is_dir() {
        anyhow::bail!("Corpus directory not found: {}", discovery.root.display());
    }

    let loaded = load_corpus(&discovery);
    let engine = Engine::new(EngineConfig::from_settings(settings));
    let snapshot = engine.replace_corpus(loaded.documents);
    debug!(version = snapshot.version(), active = snapshot.len(), "corpus ready");

    match &cli.command {
        Command::Match { path } => {
            let result = engine.match_path(path);
            Ok(Outcome {
                output: render_match(&result, cli.json)?,
                success: true,
            })
        }
        Command::Compose { path, budget, unit } => {
            let mut limit = engine.config().budget;
            if let Some(budget) = budget {
                limit.limit = *budget;
            }
            if let Some(unit) = unit {
                limit.unit = *unit;
            }
            let context = engine.compose_with_budget(path, &limit);
            Ok(Outcome {
                output: render_compose(&context, &limit, cli.json)?,
                success: true,
            })
        }
        Command::Check => {
            let success = snapshot.rejections().is_empty() && loaded.errors.is_empty();
            Ok(Outcome {
                output: render_check(&engine, &loaded.errors, cli.json)?,
                success,
            })
        }
    }
}

fn render_match(result: &MatchResult, as_json: bool) -> Result<String> {
    if as_json {
        return serde_json::to_string_pretty(result).context("Failed to serialize match result");
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} (snapshot {})", result.path, result.snapshot_version);
    if result.is_empty() {
        let _ = writeln!(out, "  no matching instructions");
    }
    for (rank, doc) in result.documents.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}  [{}]", rank + 1, doc.id, doc.matched_pattern);
    }
    for conflict in &result.conflicts {
        let _ = writeln!(
            out,
            "  conflict on `{}`: {} overrides {}",
            conflict.subject, conflict.preferred, conflict.other
        );
    }
    Ok(out)
}

fn render_compose(context: &ComposedContext, budget: &Budget, as_json: bool) -> Result<String> {
    if as_json {
        return serde_json::to_string_pretty(context)
            .context("Failed to serialize composed context");
    }

    let mut out = context.text.clone();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    if context.truncated {
        let omitted: Vec<&str> = context.omitted.iter().map(|id| id.as_str()).collect();
        let _ = writeln!(
            out,
            "\n[truncated at {} {:?}; omitted: {}]",
            budget.limit,
            budget.unit,
            omitted.join(", ")
        );
    }
    Ok(out)
}

fn render_check(engine: &Engine, load_errors: &[LoadError], as_json: bool) -> Result<String> {
    let snapshot = engine.snapshot();

    if as_json {
        let active: Vec<&str> = snapshot
            .documents()
            .iter()
            .map(|d| d.document().id().as_str())
            .collect();
        let errors: Vec<_> = load_errors
            .iter()
            .map(|e| json!({ "path": e.path, "message": e.message }))
            .collect();
        let report = json!({
            "version": snapshot.version(),
            "active": active,
            "rejected": snapshot.rejections(),
            "loadErrors": errors,
        });
        return serde_json::to_string_pretty(&report).context("Failed to serialize check report");
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} active, {} rejected, {} unreadable",
        snapshot.len(),
        snapshot.rejections().len(),
        load_errors.len()
    );
    for entry in snapshot.documents() {
        let doc = entry.document();
        let _ = writeln!(out, "  ok       {}  {}", doc.id(), doc.patterns().join(", "));
    }
    for rejection in snapshot.rejections() {
        let _ = writeln!(
            out,
            "  rejected {}  ({}): {}",
            rejection.id, rejection.source_ref, rejection.error
        );
    }
    for error in load_errors {
        let _ = writeln!(out, "  error    {error}");
    }
    Ok(out)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;

    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    if settings.logging.json {
        lectern_logging::init_json_subscriber(level);
    } else {
        lectern_logging::init_subscriber(level);
    }

    let outcome = execute(&cli, &settings)?;
    print!("{}", outcome.output);
    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn corpus() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "all.instructions.md", "---\napplyTo: '**'\n---\nBe concise.");
        write(tmp.path(), "rust.instructions.md", "---\napplyTo: '**/*.rs'\n---\nUse clippy.");
        tmp
    }

    fn run(args: &[&str]) -> Outcome {
        let cli = Cli::parse_from(args);
        execute(&cli, &LecternSettings::default()).unwrap()
    }

    #[test]
    fn cli_parses_match() {
        let cli = Cli::parse_from(["lectern", "match", "src/lib.rs"]);
        assert_eq!(cli.command, Command::Match { path: "src/lib.rs".into() });
        assert!(!cli.json);
        assert!(cli.corpus.is_none());
    }

    #[test]
    fn cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["lectern", "check", "--corpus", "/c", "--json"]);
        assert_eq!(cli.corpus, Some(PathBuf::from("/c")));
        assert!(cli.json);
    }

    #[test]
    fn cli_parses_compose_options() {
        let cli = Cli::parse_from([
            "lectern", "compose", "a.rs", "--budget", "10", "--unit", "tokens",
        ]);
        assert_eq!(
            cli.command,
            Command::Compose {
                path: "a.rs".into(),
                budget: Some(10),
                unit: Some(BudgetUnit::Tokens),
            }
        );
    }

    #[test]
    fn cli_rejects_unknown_unit() {
        assert!(Cli::try_parse_from(["lectern", "compose", "a.rs", "--unit", "words"]).is_err());
    }

    #[test]
    fn match_lists_ranked_documents() {
        let tmp = corpus();
        let root = tmp.path().to_str().unwrap();
        let outcome = run(&["lectern", "--corpus", root, "match", "src/lib.rs"]);
        assert!(outcome.success);
        let rust = outcome.output.find("rust").unwrap();
        let all = outcome.output.find("all").unwrap();
        assert!(rust < all);
    }

    #[test]
    fn match_json_is_camel_case() {
        let tmp = corpus();
        let root = tmp.path().to_str().unwrap();
        let outcome = run(&["lectern", "--corpus", root, "--json", "match", "src/lib.rs"]);
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(value["snapshotVersion"], 1);
        assert_eq!(value["documents"][0]["id"], "rust");
        assert_eq!(value["documents"][0]["matchedPattern"], "**/*.rs");
    }

    #[test]
    fn compose_prints_text() {
        let tmp = corpus();
        let root = tmp.path().to_str().unwrap();
        let outcome = run(&["lectern", "--corpus", root, "compose", "src/lib.rs"]);
        assert_eq!(outcome.output, "Use clippy.\n\nBe concise.\n");
    }

    #[test]
    fn compose_with_small_budget_reports_truncation() {
        let tmp = corpus();
        let root = tmp.path().to_str().unwrap();
        let outcome = run(&[
            "lectern", "--corpus", root, "--json", "compose", "src/lib.rs", "--budget", "12",
        ]);
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(value["text"], "Use clippy.");
        assert_eq!(value["truncated"], true);
        assert_eq!(value["omitted"][0], "all");
    }

    #[test]
    fn check_fails_on_rejected_documents() {
        let tmp = corpus();
        write(tmp.path(), "bad.instructions.md", "---\napplyTo: '**/*.{ts,'\n---\nx");
        let root = tmp.path().to_str().unwrap();

        let outcome = run(&["lectern", "--corpus", root, "check"]);
        assert!(!outcome.success);
        assert!(outcome.output.contains("2 active, 1 rejected"));
        assert!(outcome.output.contains("rejected bad"));
    }

    #[test]
    fn check_succeeds_on_clean_corpus() {
        let tmp = corpus();
        let root = tmp.path().to_str().unwrap();
        let outcome = run(&["lectern", "--corpus", root, "--json", "check"]);
        assert!(outcome.success);
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(value["active"], json!(["all", "rust"]));
    }

    #[test]
    fn missing_corpus_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let cli = Cli::parse_from(["lectern", "--corpus", missing.to_str().unwrap(), "check"]);
        assert!(execute(&cli, &LecternSettings::default()).is_err());
    }

    #[test]
    fn settings_file_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{ "compose": { "budget": 5 } }"#).unwrap();
        let cli = Cli::parse_from(["lectern", "--settings", path.to_str().unwrap(), "check"]);
        assert_eq!(cli.load_settings().unwrap().compose.budget, 5);
    }
}
