//! The `run`, `scan` and `prompt` commands.
//!
//! `run` drives a whole annotation pass: resolve and validate the prompt,
//! scan for candidates, optionally reorder and limit them, print a cost
//! estimate, ask for confirmation, process, and print the report.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use summarize_ai_core::estimate::CostEstimate;
use summarize_ai_core::prompt::{PromptTemplate, PATH_PLACEHOLDER};
use summarize_ai_core::select::SelectionPolicy;
use summarize_ai_core::summarizer::{Summarizer, Summary, SummaryRequest};
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::models::{Report, ScanResult};
use crate::openai;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::progress::{format_number, ProgressEvent, ProgressReporter, RunPhase};
use crate::scanner::{ScanOptions, Scanner};

/// Where the prompt template comes from, in priority order.
#[derive(Debug, Clone, Default)]
pub struct PromptSource {
    pub inline: Option<String>,
    pub file: Option<PathBuf>,
}

/// Options of the `run` command, already merged from flags.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub path: PathBuf,
    pub api_key: Option<String>,
    pub prompt: PromptSource,
    pub policy: SelectionPolicy,
    pub dry_run: bool,
    pub workers: Option<usize>,
    pub random_order: bool,
    pub top: Option<usize>,
    /// Skip the confirmation question.
    pub yes: bool,
}

/// Resolve and validate the prompt template.
pub fn load_prompt(cfg: &Config, source: &PromptSource) -> Result<PromptTemplate> {
    let text = config::resolve_prompt(cfg, source.inline.as_deref(), source.file.as_ref())?;
    let template = PromptTemplate::new(text).context("Invalid prompt template")?;
    if !template.has_path_placeholder() {
        warn!(
            "prompt template has no {} placeholder; the note path will not be sent",
            PATH_PLACEHOLDER
        );
    }
    Ok(template)
}

fn scan(cfg: &Config, path: &Path, policy: SelectionPolicy) -> Result<ScanResult> {
    let scanner = Scanner::new(ScanOptions::from(&cfg.scan))?;
    scanner.scan(path, policy)
}

fn estimate(cfg: &Config, scan: &ScanResult, prompt: &PromptTemplate) -> CostEstimate {
    CostEstimate::compute(
        scan.sizes(),
        prompt.char_len(),
        cfg.pipeline.truncate_chars,
        &cfg.estimate,
    )
}

fn print_estimate(estimate: &CostEstimate) {
    println!("estimate");
    println!("  requests: {}", format_number(estimate.requests as u64));
    println!(
        "  characters sent: {} (untruncated {})",
        format_number(estimate.sent_chars),
        format_number(estimate.total_chars)
    );
    println!(
        "  estimated cost: ${:.4} (untruncated ${:.4})",
        estimate.as_sent, estimate.untruncated
    );
}

fn print_report(report: &Report) {
    if report.dry_run {
        println!("summarize-ai run (dry-run)");
    } else {
        println!("summarize-ai run");
    }
    println!("  candidates: {}", report.total);
    println!("  succeeded: {}", report.succeeded);
    println!("  truncated: {}", report.truncated);
    println!("  failed: {}", report.failed());
    println!("  elapsed: {:.1}s", report.elapsed.as_secs_f64());
    if !report.errors.is_empty() {
        println!("  errors:");
        for err in &report.errors {
            println!("    {}", err);
        }
    }
    println!("ok");
}

/// Find the credential: the explicit flag, else the configured variable.
pub fn resolve_api_key(cfg: &Config, flag: Option<&str>) -> Option<String> {
    let usable = |key: &String| !key.trim().is_empty();
    flag.map(str::to_string)
        .filter(usable)
        .or_else(|| std::env::var(&cfg.summarizer.api_key_env).ok().filter(usable))
}

/// Ask on stdin whether to go ahead.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Stands in for the real summarizer on dry runs without a credential.
/// The pipeline never calls it in dry-run mode.
struct Offline;

#[async_trait]
impl Summarizer for Offline {
    fn name(&self) -> &str {
        "offline"
    }

    async fn summarize(&self, _request: SummaryRequest<'_>) -> Result<Summary> {
        bail!("no API key configured")
    }
}

/// Execute the `run` command.
pub async fn run_annotate(
    cfg: &Config,
    opts: RunOptions,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<Report> {
    let prompt = load_prompt(cfg, &opts.prompt)?;

    let workers = opts.workers.unwrap_or(cfg.pipeline.workers);
    if workers == 0 {
        bail!("--workers must be >= 1");
    }

    let api_key = resolve_api_key(cfg, opts.api_key.as_deref());
    let summarizer: Arc<dyn Summarizer> = match api_key {
        Some(key) => openai::create_summarizer(&cfg.summarizer, key)?,
        None if opts.dry_run => Arc::new(Offline),
        None => bail!(
            "No API key: pass --api-key or set the {} environment variable",
            cfg.summarizer.api_key_env
        ),
    };

    reporter.report(ProgressEvent::Phase(RunPhase::Scanning));
    let mut candidates = scan(cfg, &opts.path, opts.policy)?;
    info!(
        path = %opts.path.display(),
        policy = ?opts.policy,
        candidates = candidates.len(),
        "scan complete"
    );

    if opts.random_order {
        candidates.shuffle();
    }
    if let Some(n) = opts.top.filter(|&n| n > 0) {
        let available = candidates.len();
        if !candidates.limit(n) {
            warn!(requested = n, available, "--top exceeds the number of candidates; processing all");
        }
    }

    if candidates.is_empty() {
        println!("summarize-ai run");
        println!("  no notes need annotation");
        reporter.report(ProgressEvent::Phase(RunPhase::Done));
        return Ok(Report {
            dry_run: opts.dry_run,
            ..Report::default()
        });
    }

    reporter.report(ProgressEvent::Phase(RunPhase::Estimating));
    print_estimate(&estimate(cfg, &candidates, &prompt));

    if !opts.yes && !opts.dry_run {
        reporter.report(ProgressEvent::Phase(RunPhase::Confirming));
        if !atty::is(atty::Stream::Stdin) {
            bail!("Refusing to modify files without confirmation: stdin is not a terminal (pass --yes)");
        }
        let question = format!("Annotate {} notes?", candidates.len());
        if !confirm(&question)? {
            println!("aborted");
            return Ok(Report {
                total: candidates.len(),
                ..Report::default()
            });
        }
    }

    reporter.report(ProgressEvent::Phase(RunPhase::Processing));
    info!(
        prompt_hash = %prompt.hash(),
        workers,
        dry_run = opts.dry_run,
        "processing {} notes",
        candidates.len()
    );
    let options = PipelineOptions {
        workers,
        ..PipelineOptions::from_config(&cfg.pipeline, opts.dry_run)
    };
    let report = Pipeline::new(summarizer, prompt, options, reporter.clone())
        .run(candidates)
        .await;

    reporter.report(ProgressEvent::Phase(RunPhase::Reporting));
    print_report(&report);
    reporter.report(ProgressEvent::Phase(RunPhase::Done));

    Ok(report)
}

/// Execute the `scan` command: list candidates and the estimate.
pub fn run_scan(
    cfg: &Config,
    path: &Path,
    policy: SelectionPolicy,
    prompt: &PromptSource,
) -> Result<ScanResult> {
    let prompt = load_prompt(cfg, prompt)?;
    let candidates = scan(cfg, path, policy)?;

    println!("summarize-ai scan");
    println!("  candidates: {}", candidates.len());
    for candidate in &candidates.candidates {
        println!(
            "  {}  {} chars",
            candidate.path.display(),
            format_number(candidate.chars as u64)
        );
    }
    if !candidates.is_empty() {
        print_estimate(&estimate(cfg, &candidates, &prompt));
    }

    Ok(candidates)
}

/// Execute the `prompt` command: print the template and its hash.
pub fn run_prompt(cfg: &Config, source: &PromptSource) -> Result<PromptTemplate> {
    let prompt = load_prompt(cfg, source)?;
    println!("{}", prompt.as_str());
    println!();
    println!("hash: {}", prompt.hash());
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    fn options(path: &Path) -> RunOptions {
        RunOptions {
            path: path.to_path_buf(),
            api_key: None,
            prompt: PromptSource::default(),
            policy: SelectionPolicy::Default,
            dry_run: true,
            workers: Some(2),
            random_order: false,
            top: None,
            yes: false,
        }
    }

    fn quiet_config() -> Config {
        let mut cfg = Config::default();
        cfg.pipeline.dry_run_delay_ms = 0;
        cfg.summarizer.api_key_env = "SUMMARIZE_AI_TEST_UNSET_KEY".into();
        cfg
    }

    #[tokio::test]
    async fn dry_run_needs_no_key_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "alpha").unwrap();
        fs::write(tmp.path().join("b.md"), "beta").unwrap();

        let report = run_annotate(&quiet_config(), options(tmp.path()), Arc::new(NoProgress))
            .await
            .unwrap();
        assert!(report.dry_run);
        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(fs::read_to_string(tmp.path().join("a.md")).unwrap(), "alpha");
    }

    #[tokio::test]
    async fn top_limits_candidates() {
        let tmp = TempDir::new().unwrap();
        for name in ["a.md", "b.md", "c.md"] {
            fs::write(tmp.path().join(name), name).unwrap();
        }
        let mut opts = options(tmp.path());
        opts.top = Some(2);
        opts.random_order = true;

        let report = run_annotate(&quiet_config(), opts, Arc::new(NoProgress))
            .await
            .unwrap();
        assert_eq!(report.total, 2);
    }

    #[tokio::test]
    async fn top_zero_means_all() {
        let tmp = TempDir::new().unwrap();
        for name in ["a.md", "b.md", "c.md"] {
            fs::write(tmp.path().join(name), name).unwrap();
        }
        let mut opts = options(tmp.path());
        opts.top = Some(0);

        let report = run_annotate(&quiet_config(), opts, Arc::new(NoProgress))
            .await
            .unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 3);
    }

    #[tokio::test]
    async fn real_run_without_key_fails_before_scanning() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(&tmp.path().join("missing"));
        opts.dry_run = false;
        opts.yes = true;

        let err = run_annotate(&quiet_config(), opts, Arc::new(NoProgress))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No API key"));
    }

    #[tokio::test]
    async fn invalid_prompt_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(tmp.path());
        opts.prompt.inline = Some("no placeholder here".into());

        let err = run_annotate(&quiet_config(), opts, Arc::new(NoProgress))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("{{text}}"));
    }

    #[test]
    fn api_key_flag_wins_and_blank_is_ignored() {
        let cfg = quiet_config();
        assert_eq!(resolve_api_key(&cfg, Some("sk-1")), Some("sk-1".to_string()));
        assert_eq!(resolve_api_key(&cfg, Some("  ")), None);
        assert_eq!(resolve_api_key(&cfg, None), None);
    }

    #[test]
    fn blank_api_key_flag_falls_back_to_environment() {
        let mut cfg = quiet_config();
        cfg.summarizer.api_key_env = "SUMMARIZE_AI_TEST_FALLBACK_KEY".into();
        std::env::set_var("SUMMARIZE_AI_TEST_FALLBACK_KEY", "sk-env");

        assert_eq!(resolve_api_key(&cfg, Some("")), Some("sk-env".to_string()));
        assert_eq!(resolve_api_key(&cfg, Some("  ")), Some("sk-env".to_string()));
        assert_eq!(resolve_api_key(&cfg, Some("sk-flag")), Some("sk-flag".to_string()));
    }

    #[test]
    fn prompt_command_reports_hash() {
        let source = PromptSource {
            inline: Some("Sum {{text}}".into()),
            file: None,
        };
        let prompt = run_prompt(&Config::default(), &source).unwrap();
        assert_eq!(prompt.hash().len(), 16);
    }
}
