//! End-to-end annotation through the library: scan a vault, process it with
//! an in-process summarizer, and check what landed on disk.

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use summarize_ai::config::ScanConfig;
use summarize_ai::models::ScanResult;
use summarize_ai::pipeline::{Pipeline, PipelineOptions};
use summarize_ai::progress::{NoProgress, ProgressEvent, ProgressReporter};
use summarize_ai::scanner::{ScanOptions, Scanner};
use summarize_ai_core::prompt::PromptTemplate;
use summarize_ai_core::select::SelectionPolicy;
use summarize_ai_core::summarizer::{Summarizer, Summary, SummaryRequest};
use tempfile::TempDir;

// ─── Test Summarizer ────────────────────────────────────────────────

/// Answers with the note's file name so results are easy to check.
#[derive(Default)]
struct EchoSummarizer {
    calls: AtomicUsize,
}

#[async_trait]
impl Summarizer for EchoSummarizer {
    fn name(&self) -> &str {
        "echo"
    }

    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<Summary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = request
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Summary {
            summary: format!("About {}", name),
            tags: vec![name, "#vault".to_string()],
        })
    }
}

#[derive(Default)]
struct CountingProgress {
    events: AtomicUsize,
}

impl ProgressReporter for CountingProgress {
    fn report(&self, event: ProgressEvent) {
        if matches!(event, ProgressEvent::Processing { .. }) {
            self.events.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn scan(root: &Path, policy: SelectionPolicy) -> ScanResult {
    Scanner::new(ScanOptions::from(&ScanConfig::default()))
        .unwrap()
        .scan(root, policy)
        .unwrap()
}

fn options() -> PipelineOptions {
    PipelineOptions {
        workers: 3,
        truncate_chars: 10_000,
        dry_run: false,
        dry_run_delay: Duration::ZERO,
    }
}

fn prompt() -> PromptTemplate {
    PromptTemplate::new("Path: {{path}}\n\n{{text}}").unwrap()
}

fn vault() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("daily")).unwrap();
    fs::write(root.join("plain.md"), "Just some text.\n").unwrap();
    fs::write(
        root.join("daily/with_meta.md"),
        "---\n# keep this comment\ntitle: \"Daily: log\"\naliases:\n  - today\n---\n\nBody line.\n",
    )
    .unwrap();
    tmp
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn annotates_vault_and_second_run_finds_nothing() {
    let tmp = vault();
    let summarizer = Arc::new(EchoSummarizer::default());
    let progress = Arc::new(CountingProgress::default());

    let candidates = scan(tmp.path(), SelectionPolicy::Default);
    assert_eq!(candidates.len(), 2);

    let report = Pipeline::new(summarizer.clone(), prompt(), options(), progress.clone())
        .run(candidates)
        .await;
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed(), 0);
    assert_eq!(progress.events.load(Ordering::SeqCst), 2);

    let plain = fs::read_to_string(tmp.path().join("plain.md")).unwrap();
    assert!(plain.starts_with("---\nsummarize_ai: About plain\n"));
    assert!(plain.contains("summarize_ai_tags:\n  - plain\n  - vault\n"));
    assert!(plain.ends_with("---\nJust some text.\n"));

    let meta = fs::read_to_string(tmp.path().join("daily/with_meta.md")).unwrap();
    assert!(meta.starts_with(
        "---\n# keep this comment\ntitle: \"Daily: log\"\naliases:\n  - today\nsummarize_ai: About with_meta\n"
    ));
    assert!(meta.ends_with("---\n\nBody line.\n"));

    let again = scan(tmp.path(), SelectionPolicy::Default);
    assert!(again.is_empty());
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn forced_rerun_replaces_keys_in_place() {
    let tmp = vault();
    let summarizer = Arc::new(EchoSummarizer::default());
    let pipeline = Pipeline::new(summarizer, prompt(), options(), Arc::new(NoProgress));

    pipeline
        .run(scan(tmp.path(), SelectionPolicy::Default))
        .await;
    let first = fs::read_to_string(tmp.path().join("daily/with_meta.md")).unwrap();

    let report = pipeline.run(scan(tmp.path(), SelectionPolicy::Force)).await;
    assert_eq!(report.succeeded, 2);
    let second = fs::read_to_string(tmp.path().join("daily/with_meta.md")).unwrap();

    assert_eq!(second.matches("summarize_ai:").count(), 1);
    assert_eq!(second.matches("summarize_ai_hash:").count(), 1);
    let strip_time = |s: &str| {
        s.lines()
            .filter(|l| !l.starts_with("summarize_ai_updated:"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    assert_eq!(strip_time(&first), strip_time(&second));
}

#[tokio::test]
async fn stale_notes_are_picked_up_only_when_asked() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("edited.md"),
        "---\nupdated: 2024-05-02T08:00\nsummarize_ai: Old\nsummarize_ai_hash: 0123456789abcdef\nsummarize_ai_tags:\n  - old\nsummarize_ai_updated: 2024-05-01T08:00\n---\nNew content.\n",
    )
    .unwrap();

    assert!(scan(tmp.path(), SelectionPolicy::Default).is_empty());
    let stale = scan(tmp.path(), SelectionPolicy::IncludeStale);
    assert_eq!(stale.len(), 1);

    let report = Pipeline::new(
        Arc::new(EchoSummarizer::default()),
        prompt(),
        options(),
        Arc::new(NoProgress),
    )
    .run(stale)
    .await;
    assert_eq!(report.succeeded, 1);

    let text = fs::read_to_string(tmp.path().join("edited.md")).unwrap();
    assert!(text.starts_with("---\nupdated: 2024-05-02T08:00\nsummarize_ai: About edited\n"));
}

#[tokio::test]
async fn unterminated_block_is_reported_and_left_alone() {
    let tmp = TempDir::new().unwrap();
    let broken = "---\ntitle: never closed\nstill in the header\n";
    fs::write(tmp.path().join("broken.md"), broken).unwrap();
    fs::write(tmp.path().join("fine.md"), "fine").unwrap();

    let report = Pipeline::new(
        Arc::new(EchoSummarizer::default()),
        prompt(),
        options(),
        Arc::new(NoProgress),
    )
    .run(scan(tmp.path(), SelectionPolicy::Default))
    .await;

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed(), 1);
    assert!(report.errors[0].path.ends_with("broken.md"));
    assert_eq!(
        fs::read_to_string(tmp.path().join("broken.md")).unwrap(),
        broken
    );
}
