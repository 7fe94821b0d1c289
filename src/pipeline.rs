//! Concurrent processing of scanned candidates.
//!
//! A fixed pool of worker tasks drains a pre-filled queue. Each worker
//! reads a note, truncates it, asks the summarizer for an annotation and
//! writes it back. Results are collected through a channel once every worker
//! has finished. A failure on one note is recorded and never stops the
//! others, and that includes a summarizer that panics.

use anyhow::{anyhow, Context};
use futures::FutureExt;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use summarize_ai_core::annotation::Annotation;
use summarize_ai_core::prompt::PromptTemplate;
use summarize_ai_core::summarizer::{Summarizer, SummaryRequest};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::config::PipelineConfig;
use crate::document;
use crate::models::{Candidate, FileError, Report, ScanResult, Stage};
use crate::progress::{ProgressEvent, ProgressReporter};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub workers: usize,
    /// Maximum characters sent per note.
    pub truncate_chars: usize,
    /// Simulate processing: no summarizer calls, no writes.
    pub dry_run: bool,
    pub dry_run_delay: Duration,
}

impl PipelineOptions {
    pub fn from_config(config: &PipelineConfig, dry_run: bool) -> Self {
        Self {
            workers: config.workers,
            truncate_chars: config.truncate_chars,
            dry_run,
            dry_run_delay: Duration::from_millis(config.dry_run_delay_ms),
        }
    }
}

/// What happened to one candidate.
enum Outcome {
    Done { truncated: bool },
    Failed(FileError),
}

pub struct Pipeline {
    summarizer: Arc<dyn Summarizer>,
    prompt: Arc<PromptTemplate>,
    prompt_hash: Arc<str>,
    options: PipelineOptions,
    reporter: Arc<dyn ProgressReporter>,
}

impl Pipeline {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        prompt: PromptTemplate,
        options: PipelineOptions,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let prompt_hash: Arc<str> = prompt.hash().into();
        Self {
            summarizer,
            prompt: Arc::new(prompt),
            prompt_hash,
            options,
            reporter,
        }
    }

    /// Process every candidate in `scan` and report the outcome.
    pub async fn run(&self, scan: ScanResult) -> Report {
        let started = Instant::now();
        let total = scan.len();
        let queue = Arc::new(Mutex::new(VecDeque::from(scan.candidates)));
        let completed = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();

        let workers = self.options.workers.max(1).min(total.max(1));
        debug!(workers, total, dry_run = self.options.dry_run, "starting workers");

        let mut set = JoinSet::new();
        for _ in 0..workers {
            let worker = Worker {
                summarizer: Arc::clone(&self.summarizer),
                prompt: Arc::clone(&self.prompt),
                prompt_hash: Arc::clone(&self.prompt_hash),
                options: self.options.clone(),
            };
            let queue = Arc::clone(&queue);
            let completed = Arc::clone(&completed);
            let reporter = Arc::clone(&self.reporter);
            let tx = tx.clone();

            set.spawn(async move {
                loop {
                    let next = match queue.lock() {
                        Ok(mut queue) => queue.pop_front(),
                        Err(poisoned) => poisoned.into_inner().pop_front(),
                    };
                    let Some(candidate) = next else { break };

                    let outcome = worker.process(candidate).await;
                    let n = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    reporter.report(ProgressEvent::Processing {
                        n: n as u64,
                        total: total as u64,
                    });
                    let _ = tx.send(outcome);
                }
            });
        }
        drop(tx);

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task terminated abnormally");
            }
        }

        let mut report = Report {
            total,
            dry_run: self.options.dry_run,
            ..Report::default()
        };
        while let Some(outcome) = rx.recv().await {
            match outcome {
                Outcome::Done { truncated } => {
                    report.succeeded += 1;
                    if truncated {
                        report.truncated += 1;
                    }
                }
                Outcome::Failed(err) => report.errors.push(err),
            }
        }
        report.errors.sort_by(|a, b| a.path.cmp(&b.path));
        report.elapsed = started.elapsed();
        report
    }
}

/// Per-task state; everything here is shared read-only.
struct Worker {
    summarizer: Arc<dyn Summarizer>,
    prompt: Arc<PromptTemplate>,
    prompt_hash: Arc<str>,
    options: PipelineOptions,
}

impl Worker {
    async fn process(&self, candidate: Candidate) -> Outcome {
        let path = candidate.path;

        let content = match document::read_note(&path).await {
            Ok(content) => content,
            Err(cause) => return self.fail(path, Stage::Read, cause),
        };

        let (text, truncated) = truncate_chars(&content, self.options.truncate_chars);
        if truncated {
            warn!(
                path = %path.display(),
                chars = candidate.chars,
                limit = self.options.truncate_chars,
                "note truncated before summarization"
            );
        }

        if self.options.dry_run {
            tokio::time::sleep(self.options.dry_run_delay).await;
            debug!(path = %path.display(), "dry run, skipping");
            return Outcome::Done { truncated };
        }

        let path_text = path.display().to_string();
        let prompt = self.prompt.render(text, &path_text);
        let request = SummaryRequest {
            path: &path,
            text,
            prompt: &prompt,
        };

        let summary = match AssertUnwindSafe(self.summarizer.summarize(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(anyhow!("summarizer panicked: {}", panic_message(&*panic)))
            })
            .with_context(|| format!("{} request failed", self.summarizer.name()))
        {
            Ok(summary) => summary.normalized(),
            Err(cause) => return self.fail(path, Stage::Summarize, cause),
        };

        let annotation = Annotation::new(
            summary.summary,
            summary.tags,
            &*self.prompt_hash,
            chrono::Local::now().naive_local(),
        );

        if let Err(cause) = document::rewrite_file(&path, &annotation).await {
            return self.fail(path, Stage::Rewrite, cause);
        }

        debug!(path = %path.display(), "annotated");
        Outcome::Done { truncated }
    }

    fn fail(&self, path: PathBuf, stage: Stage, cause: anyhow::Error) -> Outcome {
        let err = FileError { path, stage, cause };
        error!("{}", err);
        Outcome::Failed(err)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("no message")
}

/// The first `limit` characters of `text`, and whether anything was cut.
pub fn truncate_chars(text: &str, limit: usize) -> (&str, bool) {
    match text.char_indices().nth(limit) {
        Some((byte, _)) => (&text[..byte], true),
        None => (text, false),
    }
}
