//! Run progress reporting.
//!
//! Reports which phase a run is in and, while processing, how many notes are
//! done. Progress is emitted on **stderr** so stdout remains parseable for
//! scripts.

use std::io::Write;
use std::sync::Arc;

/// Phase of a run, in the order they are entered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunPhase {
    Scanning,
    Estimating,
    Confirming,
    Processing,
    Reporting,
    Done,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Scanning => "scanning",
            RunPhase::Estimating => "estimating",
            RunPhase::Confirming => "confirming",
            RunPhase::Processing => "processing",
            RunPhase::Reporting => "reporting",
            RunPhase::Done => "done",
        }
    }
}

/// A single progress event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgressEvent {
    /// A new phase was entered.
    Phase(RunPhase),
    /// `n` of `total` notes finished, successfully or not.
    Processing { n: u64, total: u64 },
}

/// Reports run progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Emit a progress event. Called concurrently from pipeline workers.
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "summarize-ai  processing  12 / 1,500 notes".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Phase(phase) => format!("summarize-ai  {}...\n", phase.as_str()),
            ProgressEvent::Processing { n, total } => format!(
                "summarize-ai  processing  {} / {} notes\n",
                format_number(*n),
                format_number(*total)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Phase(phase) => serde_json::json!({
                "event": "phase",
                "phase": phase.as_str(),
            }),
            ProgressEvent::Processing { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "processing",
                "n": n,
                "total": total,
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode, shareable across pipeline workers.
    pub fn reporter(&self) -> Arc<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Arc::new(NoProgress),
            ProgressMode::Human => Arc::new(StderrProgress),
            ProgressMode::Json => Arc::new(JsonProgress),
        }
    }
}
