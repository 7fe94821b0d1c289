//! Data types flowing between the scanner, the pipeline and the report.

use rand::seq::SliceRandom;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A note selected for annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute path of the note.
    pub path: PathBuf,
    /// Size in characters at scan time.
    pub chars: usize,
}

/// Candidates in scan order, consumed once by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub candidates: Vec<Candidate>,
}

impl ScanResult {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Uniformly random order.
    pub fn shuffle(&mut self) {
        self.candidates.shuffle(&mut rand::rng());
    }

    /// Keep only the first `n` candidates. Returns `false` when fewer than
    /// `n` were available.
    pub fn limit(&mut self, n: usize) -> bool {
        if n > self.candidates.len() {
            return false;
        }
        self.candidates.truncate(n);
        true
    }

    /// Character counts, for the cost estimate.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.candidates.iter().map(|c| c.chars)
    }
}

/// Step at which a note failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Summarize,
    Rewrite,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Summarize => "summarize",
            Stage::Rewrite => "rewrite",
        };
        f.write_str(name)
    }
}

/// A per-note failure. Never aborts the run.
#[derive(Debug)]
pub struct FileError {
    pub path: PathBuf,
    pub stage: Stage,
    pub cause: anyhow::Error,
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} failed): {:#}",
            self.path.display(),
            self.stage,
            self.cause
        )
    }
}

/// Aggregate outcome of a pipeline run.
#[derive(Debug, Default)]
pub struct Report {
    pub total: usize,
    pub succeeded: usize,
    /// Notes whose text was cut to the truncation limit before sending.
    pub truncated: usize,
    pub errors: Vec<FileError>,
    pub elapsed: Duration,
    pub dry_run: bool,
}

impl Report {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}
