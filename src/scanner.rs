//! Directory scanner.
//!
//! Walks a note or a directory of notes and keeps the ones the candidate
//! classifier selects. Unlike the pipeline, the scan is fail-fast: an
//! unreadable file aborts the whole walk, so a partial candidate list never
//! silently under-processes a vault.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::ffi::OsStr;
use std::path::Path;
use summarize_ai_core::select::{classify, Selection, SelectionPolicy};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::models::{Candidate, ScanResult};

/// What the scanner looks at and what it skips.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub extensions: Vec<String>,
    pub ignore_dirs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub follow_symlinks: bool,
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            ignore_dirs: config.ignore_dirs.clone(),
            exclude_globs: config.exclude_globs.clone(),
            follow_symlinks: config.follow_symlinks,
        }
    }
}

pub struct Scanner {
    options: ScanOptions,
    exclude_set: GlobSet,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Result<Self> {
        let exclude_set = build_globset(&options.exclude_globs)?;
        Ok(Self {
            options,
            exclude_set,
        })
    }

    /// Scan `root` (a note or a directory) under `policy`.
    pub fn scan(&self, root: &Path, policy: SelectionPolicy) -> Result<ScanResult> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve path: {}", root.display()))?;
        let metadata = std::fs::metadata(&root)
            .with_context(|| format!("Failed to stat path: {}", root.display()))?;

        let mut candidates = Vec::new();

        if metadata.is_file() {
            if self.has_note_extension(&root) {
                if let Some(candidate) = self.classify_file(&root, policy)? {
                    candidates.push(candidate);
                }
            }
            return Ok(ScanResult::new(candidates));
        }

        if !metadata.is_dir() {
            bail!("Not a file or directory: {}", root.display());
        }

        let walker = WalkDir::new(&root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored_dir(entry));

        for entry in walker {
            let entry = entry.context("Failed to walk directory")?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.has_note_extension(path) {
                continue;
            }

            let relative = path.strip_prefix(&root).unwrap_or(path);
            if self.exclude_set.is_match(relative) {
                debug!(path = %path.display(), "excluded by glob");
                continue;
            }

            if let Some(candidate) = self.classify_file(path, policy)? {
                candidates.push(candidate);
            }
        }

        Ok(ScanResult::new(candidates))
    }

    fn classify_file(&self, path: &Path, policy: SelectionPolicy) -> Result<Option<Candidate>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let selection = classify(&content, policy);
        debug!(path = %path.display(), ?selection, "classified");

        if !selection.is_candidate() {
            return Ok(None);
        }
        if selection == Selection::Unterminated {
            debug!(path = %path.display(), "metadata block is never closed; rewrite will fail");
        }

        Ok(Some(Candidate {
            path: path.to_path_buf(),
            chars: content.chars().count(),
        }))
    }

    fn has_note_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| {
                self.options
                    .extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
    }

    fn is_ignored_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.options.ignore_dirs.iter().any(|d| d == name))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
