//! Candidate selection: does a note need a (new) annotation?

use chrono::NaiveDateTime;

use crate::annotation::{RESERVED_KEYS, TIMESTAMP_FORMAT, UPDATED_KEY};
use crate::block::MetadataBlock;
use crate::frontmatter;

/// Author-maintained last-modified key compared against [`UPDATED_KEY`].
pub const MODIFIED_KEY: &str = "updated";

/// Which annotated notes a run revisits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Only notes without a complete annotation.
    #[default]
    Default,
    /// Every note, annotated or not.
    Force,
    /// Incomplete notes plus notes edited after their annotation.
    IncludeStale,
}

impl SelectionPolicy {
    /// Policy for the `--override` / `--include-stale` flag pair. Force wins.
    pub fn from_flags(force: bool, include_stale: bool) -> Self {
        if force {
            SelectionPolicy::Force
        } else if include_stale {
            SelectionPolicy::IncludeStale
        } else {
            SelectionPolicy::Default
        }
    }
}

/// Outcome of classifying one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero-length file; never annotated.
    Empty,
    /// Selected because the policy is [`SelectionPolicy::Force`].
    Forced,
    /// No metadata block at all.
    New,
    /// A block is opened but never closed. Selected so the rewrite fails
    /// visibly instead of the note being skipped in silence.
    Unterminated,
    /// At least one reserved key is missing.
    Incomplete,
    /// `updated` is later than the annotation timestamp.
    Stale,
    /// Fully annotated and not selected by the policy.
    Current,
}

impl Selection {
    pub fn is_candidate(self) -> bool {
        !matches!(self, Selection::Empty | Selection::Current)
    }
}

/// Classify `content` under `policy`.
pub fn classify(content: &str, policy: SelectionPolicy) -> Selection {
    if content.is_empty() {
        return Selection::Empty;
    }
    if policy == SelectionPolicy::Force {
        return Selection::Forced;
    }

    let parts = match frontmatter::split(content) {
        Ok(Some(parts)) => parts,
        Ok(None) => return Selection::New,
        Err(_) => return Selection::Unterminated,
    };

    if !RESERVED_KEYS
        .iter()
        .all(|key| declares_key(parts.interior, key))
    {
        return Selection::Incomplete;
    }

    if policy == SelectionPolicy::IncludeStale && is_stale(parts.interior) {
        Selection::Stale
    } else {
        Selection::Current
    }
}

/// Whether `content` should be (re)annotated under `policy`.
pub fn should_process(content: &str, policy: SelectionPolicy) -> bool {
    classify(content, policy).is_candidate()
}

/// Parse a `YYYY-MM-DDTHH:MM` timestamp.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Textual check: some top-level line starts with `key:`.
fn declares_key(interior: &str, key: &str) -> bool {
    interior
        .lines()
        .any(|line| line.strip_prefix(key).is_some_and(|rest| rest.starts_with(':')))
}

/// Ambiguous data never counts as stale: a block that is not a valid YAML
/// mapping (duplicate keys included), or missing or malformed timestamps.
fn is_stale(interior: &str) -> bool {
    if !matches!(
        serde_yaml::from_str::<serde_yaml::Value>(interior),
        Ok(serde_yaml::Value::Mapping(_))
    ) {
        return false;
    }
    let Ok(block) = MetadataBlock::parse(interior) else {
        return false;
    };
    let modified = block.get_str(MODIFIED_KEY).and_then(parse_timestamp);
    let annotated = block.get_str(UPDATED_KEY).and_then(parse_timestamp);
    match (modified, annotated) {
        (Some(modified), Some(annotated)) => modified > annotated,
        _ => false,
    }
}
