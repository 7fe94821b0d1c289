//! Writing an annotation into a note's metadata block.
//!
//! [`apply`] touches exactly four reserved keys. Every other key, comment,
//! blank line and every byte of the body comes out exactly as it went in.
//! Applying the same annotation twice gives the same text as applying it
//! once.

use chrono::NaiveDateTime;

use crate::block::MetadataBlock;
use crate::error::FrontmatterError;
use crate::frontmatter::{self, DELIMITER};

/// Summary text.
pub const SUMMARY_KEY: &str = "summarize_ai";
/// Hash of the prompt template that produced the summary.
pub const HASH_KEY: &str = "summarize_ai_hash";
/// Classification tags; absent when there are none.
pub const TAGS_KEY: &str = "summarize_ai_tags";
/// When the annotation was written.
pub const UPDATED_KEY: &str = "summarize_ai_updated";

/// The keys owned by this tool, in the order they are appended.
pub const RESERVED_KEYS: [&str; 4] = [SUMMARY_KEY, HASH_KEY, TAGS_KEY, UPDATED_KEY];

/// Format of [`UPDATED_KEY`] and of the author-maintained `updated` key.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A machine-generated annotation for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub summary: String,
    pub tags: Vec<String>,
    pub prompt_hash: String,
    pub updated_at: NaiveDateTime,
}

impl Annotation {
    pub fn new(
        summary: impl Into<String>,
        tags: Vec<String>,
        prompt_hash: impl Into<String>,
        updated_at: NaiveDateTime,
    ) -> Self {
        Self {
            summary: summary.into(),
            tags,
            prompt_hash: prompt_hash.into(),
            updated_at,
        }
    }

    /// `updated_at` rendered with [`TIMESTAMP_FORMAT`].
    pub fn timestamp(&self) -> String {
        self.updated_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Set or replace the reserved keys on `block`.
    pub fn write_into(&self, block: &mut MetadataBlock) {
        block.set(SUMMARY_KEY, self.summary.as_str());
        block.set(HASH_KEY, self.prompt_hash.as_str());
        if self.tags.is_empty() {
            block.remove(TAGS_KEY);
        } else {
            block.set_list(TAGS_KEY, self.tags.iter().map(String::as_str));
        }
        block.set(UPDATED_KEY, self.timestamp());
    }
}

/// Return `raw` with `annotation` written into its metadata block.
///
/// Documents without a block get a new one prepended. Documents whose block
/// is never closed are rejected rather than given a second block.
pub fn apply(raw: &str, annotation: &Annotation) -> Result<String, FrontmatterError> {
    let Some(parts) = frontmatter::split(raw)? else {
        let line_ending = if raw.contains("\r\n") { "\r\n" } else { "\n" };
        let mut block = MetadataBlock::with_line_ending(line_ending);
        annotation.write_into(&mut block);

        let mut out = String::with_capacity(raw.len() + 256);
        out.push_str(DELIMITER);
        out.push_str(line_ending);
        out.push_str(&block.serialize());
        out.push_str(DELIMITER);
        out.push_str(line_ending);
        out.push_str(raw);
        return Ok(out);
    };

    let mut block = MetadataBlock::parse(parts.interior)?;
    annotation.write_into(&mut block);

    let mut out = String::with_capacity(raw.len() + 256);
    out.push_str(parts.prefix);
    out.push_str(parts.opening);
    out.push_str(&block.serialize());
    out.push_str(parts.closing);
    if parts.body.is_empty() && !parts.closing.ends_with('\n') {
        out.push_str(block.line_ending());
    }
    out.push_str(parts.body);
    Ok(out)
}
