//! The remote summarization seam.
//!
//! Concrete providers (OpenAI) live in the `summarize-ai` app crate; tests
//! plug in in-process fakes.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// One summarization call.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub path: &'a Path,
    /// Note content, already truncated to the run's limit.
    pub text: &'a str,
    /// The rendered prompt (template with placeholders substituted).
    pub prompt: &'a str,
}

/// Summary and tags returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    pub summary: String,
    pub tags: Vec<String>,
}

impl Summary {
    /// Trim the summary; trim tags, strip a leading `#`, drop empty and
    /// repeated tags keeping the first occurrence.
    pub fn normalized(self) -> Self {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim().trim_start_matches('#').trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Self {
            summary: self.summary.trim().to_string(),
            tags,
        }
    }
}

/// A backend producing a summary and tags for a note.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// worker of a run.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Provider name for logs (e.g. `"openai"`).
    fn name(&self) -> &str;

    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<Summary>;
}
