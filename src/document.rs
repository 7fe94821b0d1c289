//! Reading and rewriting notes on disk.

use anyhow::{Context, Result};
use std::path::Path;
use summarize_ai_core::annotation::{self, Annotation};

/// Read a note as UTF-8.
pub async fn read_note(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Write `annotation` into the note at `path`.
///
/// The note is read again here rather than reusing the text that was sent
/// for summarization, which may have been truncated.
pub async fn rewrite_file(path: &Path, annotation: &Annotation) -> Result<()> {
    let raw = read_note(path).await?;
    let updated = annotation::apply(&raw, annotation)
        .with_context(|| format!("Failed to update metadata block: {}", path.display()))?;
    tokio::fs::write(path, updated)
        .await
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
}
