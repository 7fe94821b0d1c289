use thiserror::Error;

/// Errors raised while locating or parsing a metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    /// An opening `---` was found but no closing delimiter follows it.
    #[error("metadata block opened on line {line} is never closed")]
    Unterminated { line: usize },

    /// A top-level line inside the block is not a `key: value` pair.
    #[error("line {line} of metadata block is not a `key: value` entry: {text:?}")]
    InvalidLine { line: usize, text: String },

    /// Indented content appears before any top-level key.
    #[error("line {line} of metadata block is indented but has no parent key")]
    OrphanContinuation { line: usize },
}

/// Errors raised while validating a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("prompt template must contain the {placeholder} placeholder")]
    MissingTextPlaceholder { placeholder: &'static str },

    #[error("prompt template is empty")]
    Empty,
}
