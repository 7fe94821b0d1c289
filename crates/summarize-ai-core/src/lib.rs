//! # summarize-ai core
//!
//! Pure logic for summarize-ai: the frontmatter model, the annotation
//! rewriter, candidate selection, prompt templates, cost estimation and the
//! [`summarizer::Summarizer`] trait.
//!
//! This crate performs no filesystem or network I/O. Everything here works on
//! `&str` inputs and returns owned strings, which keeps the text surgery
//! testable in isolation from the pipeline that drives it.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`frontmatter`] | Locate the `---` delimited block at the top of a note |
//! | [`block`] | Ordered association list for the block interior |
//! | [`scalar`] | Reading and writing YAML-like scalar values |
//! | [`annotation`] | Write the reserved annotation keys back into a note |
//! | [`select`] | Decide whether a note needs (re)annotation |
//! | [`prompt`] | Prompt template rendering and identity hash |
//! | [`estimate`] | Informational cost estimate |
//! | [`summarizer`] | The remote summarization seam |

pub mod annotation;
pub mod block;
pub mod error;
pub mod estimate;
pub mod frontmatter;
pub mod prompt;
pub mod scalar;
pub mod select;
pub mod summarizer;

pub use annotation::Annotation;
pub use block::{MetadataBlock, Value};
pub use error::{FrontmatterError, PromptError};
pub use select::SelectionPolicy;
