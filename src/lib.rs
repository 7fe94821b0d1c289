//! # summarize-ai
//!
//! Annotate a directory of Markdown notes with AI-generated summaries and
//! tags, written into each note's frontmatter.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │   Scanner   │──▶│  Pipeline   │──▶│  Summarizer  │──▶│  Rewrite  │
//! │ walk+select │   │ worker pool │   │   (OpenAI)   │   │ 4 keys    │
//! └─────────────┘   └─────────────┘   └──────────────┘   └───────────┘
//! ```
//!
//! Only four reserved keys are ever written (`summarize_ai`,
//! `summarize_ai_hash`, `summarize_ai_tags`, `summarize_ai_updated`); every
//! other byte of a note is preserved. The pure parsing and selection logic
//! lives in the `summarize-ai-core` crate.
//!
//! ## Quick Start
//!
//! ```bash
//! summarize-ai scan --path ~/vault          # what would be processed
//! summarize-ai run --path ~/vault --dry-run # simulate
//! summarize-ai run --path ~/vault           # annotate
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Candidates, per-file errors and the run report |
//! | [`scanner`] | Directory walk and candidate selection |
//! | [`document`] | Reading and rewriting notes |
//! | [`openai`] | OpenAI chat-completions summarizer |
//! | [`pipeline`] | Concurrent processing |
//! | [`progress`] | Progress reporting on stderr |
//! | [`run_cmd`] | The `run`, `scan` and `prompt` commands |
//! | [`logging`] | tracing subscriber setup |

pub mod config;
pub mod document;
pub mod logging;
pub mod models;
pub mod openai;
pub mod pipeline;
pub mod progress;
pub mod run_cmd;
pub mod scanner;
