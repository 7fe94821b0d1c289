//! # summarize-ai CLI
//!
//! ## Usage
//!
//! ```bash
//! summarize-ai [--config <file>] [--debug] [--progress off|human|json] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `summarize-ai run --path <p>` | Annotate every note that needs it |
//! | `summarize-ai scan --path <p>` | List candidates and the cost estimate |
//! | `summarize-ai prompt` | Print the prompt template and its hash |
//!
//! ## Examples
//!
//! ```bash
//! # Preview a vault
//! summarize-ai scan --path ~/vault
//!
//! # Re-annotate notes edited since their last annotation, 5 at a time
//! summarize-ai run --path ~/vault --include-stale --workers 5
//!
//! # Try a custom prompt on 20 random notes without writing anything
//! summarize-ai run --path ~/vault --prompt-file prompt.txt --random-order --top 20 --dry-run
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use summarize_ai::config;
use summarize_ai::logging;
use summarize_ai::progress::ProgressMode;
use summarize_ai::run_cmd::{self, PromptSource, RunOptions};
use summarize_ai_core::select::SelectionPolicy;

/// summarize-ai: AI summaries and tags for Markdown notes.
///
/// Results go to stdout; logs and progress go to stderr.
#[derive(Parser)]
#[command(
    name = "summarize-ai",
    about = "Annotate Markdown notes with AI-generated summaries and tags",
    version,
    long_about = "summarize-ai scans a directory of Markdown notes, asks a language model for a \
    short summary and tags for each note that needs one, and writes them into four reserved \
    frontmatter keys without touching anything else in the file."
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose diagnostics, including request and response payloads
    /// (log level overridden by RUST_LOG).
    #[arg(long, global = true)]
    debug: bool,

    /// Progress output on stderr. Defaults to human on a terminal, off otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize and tag every note that needs it.
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// API key. Defaults to the variable named by `summarizer.api_key_env`.
        #[arg(long)]
        api_key: Option<String>,

        /// Simulate: no API calls, no file changes.
        #[arg(long)]
        dry_run: bool,

        /// Number of concurrent workers.
        #[arg(long)]
        workers: Option<usize>,

        /// Process candidates in random order.
        #[arg(long)]
        random_order: bool,

        /// Process at most this many candidates (0 means all).
        #[arg(long)]
        top: Option<usize>,

        /// Do not ask for confirmation.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List candidates and the cost estimate without changing anything.
    Scan {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print the prompt template and its hash.
    Prompt {
        #[command(flatten)]
        prompt: PromptArgs,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// A note or a directory of notes.
    #[arg(long)]
    path: PathBuf,

    /// Reprocess every non-empty note, annotated or not.
    #[arg(long = "override")]
    force: bool,

    /// Also reprocess notes whose `updated` is newer than their annotation.
    #[arg(long)]
    include_stale: bool,

    #[command(flatten)]
    prompt: PromptArgs,
}

impl TargetArgs {
    fn policy(&self) -> SelectionPolicy {
        SelectionPolicy::from_flags(self.force, self.include_stale)
    }
}

#[derive(Args)]
struct PromptArgs {
    /// Prompt template text; must contain {{text}}.
    #[arg(long, conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// File holding the prompt template.
    #[arg(long)]
    prompt_file: Option<PathBuf>,
}

impl From<PromptArgs> for PromptSource {
    fn from(args: PromptArgs) -> Self {
        PromptSource {
            inline: args.prompt,
            file: args.prompt_file,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let mut cfg = config::load_config(cli.config.as_deref())?;
    cfg.apply_debug(cli.debug);
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Run {
            target,
            api_key,
            dry_run,
            workers,
            random_order,
            top,
            yes,
        } => {
            let policy = target.policy();
            let opts = RunOptions {
                path: target.path,
                api_key,
                prompt: target.prompt.into(),
                policy,
                dry_run,
                workers,
                random_order,
                top,
                yes,
            };
            run_cmd::run_annotate(&cfg, opts, progress.reporter()).await?;
        }
        Commands::Scan { target } => {
            let policy = target.policy();
            run_cmd::run_scan(&cfg, &target.path, policy, &target.prompt.into())?;
        }
        Commands::Prompt { prompt } => {
            run_cmd::run_prompt(&cfg, &prompt.into())?;
        }
    }

    Ok(())
}
