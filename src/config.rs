//! TOML configuration.
//!
//! Every section and field has a default, so running without a config file
//! is the same as loading an empty one. Command-line flags are applied on
//! top of the loaded values by the caller.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use summarize_ai_core::estimate::Pricing;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub estimate: Pricing,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    /// File extensions (without dot) treated as notes.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Directory names never descended into.
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,
    /// Globs matched against paths relative to the scan root.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_ignore_dirs() -> Vec<String> {
    [".git", ".obsidian", ".trash", ".hg", ".svn"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_dirs: default_ignore_dirs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Notes longer than this many characters are cut before sending.
    #[serde(default = "default_truncate_chars")]
    pub truncate_chars: usize,
    #[serde(default = "default_dry_run_delay_ms")]
    pub dry_run_delay_ms: u64,
}

fn default_workers() -> usize {
    10
}
fn default_truncate_chars() -> usize {
    50_000
}
fn default_dry_run_delay_ms() -> u64 {
    50
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            truncate_chars: default_truncate_chars(),
            dry_run_delay_ms: default_dry_run_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Log request and response payloads at debug level.
    #[serde(default)]
    pub log_payloads: bool,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            log_payloads: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_template")]
    pub template: String,
}

pub fn default_template() -> String {
    "Summarize the following Markdown note in two or three sentences, written in the \
same language as the note. Then suggest up to five short, lowercase tags that describe \
its topics.\n\
Respond only with a JSON object of the form {\"summary\": \"...\", \"tags\": [\"...\"]}.\n\n\
Note path: {{path}}\n\n\
{{text}}"
        .to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
        }
    }
}

impl Config {
    /// `--debug` also turns on payload logging; it never turns it off.
    pub fn apply_debug(&mut self, debug: bool) {
        self.summarizer.log_payloads |= debug;
    }
}

/// Load configuration from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => Config::default(),
    };

    validate(&config)?;
    Ok(config)
}

/// Check invariants the rest of the program relies on.
pub fn validate(config: &Config) -> Result<()> {
    if config.scan.extensions.is_empty() {
        anyhow::bail!("scan.extensions must list at least one extension");
    }

    if config.pipeline.workers == 0 {
        anyhow::bail!("pipeline.workers must be >= 1");
    }

    if config.pipeline.truncate_chars == 0 {
        anyhow::bail!("pipeline.truncate_chars must be >= 1");
    }

    if config.estimate.chars_per_token == 0 {
        anyhow::bail!("estimate.chars_per_token must be >= 1");
    }

    match config.summarizer.provider.as_str() {
        "openai" => {}
        other => anyhow::bail!("Unknown summarizer provider: '{}'. Must be openai.", other),
    }

    Ok(())
}

/// Resolve the prompt template: inline text wins over a file, which wins
/// over the configured template.
pub fn resolve_prompt(
    config: &Config,
    inline: Option<&str>,
    file: Option<&PathBuf>,
) -> Result<String> {
    if let Some(text) = inline {
        return Ok(text.to_string());
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()));
    }
    Ok(config.prompt.template.clone())
}
