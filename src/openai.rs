//! OpenAI chat-completions summarizer.
//!
//! Sends the rendered prompt as the user message and asks for a JSON object
//! `{"summary": "...", "tags": [...]}` back.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use summarize_ai_core::summarizer::{Summarizer, Summary, SummaryRequest};
use tracing::{debug, warn};

use crate::config::SummarizerConfig;

const SYSTEM_MESSAGE: &str = "You annotate personal Markdown notes. Reply with a single JSON \
object with exactly two fields: \"summary\" (a string) and \"tags\" (an array of strings). \
Do not wrap the object in code fences.";

/// Summarizer calling `POST {base_url}/chat/completions`.
pub struct OpenAISummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
    log_payloads: bool,
}

impl OpenAISummarizer {
    pub fn new(config: &SummarizerConfig, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("OpenAI API key is empty");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
            log_payloads: config.log_payloads,
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_MESSAGE },
                { "role": "user", "content": prompt },
            ],
            "response_format": { "type": "json_object" },
        })
    }
}

#[async_trait]
impl Summarizer for OpenAISummarizer {
    fn name(&self) -> &str {
        "openai"
    }

    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<Summary> {
        let body = self.request_body(request.prompt);
        if self.log_payloads {
            debug!(path = %request.path.display(), payload = %body, "openai request");
        }

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                debug!(path = %request.path.display(), attempt, ?delay, "retrying openai request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .context("Failed to decode OpenAI response body")?;
                        if self.log_payloads {
                            debug!(path = %request.path.display(), payload = %json, "openai response");
                        }
                        return parse_chat_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();

                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(path = %request.path.display(), %status, attempt, "openai transient error");
                        last_err = Some(anyhow!("OpenAI API error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    warn!(path = %request.path.display(), error = %e, attempt, "openai request failed");
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Summarization failed after retries")))
    }
}

/// Extract the summary and tags from a chat-completions response.
pub fn parse_chat_response(json: &serde_json::Value) -> Result<Summary> {
    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing choices[0].message.content"))?;

    let payload: serde_json::Value = serde_json::from_str(strip_code_fence(content))
        .context("Invalid OpenAI response: message content is not JSON")?;

    let summary = payload
        .get("summary")
        .and_then(|s| s.as_str())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing summary"))?;

    let tags = match payload.get("tags") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect(),
        Some(serde_json::Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(other) => bail!("Invalid OpenAI response: tags is {}", other),
    };

    let summary = Summary {
        summary: summary.to_string(),
        tags,
    }
    .normalized();

    if summary.summary.is_empty() {
        bail!("OpenAI returned an empty summary");
    }

    Ok(summary)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Build the summarizer named by `config.provider`.
pub fn create_summarizer(config: &SummarizerConfig, api_key: String) -> Result<Arc<dyn Summarizer>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAISummarizer::new(config, api_key)?)),
        other => bail!("Unknown summarizer provider: {}", other),
    }
}
