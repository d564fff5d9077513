//! Completion backend implementations.
//!
//! - **[`DisabledCompletion`]**: returns errors; used when `llm.provider = "disabled"`.
//! - **[`OpenAiCompletion`]**: calls an OpenAI-compatible chat completions
//!   endpoint with retry and backoff.
//!
//! Use [`create_completion`] to pick one from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use catchall_core::backend::CompletionBackend;

use crate::config::LlmConfig;
use crate::http::send_with_retry;

/// Instantiate the completion backend named by `config.provider`.
pub fn create_completion(config: &LlmConfig) -> Result<Arc<dyn CompletionBackend>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiCompletion::from_env(config)?)),
        "disabled" => Ok(Arc::new(DisabledCompletion)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

// ============ Disabled Provider ============

/// A completion backend that always fails.
///
/// Searches whose query is already well-formed still work; anything that
/// needs a rewrite or an analysis reports the provider as disabled.
pub struct DisabledCompletion;

#[async_trait]
impl CompletionBackend for DisabledCompletion {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("LLM provider is disabled; set [llm] provider in config")
    }
}

// ============ OpenAI Provider ============

/// Chat completion backend for OpenAI-compatible APIs.
///
/// Sends the prompt as a single user message to `POST {base_url}/chat/completions`.
///
/// Requests are retried by [`send_with_retry`].
pub struct OpenAiCompletion {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiCompletion {
    /// Build from configuration, reading the key from `OPENAI_API_KEY`.
    pub fn from_env(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompletion {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let url = format!("{}/chat/completions", self.base_url);

        let response = send_with_retry(
            || {
                self.http
                    .post(&url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .json(&body)
            },
            self.max_retries,
            "OpenAI",
        )
        .await?;
        let json: serde_json::Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid completion response: missing choices[0].message.content"))?;
    Ok(content.to_string())
}
