//! TOML configuration.
//!
//! Every section is optional; missing keys take the defaults below. API
//! credentials may live in the file or in the environment
//! (`CATCHALL_API_KEY`, `OPENAI_API_KEY`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use catchall_core::analysis::DEFAULT_MAX_CONTEXT_CHARS;

pub const DEFAULT_CATCHALL_URL: &str = "https://catchall.newscatcherapi.com";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catchall: CatchAllConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub results: ResultsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatchAllConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_catchall_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_catchall_retries")]
    pub max_retries: u32,
}

impl Default for CatchAllConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_catchall_url(),
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
            page_size: default_page_size(),
            timeout_secs: default_http_timeout_secs(),
            max_retries: default_catchall_retries(),
        }
    }
}

fn default_catchall_url() -> String {
    DEFAULT_CATCHALL_URL.to_string()
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_max_wait_secs() -> u64 {
    1800
}
fn default_page_size() -> u32 {
    100
}
fn default_http_timeout_secs() -> u64 {
    30
}
fn default_catchall_retries() -> u32 {
    3
}

impl CatchAllConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    /// The configured key, falling back to `CATCHALL_API_KEY`.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        std::env::var("CATCHALL_API_KEY").map_err(|_| {
            anyhow::anyhow!("catchall.api_key not set and CATCHALL_API_KEY environment variable not set")
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_openai_url")]
    pub base_url: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            base_url: default_openai_url(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_llm_retries(),
        }
    }
}

fn default_llm_provider() -> String {
    "openai".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_openai_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_llm_retries() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResultsConfig {
    /// Records kept from each search and listed in its summary.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Window used when a request names no dates.
    #[serde(default = "default_date_range_days")]
    pub default_date_range_days: u32,
    /// Records handed to analysis. Defaults to `max_results`.
    #[serde(default)]
    pub analysis_cap: Option<usize>,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    /// Keep the previous cache when a later search is unsuccessful: it
    /// comes back empty or the backend reports the job as failed.
    #[serde(default = "default_true")]
    pub retain_cache_on_unsuccessful: bool,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            default_date_range_days: default_date_range_days(),
            analysis_cap: None,
            max_context_chars: default_max_context_chars(),
            retain_cache_on_unsuccessful: true,
        }
    }
}

fn default_max_results() -> usize {
    100
}
fn default_date_range_days() -> u32 {
    14
}
fn default_max_context_chars() -> usize {
    DEFAULT_MAX_CONTEXT_CHARS
}
fn default_true() -> bool {
    true
}

impl ResultsConfig {
    pub fn effective_analysis_cap(&self) -> usize {
        self.analysis_cap.unwrap_or(self.max_results)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Report poll progress and log at `info`.
    #[serde(default = "default_true")]
    pub verbose: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { verbose: true }
    }
}

impl Config {
    /// All defaults; credentials come from the environment.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields [`Config::minimal`].
pub fn load_config_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate catchall
    if config.catchall.poll_interval_secs == 0 {
        anyhow::bail!("catchall.poll_interval_secs must be > 0");
    }
    if config.catchall.max_wait_secs == 0 {
        anyhow::bail!("catchall.max_wait_secs must be > 0");
    }
    if config.catchall.page_size == 0 {
        anyhow::bail!("catchall.page_size must be > 0");
    }
    if !config.catchall.base_url.starts_with("http") {
        anyhow::bail!(
            "catchall.base_url must be an http(s) URL, got '{}'",
            config.catchall.base_url
        );
    }

    // Validate results
    if config.results.max_results == 0 {
        anyhow::bail!("results.max_results must be >= 1");
    }
    if config.results.analysis_cap == Some(0) {
        anyhow::bail!("results.analysis_cap must be >= 1");
    }
    if config.results.max_context_chars == 0 {
        anyhow::bail!("results.max_context_chars must be > 0");
    }

    // Validate llm
    match config.llm.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        anyhow::bail!("llm.temperature must be in [0.0, 2.0]");
    }

    Ok(())
}
