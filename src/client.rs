//! CatchAll HTTP job backend.
//!
//! Implements [`JobBackend`] against the CatchAll REST API:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `POST` | `/catchAll/submit` | Create a job for a query, returns `job_id` |
//! | `GET`  | `/catchAll/status/{job_id}` | Current job status |
//! | `GET`  | `/catchAll/pull/{job_id}?page=&page_size=` | One page of results |
//!
//! All requests carry the API key in the `x-api-key` header.
//!
//! # Retry Strategy
//!
//! Status and pull requests are idempotent and go through
//! [`send_with_retry`]. Submission creates a job and is never retried.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use catchall_core::backend::JobBackend;
use catchall_core::models::{JobStatus, Record, ResultSet, TITLE_KEY};
use serde::Deserialize;
use serde_json::Value;

use crate::config::CatchAllConfig;
use crate::http::send_with_retry;

pub struct CatchAllClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    max_retries: u32,
}

impl CatchAllClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured or in the environment.
    pub fn from_config(config: &CatchAllConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Self::new(&config.base_url, api_key, config)
    }

    pub fn new(base_url: &str, api_key: impl Into<String>, config: &CatchAllConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            page_size: config.page_size,
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with retry/backoff, returning the parsed JSON body.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = send_with_retry(
            || {
                self.http
                    .get(url)
                    .header("x-api-key", &self.api_key)
                    .query(query)
            },
            self.max_retries,
            "CatchAll",
        )
        .await?;
        Ok(response.json().await?)
    }

    /// Fetch one page of results.
    async fn pull_page(&self, job_id: &str, page: u32) -> Result<PullPage> {
        let json = self
            .get_json(
                &self.url(&format!("/catchAll/pull/{}", job_id)),
                &[
                    ("page", page.to_string()),
                    ("page_size", self.page_size.to_string()),
                ],
            )
            .await?;
        serde_json::from_value(json).with_context(|| format!("Malformed pull response for job {}", job_id))
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Deserialize)]
struct PullPage {
    #[serde(default)]
    valid_records: Option<u64>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    all_records: Vec<WireRecord>,
}

#[derive(Deserialize)]
struct WireRecord {
    #[serde(default)]
    record_title: Option<String>,
    #[serde(default)]
    enrichment: serde_json::Map<String, Value>,
}

impl WireRecord {
    fn into_record(self) -> Record {
        let title = self
            .record_title
            .or_else(|| {
                self.enrichment
                    .get(TITLE_KEY)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "(untitled)".to_string());
        Record {
            title,
            enrichment: self.enrichment.into_iter().collect(),
        }
    }
}

#[async_trait]
impl JobBackend for CatchAllClient {
    async fn submit(&self, query: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/catchAll/submit"))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .context("Failed to reach CatchAll")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("CatchAll submit failed {}: {}", status, body_text);
        }

        let body: SubmitResponse = response
            .json()
            .await
            .context("Malformed submit response")?;
        Ok(body.job_id)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let json = self
            .get_json(&self.url(&format!("/catchAll/status/{}", job_id)), &[])
            .await?;
        let body: StatusResponse = serde_json::from_value(json)
            .with_context(|| format!("Malformed status response for job {}", job_id))?;
        Ok(JobStatus::from_wire(&body.status))
    }

    /// Pull every page, preserving backend order across pages.
    async fn fetch(&self, job_id: &str) -> Result<ResultSet> {
        let mut records = Vec::new();
        let mut total_found = None;
        let mut page = 1;

        loop {
            let body = self.pull_page(job_id, page).await?;
            if total_found.is_none() {
                total_found = body.valid_records;
            }
            let fetched = body.all_records.len();
            records.extend(body.all_records.into_iter().map(WireRecord::into_record));

            let total_pages = body.total_pages.unwrap_or(page);
            if page >= total_pages || fetched == 0 {
                break;
            }
            page += 1;
        }

        let total = total_found.unwrap_or(records.len() as u64);
        tracing::debug!(job_id, records = records.len(), total, "pulled results");
        Ok(ResultSet::new(job_id, records, total))
    }
}
