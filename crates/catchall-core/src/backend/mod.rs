//! Collaborator boundaries.
//!
//! The core depends on exactly two external services:
//!
//! - a **job backend** that accepts a query, reports job status, and returns
//!   the materialized results once the job completes;
//! - a **completion backend** that turns a prompt into natural-language text.
//!
//! Both are consumed through `async-trait` objects so the HTTP
//! implementations in `catchall-harness` and the scripted fakes in
//! [`memory`] are interchangeable. Faults are plain `anyhow` errors; the
//! lifecycle controller decides how they surface.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{JobStatus, ResultSet};

/// Asynchronous search job service.
///
/// # Contract
///
/// - [`submit`](JobBackend::submit) creates one job per call and returns its
///   opaque id.
/// - [`status`](JobBackend::status) is side-effect free and may be called any
///   number of times.
/// - [`fetch`](JobBackend::fetch) is only valid after `status` reported
///   [`JobStatus::Completed`]; repeated calls return the same result set.
#[async_trait]
pub trait JobBackend: Send + Sync {
    async fn submit(&self, query: &str) -> Result<String>;

    async fn status(&self, job_id: &str) -> Result<JobStatus>;

    async fn fetch(&self, job_id: &str) -> Result<ResultSet>;
}

/// Natural-language completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Complete a single prompt. No streaming.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
