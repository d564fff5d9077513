//! Core data models used throughout CatchAll Harness.
//!
//! These types represent the records a search job produces, the job's
//! lifecycle, and the cached result that gates analysis.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Enrichment key carrying a duplicate of the title; never shown as a detail.
pub const TITLE_KEY: &str = "record_title";

/// A single record found by the backend.
///
/// Enrichment values are backend-defined; keys are unique and their order is
/// not meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    #[serde(default)]
    pub enrichment: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            enrichment: BTreeMap::new(),
        }
    }

    /// Builder-style helper for attaching an enrichment value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.enrichment.insert(key.into(), value.into());
        self
    }

    /// Enrichment pairs for display, excluding the duplicated title key.
    ///
    /// String values are rendered without JSON quotes.
    pub fn details(&self) -> Vec<(&str, String)> {
        self.enrichment
            .iter()
            .filter(|(k, _)| k.as_str() != TITLE_KEY)
            .map(|(k, v)| (k.as_str(), display_value(v)))
            .collect()
    }
}

pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// The materialized output of a completed job.
///
/// `records` keeps backend order (relevance/recency) and is never re-sorted.
/// `total_found` is the backend's full match count and may exceed
/// `records.len()` once a cap has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub job_id: String,
    pub records: Vec<Record>,
    pub total_found: u64,
    /// Materialization cap applied via [`ResultSet::capped`], if any.
    #[serde(default)]
    pub cap: Option<usize>,
}

impl ResultSet {
    pub fn new(job_id: impl Into<String>, records: Vec<Record>, total_found: u64) -> Self {
        Self {
            job_id: job_id.into(),
            records,
            total_found,
            cap: None,
        }
    }

    /// Keep only the first `cap` records. `total_found` is preserved.
    pub fn capped(mut self, cap: usize) -> Self {
        self.records.truncate(cap);
        self.cap = Some(cap);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Status reported by the job backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Map a backend status string onto the four states the controller
    /// understands. Any in-progress stage name (`analyzing`, `enriching`, …)
    /// is `Running`.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "job_completed" | "completed" => JobStatus::Completed,
            "failed" | "job_failed" => JobStatus::Failed,
            "submitted" | "queued" => JobStatus::Submitted,
            _ => JobStatus::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Submitted,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Submitted | JobState::Polling)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Submitted => "submitted",
            JobState::Polling => "polling",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::TimedOut => "timed_out",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend job tracked for the duration of one search.
///
/// Transitions out of a terminal state are refused.
#[derive(Debug, Clone)]
pub struct Job {
    id: String,
    state: JobState,
}

impl Job {
    pub fn submitted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: JobState::Submitted,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Move to `next`. Returns `false` (leaving the state unchanged) when the
    /// job is already terminal.
    pub fn advance(&mut self, next: JobState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = next;
        true
    }
}

/// The single cached result that gates analysis.
#[derive(Debug, Clone, Serialize)]
pub struct CachedResult {
    /// The query actually submitted to the backend.
    pub query: String,
    pub job_id: String,
    pub cached_at: DateTime<Utc>,
    pub results: ResultSet,
}

impl CachedResult {
    pub fn new(query: impl Into<String>, results: ResultSet) -> Self {
        Self {
            query: query.into(),
            job_id: results.job_id.clone(),
            cached_at: Utc::now(),
            results,
        }
    }
}
