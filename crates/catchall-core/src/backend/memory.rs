//! Scripted in-memory collaborators for tests and offline runs.
//!
//! [`ScriptedJobBackend`] replays a fixed status sequence for every job it
//! creates; [`CannedCompletion`] answers prompts from a queue and records
//! each prompt it saw. Both count calls so tests can assert on interaction.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use super::{CompletionBackend, JobBackend};
use crate::models::{JobStatus, Record, ResultSet};

struct ScriptedJob {
    query: String,
    remaining: VecDeque<JobStatus>,
    last: JobStatus,
}

/// A job backend that replays `statuses` for every submitted job.
///
/// Once the script is exhausted the last status repeats, so a script ending
/// in `Completed` stays completed no matter how often it is polled.
pub struct ScriptedJobBackend {
    statuses: Vec<JobStatus>,
    records: Vec<Record>,
    total_found: Option<u64>,
    jobs: Mutex<HashMap<String, ScriptedJob>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl ScriptedJobBackend {
    pub fn new(statuses: Vec<JobStatus>, records: Vec<Record>) -> Self {
        Self {
            statuses,
            records,
            total_found: None,
            jobs: Mutex::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// `n` reports of `Running` followed by `Completed`.
    pub fn completing_after(n: usize, records: Vec<Record>) -> Self {
        let mut statuses = vec![JobStatus::Running; n];
        statuses.push(JobStatus::Completed);
        Self::new(statuses, records)
    }

    /// Override the backend-wide match count (defaults to the record count).
    pub fn with_total_found(mut self, total: u64) -> Self {
        self.total_found = Some(total);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Queries submitted so far, unordered.
    pub fn submitted_queries(&self) -> Vec<String> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.values().map(|j| j.query.clone()).collect()
    }
}

#[async_trait]
impl JobBackend for ScriptedJobBackend {
    async fn submit(&self, query: &str) -> Result<String> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::new_v4().to_string();
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.insert(
            id.clone(),
            ScriptedJob {
                query: query.to_string(),
                remaining: self.statuses.iter().copied().collect(),
                last: JobStatus::Submitted,
            },
        );
        Ok(id)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let Some(job) = jobs.get_mut(job_id) else {
            bail!("job not found: {}", job_id);
        };
        if let Some(next) = job.remaining.pop_front() {
            job.last = next;
        }
        Ok(job.last)
    }

    async fn fetch(&self, job_id: &str) -> Result<ResultSet> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let Some(job) = jobs.get(job_id) else {
            bail!("job not found: {}", job_id);
        };
        if job.last != JobStatus::Completed {
            bail!("job {} is not completed (status: {})", job_id, job.last);
        }
        let total = self.total_found.unwrap_or(self.records.len() as u64);
        Ok(ResultSet::new(job_id, self.records.clone(), total))
    }
}

/// A completion backend that answers from a queue of canned replies.
///
/// When the queue is empty the fallback reply is returned.
pub struct CannedCompletion {
    replies: Mutex<VecDeque<String>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl CannedCompletion {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: fallback.into(),
            prompts: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// A backend whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new("")
        }
    }

    /// Queue a reply to be returned before the fallback.
    pub fn then(self, reply: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CompletionBackend for CannedCompletion {
    fn model_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        if let Some(message) = &self.fail_with {
            bail!("{}", message);
        }
        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_backend_replays_then_sticks() {
        let backend = ScriptedJobBackend::completing_after(2, vec![Record::new("a")]);
        let id = backend.submit("q").await.unwrap();
        assert_eq!(backend.status(&id).await.unwrap(), JobStatus::Running);
        assert_eq!(backend.status(&id).await.unwrap(), JobStatus::Running);
        assert_eq!(backend.status(&id).await.unwrap(), JobStatus::Completed);
        assert_eq!(backend.status(&id).await.unwrap(), JobStatus::Completed);
        assert_eq!(backend.status_calls(), 4);
    }

    #[tokio::test]
    async fn fetch_before_completion_is_an_error() {
        let backend = ScriptedJobBackend::completing_after(1, vec![]);
        let id = backend.submit("q").await.unwrap();
        assert!(backend.fetch(&id).await.is_err());
    }

    #[tokio::test]
    async fn repeated_status_does_not_change_fetch() {
        let backend = ScriptedJobBackend::completing_after(0, vec![Record::new("a")]);
        let id = backend.submit("q").await.unwrap();
        backend.status(&id).await.unwrap();
        let first = backend.fetch(&id).await.unwrap();
        for _ in 0..5 {
            backend.status(&id).await.unwrap();
        }
        let second = backend.fetch(&id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn canned_completion_queue_then_fallback() {
        let llm = CannedCompletion::new("fallback").then("first");
        assert_eq!(llm.complete("p1").await.unwrap(), "first");
        assert_eq!(llm.complete("p2").await.unwrap(), "fallback");
        assert_eq!(llm.prompts(), vec!["p1".to_string(), "p2".to_string()]);
    }
}
