//! Job lifecycle controller.
//!
//! Drives one search job from submission to a terminal state:
//!
//! ```text
//! submit ──▶ ┌─ timeout? ─▶ SearchTimedOut
//!            │  status ───▶ completed ─▶ fetch ─▶ ResultSet
//!            │         └──▶ failed ────▶ SearchFailed
//!            └─ sleep(poll_interval) ◀── running / submitted
//! ```
//!
//! The elapsed-time check happens at loop entry, before each status query,
//! so a job the backend already finished is never reported as timed out
//! because the last poll was slow. The interval is fixed; there is no
//! backoff and no retry. A [`CancellationToken`] is checked at every
//! iteration and raced against every sleep.

use std::sync::Arc;
use std::time::Duration;

use catchall_core::backend::JobBackend;
use catchall_core::error::{CatchAllError, Result};
use catchall_core::models::{Job, JobState, JobStatus, ResultSet};
use catchall_core::query::Query;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::progress::{NoProgress, PollProgressEvent, PollProgressReporter};

/// Poll cadence and deadline for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl PollSettings {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }
}

pub struct JobController {
    jobs: Arc<dyn JobBackend>,
    settings: PollSettings,
    progress: Arc<dyn PollProgressReporter>,
}

impl JobController {
    pub fn new(jobs: Arc<dyn JobBackend>, settings: PollSettings) -> Self {
        Self {
            jobs,
            settings,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn PollProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Submit `query` once and poll until the job completes, fails, times
    /// out, or `cancel` fires.
    ///
    /// # Errors
    ///
    /// - [`CatchAllError::SearchFailed`] when the backend reports failure.
    /// - [`CatchAllError::SearchTimedOut`] when `max_wait` elapses first.
    /// - [`CatchAllError::Cancelled`] when `cancel` fires.
    /// - [`CatchAllError::CancelledBeforeSubmit`] when `cancel` had already
    ///   fired; nothing is submitted.
    /// - [`CatchAllError::Backend`] for submit/status/fetch faults.
    pub async fn run_search(&self, query: &Query, cancel: &CancellationToken) -> Result<ResultSet> {
        if cancel.is_cancelled() {
            return Err(CatchAllError::CancelledBeforeSubmit);
        }
        tracing::info!(query = query.text(), "submitting search job");
        let job_id = self
            .jobs
            .submit(query.text())
            .await
            .map_err(CatchAllError::Backend)?;
        tracing::info!(job_id = %job_id, "job submitted");

        let mut job = Job::submitted(job_id.clone());
        self.progress.report(PollProgressEvent::Submitted {
            job_id: job_id.clone(),
            query: query.text().to_string(),
        });

        let started = Instant::now();
        loop {
            let elapsed = started.elapsed();
            if cancel.is_cancelled() {
                self.finish(&mut job, JobState::Cancelled, elapsed);
                return Err(CatchAllError::Cancelled { job_id });
            }
            if elapsed >= self.settings.max_wait {
                self.finish(&mut job, JobState::TimedOut, elapsed);
                tracing::warn!(job_id = %job_id, waited_secs = elapsed.as_secs(), "job timed out");
                return Err(CatchAllError::SearchTimedOut {
                    job_id,
                    waited: elapsed,
                });
            }

            let status = match self.jobs.status(&job_id).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "status check failed");
                    self.finish(&mut job, JobState::Failed, started.elapsed());
                    return Err(CatchAllError::Backend(e));
                }
            };
            job.advance(JobState::Polling);
            tracing::debug!(job_id = %job_id, status = %status, "polled job status");
            self.progress.report(PollProgressEvent::Polling {
                job_id: job_id.clone(),
                status,
                elapsed: started.elapsed(),
            });

            match status {
                JobStatus::Completed => {
                    self.finish(&mut job, JobState::Completed, started.elapsed());
                    tracing::info!(job_id = %job_id, "retrieving results");
                    return self.jobs.fetch(&job_id).await.map_err(CatchAllError::Backend);
                }
                JobStatus::Failed => {
                    self.finish(&mut job, JobState::Failed, started.elapsed());
                    tracing::warn!(job_id = %job_id, "backend reported job failure");
                    return Err(CatchAllError::SearchFailed { job_id });
                }
                JobStatus::Submitted | JobStatus::Running => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.finish(&mut job, JobState::Cancelled, started.elapsed());
                    return Err(CatchAllError::Cancelled { job_id });
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }

    fn finish(&self, job: &mut Job, state: JobState, elapsed: Duration) {
        if job.advance(state) {
            self.progress.report(PollProgressEvent::Finished {
                job_id: job.id().to_string(),
                state,
                elapsed,
            });
        }
    }
}
