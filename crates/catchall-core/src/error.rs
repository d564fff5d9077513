//! Domain error taxonomy.
//!
//! The `Display` text of each variant is the user-facing message. The
//! orchestrator turns `SearchFailed` and `NoCachedData` into return values;
//! the rest reach the caller as errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatchAllError {
    /// The backend explicitly reported a failed job. Not retried.
    #[error("Search failed for job {job_id}")]
    SearchFailed { job_id: String },

    /// `max_wait` elapsed before the job reached a terminal state.
    #[error("Job {job_id} timed out after {}s", .waited.as_secs())]
    SearchTimedOut { job_id: String, waited: Duration },

    /// The poll loop was interrupted by a cancellation request.
    #[error("Search for job {job_id} was cancelled")]
    Cancelled { job_id: String },

    /// Cancellation was requested before any job was submitted.
    #[error("Search was cancelled before a job was submitted")]
    CancelledBeforeSubmit,

    /// Analysis was requested before any successful search.
    #[error(
        "ERROR: No news data available to analyze yet. \
         Please call 'catchall_search_news' first to find articles."
    )]
    NoCachedData,

    /// The job backend failed (transport, auth, malformed response).
    #[error("job backend error: {0}")]
    Backend(#[source] anyhow::Error),

    /// The completion backend failed.
    #[error("completion backend error: {0}")]
    Completion(#[source] anyhow::Error),
}

impl CatchAllError {
    /// Machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CatchAllError::SearchFailed { .. } => "search_failed",
            CatchAllError::SearchTimedOut { .. } => "timeout",
            CatchAllError::Cancelled { .. } | CatchAllError::CancelledBeforeSubmit => "cancelled",
            CatchAllError::NoCachedData => "no_cached_data",
            CatchAllError::Backend(_) => "backend_error",
            CatchAllError::Completion(_) => "completion_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, CatchAllError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_reference_job_id() {
        let err = CatchAllError::SearchFailed {
            job_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Search failed for job abc");

        let err = CatchAllError::SearchTimedOut {
            job_id: "abc".to_string(),
            waited: Duration::from_secs(1800),
        };
        assert_eq!(err.to_string(), "Job abc timed out after 1800s");
        assert_eq!(err.code(), "timeout");
    }

    #[test]
    fn no_cached_data_points_at_search_tool() {
        let msg = CatchAllError::NoCachedData.to_string();
        assert!(msg.starts_with("ERROR: No news data"));
        assert!(msg.contains("catchall_search_news"));
    }
}
