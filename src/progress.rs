//! Poll progress reporting.
//!
//! The lifecycle controller emits one event per poll tick so a host can show
//! which job is running, what the backend says, and how long it has been.
//! Reporters must not block: the controller calls them inline between
//! status checks. Human and JSON output go to **stderr** so stdout stays
//! reserved for search summaries and analysis answers.

use std::io::Write;
use std::time::Duration;

use catchall_core::models::{JobState, JobStatus};
use tokio::sync::mpsc;

/// A single progress event for one search job.
#[derive(Clone, Debug, PartialEq)]
pub enum PollProgressEvent {
    /// The backend accepted the query.
    Submitted { job_id: String, query: String },
    /// One status check completed.
    Polling {
        job_id: String,
        status: JobStatus,
        elapsed: Duration,
    },
    /// The job reached a terminal state.
    Finished {
        job_id: String,
        state: JobState,
        elapsed: Duration,
    },
}

/// Receives poll progress. Implementations must return promptly.
pub trait PollProgressReporter: Send + Sync {
    fn report(&self, event: PollProgressEvent);
}

/// Human-friendly progress on stderr.
///
/// Poll ticks rewrite the same line in place:
/// `[CatchAll] Search performing: <job>, Status: running, Time: 60s`.
pub struct StderrProgress;

impl PollProgressReporter for StderrProgress {
    fn report(&self, event: PollProgressEvent) {
        let line = match &event {
            PollProgressEvent::Submitted { job_id, query } => {
                format!("[CatchAll] Job submitted. Job ID: {} ({})\n", job_id, query)
            }
            PollProgressEvent::Polling {
                job_id,
                status,
                elapsed,
            } => format!(
                "\r[CatchAll] Search performing: {}, Status: {}, Time: {}s",
                job_id,
                status,
                elapsed.as_secs()
            ),
            // Terminates the in-place line.
            PollProgressEvent::Finished { .. } => "\n".to_string(),
        };
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl PollProgressReporter for JsonProgress {
    fn report(&self, event: PollProgressEvent) {
        let obj = match &event {
            PollProgressEvent::Submitted { job_id, query } => serde_json::json!({
                "event": "submitted",
                "job_id": job_id,
                "query": query
            }),
            PollProgressEvent::Polling {
                job_id,
                status,
                elapsed,
            } => serde_json::json!({
                "event": "progress",
                "job_id": job_id,
                "status": status.as_str(),
                "elapsed_secs": elapsed.as_secs()
            }),
            PollProgressEvent::Finished {
                job_id,
                state,
                elapsed,
            } => serde_json::json!({
                "event": "finished",
                "job_id": job_id,
                "state": state.as_str(),
                "elapsed_secs": elapsed.as_secs()
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

/// Forwards events to an unbounded channel so the host decides what to do
/// with them. Send failures (receiver dropped) are ignored.
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<PollProgressEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PollProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PollProgressReporter for ChannelProgress {
    fn report(&self, event: PollProgressEvent) {
        let _ = self.tx.send(event);
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl PollProgressReporter for NoProgress {
    fn report(&self, _event: PollProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse `off`, `human`, `json`, or `auto`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            "auto" => Some(Self::default_for_tty()),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn PollProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
