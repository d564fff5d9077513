//! The two public operations: **search** and **analyze**.
//!
//! ```text
//! search(raw) ──▶ QueryNormalizer ──▶ JobController ──▶ ResultStore.set ──▶ summary
//! analyze(q)  ──▶ ResultStore.get ──(empty)──▶ NoCachedData message
//!                                └─(cached)─▶ AnalysisDispatcher ──▶ answer
//! ```
//!
//! Each [`Orchestrator`] owns its own [`ResultStore`], so independent
//! sessions never share a cache. At most one search runs per orchestrator;
//! a concurrent `search` call is turned away without submitting a job.
//! `analyze` may run while a search is in flight and sees the previous
//! complete result.
//!
//! # Outcomes
//!
//! | Condition | `search` | `analyze` |
//! |-----------|----------|-----------|
//! | success | `Ok(summary)`, cache replaced | `Ok(answer)` |
//! | empty result | `Ok("No results found …")`, cache kept* | n/a |
//! | backend reported failure | `Ok("Search failed for job …")`, cache kept* | n/a |
//! | nothing cached | n/a | `Ok(NoCachedData message)` |
//! | timeout / cancellation / transport fault | `Err` | `Err` (completion fault) |
//! | after [`Orchestrator::cancel`] | `Err(CancelledBeforeSubmit)`, nothing submitted | unaffected |
//!
//! \* unless `retain_cache_on_unsuccessful` is off, in which case the cache is cleared.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result as AnyResult;
use catchall_core::analysis::{AnalysisDispatcher, DEFAULT_MAX_CONTEXT_CHARS};
use catchall_core::backend::{CompletionBackend, JobBackend};
use catchall_core::error::{CatchAllError, Result};
use catchall_core::format::{format_search_summary, no_results_message};
use catchall_core::models::CachedResult;
use catchall_core::query::{QueryNormalizer, QueryOrigin};
use catchall_core::store::ResultStore;
use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::client::CatchAllClient;
use crate::config::Config;
use crate::lifecycle::{JobController, PollSettings};
use crate::llm::create_completion;
use crate::progress::{NoProgress, PollProgressReporter, ProgressMode};

/// Message returned when a search is requested while another is running.
pub const SEARCH_IN_PROGRESS: &str =
    "A search is already running. Use 'catchall_analyze_news' on the current data or wait for it to finish.";

/// Construction-time settings for an [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_results: usize,
    pub default_date_range_days: u32,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub analysis_cap: usize,
    pub max_context_chars: usize,
    /// Keep the previous cache when a search comes back empty or the
    /// backend reports failure.
    pub retain_cache_on_unsuccessful: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_results: 100,
            default_date_range_days: 14,
            poll_interval: Duration::from_secs(30),
            max_wait: Duration::from_secs(1800),
            analysis_cap: 100,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            retain_cache_on_unsuccessful: true,
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_results: config.results.max_results,
            default_date_range_days: config.results.default_date_range_days,
            poll_interval: config.catchall.poll_interval(),
            max_wait: config.catchall.max_wait(),
            analysis_cap: config.results.effective_analysis_cap(),
            max_context_chars: config.results.max_context_chars,
            retain_cache_on_unsuccessful: config.results.retain_cache_on_unsuccessful,
        }
    }
}

pub struct Orchestrator {
    completion: Arc<dyn CompletionBackend>,
    normalizer: QueryNormalizer,
    controller: JobController,
    dispatcher: AnalysisDispatcher,
    store: ResultStore,
    settings: Settings,
    search_gate: Mutex<()>,
    shutdown: CancellationToken,
    today: Option<NaiveDate>,
}

impl Orchestrator {
    pub fn new(
        jobs: Arc<dyn JobBackend>,
        completion: Arc<dyn CompletionBackend>,
        settings: Settings,
    ) -> Self {
        let controller = JobController::new(
            jobs,
            PollSettings::new(settings.poll_interval, settings.max_wait),
        );
        let dispatcher = AnalysisDispatcher::new(settings.analysis_cap)
            .with_max_context_chars(settings.max_context_chars);
        Self {
            completion,
            normalizer: QueryNormalizer::new(settings.default_date_range_days),
            controller,
            dispatcher,
            store: ResultStore::new(),
            settings,
            search_gate: Mutex::new(()),
            shutdown: CancellationToken::new(),
            today: None,
        }
    }

    /// Wire the HTTP job backend and completion backend from configuration.
    ///
    /// Progress goes to `progress` when `output.verbose` is on.
    pub fn from_config(config: &Config, progress: ProgressMode) -> AnyResult<Self> {
        let jobs = Arc::new(CatchAllClient::from_config(&config.catchall)?);
        let completion = create_completion(&config.llm)?;
        let settings = Settings::from_config(config);
        let reporter: Arc<dyn PollProgressReporter> = if config.output.verbose {
            Arc::from(progress.reporter())
        } else {
            Arc::new(NoProgress)
        };
        Ok(Self::new(jobs, completion, settings).with_progress(reporter))
    }

    pub fn with_progress(mut self, progress: Arc<dyn PollProgressReporter>) -> Self {
        self.controller = self.controller.with_progress(progress);
        self
    }

    /// Pin "today" for query normalization instead of the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Cancel any in-flight search. Later searches are refused with
    /// [`CatchAllError::CancelledBeforeSubmit`] before any backend is called.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Start a new search for `raw_query` and cache its results.
    pub async fn search(&self, raw_query: &str) -> Result<String> {
        if self.shutdown.is_cancelled() {
            tracing::warn!("search requested after cancellation");
            return Err(CatchAllError::CancelledBeforeSubmit);
        }
        let Ok(_gate) = self.search_gate.try_lock() else {
            tracing::warn!("search requested while another search is running");
            return Ok(SEARCH_IN_PROGRESS.to_string());
        };

        let query = self
            .normalizer
            .normalize(raw_query, self.today(), self.completion.as_ref())
            .await?;
        if query.origin() == QueryOrigin::Synthesized {
            tracing::warn!(
                query = query.text(),
                "query rewrite was malformed, using synthesized query"
            );
        }
        tracing::info!(query = query.text(), "starting new search");

        let cancel = self.shutdown.child_token();
        let results = match self.controller.run_search(&query, &cancel).await {
            Ok(results) => results,
            Err(CatchAllError::SearchFailed { job_id }) => {
                self.drop_stale_cache();
                return Ok(CatchAllError::SearchFailed { job_id }.to_string());
            }
            Err(e) => return Err(e),
        };

        if results.is_empty() {
            tracing::info!(job_id = %results.job_id, "search returned no records");
            self.drop_stale_cache();
            return Ok(no_results_message(raw_query));
        }

        let results = results.capped(self.settings.max_results);
        tracing::info!(
            cached = results.len(),
            total = results.total_found,
            "cached search results"
        );
        let summary = format_search_summary(&results);
        self.store.set(CachedResult::new(query.into_text(), results));
        Ok(summary)
    }

    /// Answer `question` against the cached results.
    pub async fn analyze(&self, question: &str) -> Result<String> {
        tracing::info!(question, "analyzing cache");
        let Some(cached) = self.store.get() else {
            return Ok(CatchAllError::NoCachedData.to_string());
        };
        self.dispatcher
            .analyze(&cached.results, question, self.completion.as_ref())
            .await
    }

    fn drop_stale_cache(&self) {
        if !self.settings.retain_cache_on_unsuccessful && self.store.clear().is_some() {
            tracing::info!("cleared previous results");
        }
    }
}
