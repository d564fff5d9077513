//! Analysis dispatch over the cached result set.
//!
//! Filtering, sorting, grouping, counting and open-ended questions all take
//! the same path: the cached records are serialized into a bounded context
//! block and a single completion call answers the question against it.
//! Nothing here re-fetches, re-polls, or writes to the result store.
//!
//! # Context Budget
//!
//! At most `cap` records are considered, in backend order. Each record is
//! one compact JSON line. Lines are appended until the next one would push
//! the block past `max_context_chars`; the first record is always included
//! so a single oversized record still yields an answer. The prompt tells
//! the model how many records were left out.

use serde_json::{json, Map, Value};

use crate::backend::CompletionBackend;
use crate::error::{CatchAllError, Result};
use crate::models::{Record, ResultSet, TITLE_KEY};
use crate::prompts::analysis_prompt;

/// Default upper bound on the serialized record block, in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 60_000;

/// The serialized records handed to the completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisContext {
    pub text: String,
    /// Records serialized into `text`.
    pub included: usize,
    /// Cached records that did not make it into `text`.
    pub omitted: usize,
}

#[derive(Debug, Clone)]
pub struct AnalysisDispatcher {
    cap: usize,
    max_context_chars: usize,
}

impl AnalysisDispatcher {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn build_context(&self, results: &ResultSet) -> AnalysisContext {
        let mut text = String::new();
        let mut included = 0;

        for record in results.records.iter().take(self.cap) {
            let line = record_line(record);
            let needed = if text.is_empty() {
                line.len()
            } else {
                text.len() + 1 + line.len()
            };
            if included > 0 && needed > self.max_context_chars {
                break;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&line);
            included += 1;
        }

        AnalysisContext {
            text,
            included,
            omitted: results.len() - included,
        }
    }

    /// Answer `question` against `results` with one completion call.
    ///
    /// The answer is returned verbatim apart from surrounding whitespace.
    pub async fn analyze(
        &self,
        results: &ResultSet,
        question: &str,
        completion: &dyn CompletionBackend,
    ) -> Result<String> {
        let context = self.build_context(results);
        let prompt = analysis_prompt(
            question.trim(),
            &context.text,
            context.included,
            context.omitted,
            results.total_found,
        );
        let answer = completion
            .complete(&prompt)
            .await
            .map_err(CatchAllError::Completion)?;
        Ok(answer.trim().to_string())
    }
}

fn record_line(record: &Record) -> String {
    let enrichment: Map<String, Value> = record
        .enrichment
        .iter()
        .filter(|(k, _)| k.as_str() != TITLE_KEY)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    json!({ "title": record.title, "enrichment": enrichment }).to_string()
}
