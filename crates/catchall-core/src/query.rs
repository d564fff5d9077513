//! Query normalization.
//!
//! The search backend expects queries of the shape
//! `Find all articles about <topic> between <date1> and <date2>`. A raw
//! request that already has an accepted lead-in phrase and an explicit date
//! range passes through untouched. Anything else is rewritten once by the
//! completion backend.
//!
//! The rewrite is not trusted blindly: it is re-checked against the same
//! well-formedness predicate, and when it still fails (or comes back empty)
//! a deterministic query is synthesized from the raw topic and the default
//! date window. The completion backend is therefore called at most once per
//! request.

use chrono::{Duration, NaiveDate};

use crate::backend::CompletionBackend;
use crate::error::{CatchAllError, Result};
use crate::prompts::rewrite_prompt;

/// Accepted lead-in phrases, lowercase.
pub const LEAD_INS: [&str; 2] = ["find all articles", "search for articles"];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Prefixes removed from a raw request when synthesizing a topic. Longest
/// first so `find all articles about` wins over `find all articles`.
const TOPIC_PREFIXES: [&str; 9] = [
    "search for articles about",
    "find all articles about",
    "find all articles on",
    "search for articles",
    "find all articles",
    "find articles about",
    "articles about",
    "news about",
    "find",
];

/// Does `raw` start (case-insensitively) with an accepted lead-in?
pub fn has_lead_in(raw: &str) -> bool {
    let lower = raw.trim_start().to_lowercase();
    LEAD_INS.iter().any(|p| lower.starts_with(p))
}

/// Does `raw` carry an explicit date range: the word `between` plus either
/// a month name or something that looks like a four-digit year?
pub fn has_date_range(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    if !lower.contains("between") {
        return false;
    }
    MONTHS.iter().any(|m| lower.contains(m)) || contains_year(raw)
}

/// The full well-formedness predicate.
pub fn is_well_formed(raw: &str) -> bool {
    has_lead_in(raw) && has_date_range(raw)
}

fn contains_year(raw: &str) -> bool {
    raw.as_bytes().windows(4).any(|w| {
        w.iter().all(u8::is_ascii_digit) && (w.starts_with(b"19") || w.starts_with(b"20"))
    })
}

/// Strip surrounding whitespace and quote characters from a completion.
pub fn strip_quotes(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}' | '`'))
        .trim()
        .to_string()
}

/// How a [`Query`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrigin {
    /// The raw request was already well-formed.
    PassThrough,
    /// The completion backend's rewrite passed validation.
    Rewritten,
    /// Built from the raw topic and the default window.
    Synthesized,
}

/// A query ready for submission. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    has_lead_in: bool,
    has_date_range: bool,
    origin: QueryOrigin,
}

impl Query {
    fn new(text: String, origin: QueryOrigin) -> Self {
        Self {
            has_lead_in: has_lead_in(&text),
            has_date_range: has_date_range(&text),
            text,
            origin,
        }
    }

    /// Wrap an arbitrary string without normalization. Flags are still
    /// computed.
    pub fn verbatim(text: impl Into<String>) -> Self {
        Self::new(text.into(), QueryOrigin::PassThrough)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_lead_in(&self) -> bool {
        self.has_lead_in
    }

    pub fn has_date_range(&self) -> bool {
        self.has_date_range
    }

    pub fn is_well_formed(&self) -> bool {
        self.has_lead_in && self.has_date_range
    }

    pub fn origin(&self) -> QueryOrigin {
        self.origin
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Turns raw user requests into backend queries.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    default_window_days: u32,
}

impl QueryNormalizer {
    pub fn new(default_window_days: u32) -> Self {
        Self {
            default_window_days,
        }
    }

    /// Normalize `raw` relative to `today`.
    ///
    /// # Errors
    ///
    /// Only a completion backend fault is an error
    /// ([`CatchAllError::Completion`]). A malformed or empty rewrite falls
    /// back to [`synthesize`](Self::synthesize).
    pub async fn normalize(
        &self,
        raw: &str,
        today: NaiveDate,
        completion: &dyn CompletionBackend,
    ) -> Result<Query> {
        if is_well_formed(raw) {
            return Ok(Query::new(raw.to_string(), QueryOrigin::PassThrough));
        }

        let prompt = rewrite_prompt(
            raw.trim(),
            &today.format("%B %d, %Y").to_string(),
            self.default_window_days,
        );
        let reply = completion
            .complete(&prompt)
            .await
            .map_err(CatchAllError::Completion)?;

        let rewritten = strip_quotes(&reply);
        if is_well_formed(&rewritten) {
            Ok(Query::new(rewritten, QueryOrigin::Rewritten))
        } else {
            Ok(self.synthesize(raw, today))
        }
    }

    /// Build `Find all articles about <topic> between <start> and <today>`
    /// with the default window, without consulting any backend.
    pub fn synthesize(&self, raw: &str, today: NaiveDate) -> Query {
        let start = today - Duration::days(i64::from(self.default_window_days));
        let text = format!(
            "Find all articles about {} between {} and {}",
            topic_of(raw),
            start.format("%B %-d, %Y"),
            today.format("%B %-d, %Y"),
        );
        Query::new(text, QueryOrigin::Synthesized)
    }
}

/// Extract the subject of a free-text request by dropping a leading
/// request phrase and trailing punctuation.
fn topic_of(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let mut topic = trimmed;
    for prefix in TOPIC_PREFIXES {
        if lower.starts_with(prefix)
            && lower[prefix.len()..]
                .chars()
                .next()
                .map_or(true, |c| c.is_whitespace())
        {
            topic = trimmed[prefix.len()..].trim_start();
            break;
        }
    }
    let topic = topic.trim_end_matches(['?', '.', '!', ' ']);
    if topic.is_empty() {
        "recent news".to_string()
    } else {
        topic.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::CannedCompletion;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn predicate_requires_both_parts() {
        assert!(is_well_formed(
            "Find all articles about AI layoffs between October 1 and October 16, 2026"
        ));
        assert!(is_well_formed(
            "SEARCH FOR ARTICLES on mergers between 2024-01-01 and 2024-02-01"
        ));
        // lead-in without date range
        assert!(!is_well_formed("Find all articles about AI layoffs"));
        // "between" with no month or year
        assert!(!is_well_formed("Find all articles about trade between US and China"));
        // date range without lead-in
        assert!(!is_well_formed("AI layoffs between May and June"));
    }

    #[test]
    fn year_detection_needs_four_digits() {
        assert!(contains_year("in 2025"));
        assert!(contains_year("since 1999"));
        assert!(!contains_year("top 20 companies"));
        assert!(!contains_year("3000 units"));
    }

    #[test]
    fn strip_quotes_handles_mixed_quotes() {
        assert_eq!(strip_quotes("  \"'Find all'\"  "), "Find all");
        assert_eq!(strip_quotes("\u{201c}Find all\u{201d}"), "Find all");
        assert_eq!(strip_quotes("plain"), "plain");
    }

    #[tokio::test]
    async fn well_formed_queries_pass_through_without_completion() {
        let llm = CannedCompletion::new("should not be used");
        let normalizer = QueryNormalizer::new(14);
        let inputs = [
            "Find all articles about AI layoffs between October 1 and October 16, 2026",
            "find all articles about chip exports between 2023 and 2024",
            "Search for articles about data breaches between March 3 and March 9",
        ];
        for raw in inputs {
            let q = normalizer.normalize(raw, today(), &llm).await.unwrap();
            assert_eq!(q.text(), raw);
            assert_eq!(q.origin(), QueryOrigin::PassThrough);
        }
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_query_invokes_completion_exactly_once() {
        let llm = CannedCompletion::new(
            "\"Find all articles about AI layoffs between October 2 and October 16, 2026\"",
        );
        let normalizer = QueryNormalizer::new(14);
        let q = normalizer.normalize("AI layoffs", today(), &llm).await.unwrap();
        assert_eq!(llm.calls(), 1);
        assert_eq!(q.origin(), QueryOrigin::Rewritten);
        assert_eq!(
            q.text(),
            "Find all articles about AI layoffs between October 2 and October 16, 2026"
        );

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("\"AI layoffs\""));
        assert!(prompt.contains("October 16, 2026"));
    }

    #[tokio::test]
    async fn malformed_rewrite_falls_back_to_synthesized_query() {
        let llm = CannedCompletion::new("Sure! Here is your query about layoffs.");
        let normalizer = QueryNormalizer::new(14);
        let q = normalizer
            .normalize("AI layoffs?", today(), &llm)
            .await
            .unwrap();
        assert_eq!(llm.calls(), 1);
        assert_eq!(q.origin(), QueryOrigin::Synthesized);
        assert_eq!(
            q.text(),
            "Find all articles about AI layoffs between October 2, 2026 and October 16, 2026"
        );
        assert!(q.is_well_formed());
    }

    #[tokio::test]
    async fn empty_rewrite_falls_back() {
        let llm = CannedCompletion::new("  \"\"  ");
        let q = QueryNormalizer::new(7)
            .normalize("find articles about EV recalls", today(), &llm)
            .await
            .unwrap();
        assert_eq!(
            q.text(),
            "Find all articles about EV recalls between October 9, 2026 and October 16, 2026"
        );
    }

    #[tokio::test]
    async fn completion_fault_propagates() {
        let llm = CannedCompletion::failing("rate limited");
        let err = QueryNormalizer::new(14)
            .normalize("AI layoffs", today(), &llm)
            .await
            .unwrap_err();
        assert!(matches!(err, CatchAllError::Completion(_)));
    }

    #[test]
    fn topic_strips_request_phrases() {
        assert_eq!(topic_of("Find all articles about solar tariffs."), "solar tariffs");
        assert_eq!(topic_of("news about IPOs"), "IPOs");
        assert_eq!(topic_of("Findings on sleep"), "Findings on sleep");
        assert_eq!(topic_of("   "), "recent news");
    }
}
