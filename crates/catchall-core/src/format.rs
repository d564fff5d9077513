//! Human-readable search summaries.

use crate::models::ResultSet;
use crate::prompts::ANALYZE_TOOL_NAME;

/// Render the summary returned by a successful search.
///
/// ```text
/// Found 3 records (Showing top 3).
///
/// 1. Acme cuts 200 jobs
///    (company: Acme, industry: tech)
/// ...
/// ```
pub fn format_search_summary(results: &ResultSet) -> String {
    let mut output = vec![format!(
        "Found {} records (Showing top {}).\n",
        results.total_found,
        results.len()
    )];

    for (i, record) in results.records.iter().enumerate() {
        output.push(format!("{}. {}", i + 1, record.title));
        let details = record
            .details()
            .into_iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>();
        if !details.is_empty() {
            output.push(format!("   ({})", details.join(", ")));
        }
    }

    output.push("\nData successfully cached!".to_string());
    output.push(format!(
        "You can now use '{}' to filter, group, or summarize this data.",
        ANALYZE_TOOL_NAME
    ));
    output.join("\n")
}

/// Message returned when a completed search matched nothing.
pub fn no_results_message(raw_query: &str) -> String {
    format!("No results found for query: {}", raw_query)
}
