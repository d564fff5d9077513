//! Prompt text shared by the normalizer, the analysis dispatcher, and the
//! agent-facing tool descriptors.

/// Name of the tool that starts a new (expensive) search.
pub const SEARCH_TOOL_NAME: &str = "catchall_search_news";

/// Name of the tool that analyzes the cached result set.
pub const ANALYZE_TOOL_NAME: &str = "catchall_analyze_news";

pub const SEARCH_TOOL_DESCRIPTION: &str = "Use this tool to find NEW articles. \
Input should be a broad topic like 'Find articles about companies opening offices'. \
WARNING: This triggers a new 15-minute search. \
NEVER use this for filtering or narrowing down existing results.";

pub const ANALYZE_TOOL_DESCRIPTION: &str = "Use this tool for ANY follow-up interaction with the search results. \
Capabilities: \
1. Filtering & Sorting ('Show only Florida', 'Sort by date') \
2. Aggregation ('Group by company', 'Count by state') \
3. QA ('What are the top trends?', 'Summarize key findings') \
ALWAYS use this tool if you already have data. NEVER search again.";

/// System prompt for an upstream agent driving the two tools.
///
/// Encodes the "search is expensive, analysis is cheap" policy: one broad
/// search, then every follow-up goes through analysis.
pub const AGENT_PROMPT: &str = r#"You are a News Research Assistant powered by CatchAll.

Your workflow is strictly defined:
1. SEARCH: Use `catchall_search_news` ONLY to get a broad initial dataset (e.g., 'Find all US office openings').
   - WARNING: This tool takes 15 minutes. NEVER call it twice in a row.

2. ANALYZE: Use `catchall_analyze_news` for ALL follow-up questions.
   - FILTERING & SORTING: 'Show me only Florida deals', 'Sort by date', 'Find top 3'.
   - AGGREGATION: 'Group by state', 'Count by industry'.
   - QA: 'What are the main trends?', 'Summarize key findings'.

CRITICAL RULES:
- If the user asks for a subset of data (like 'only Florida deals'), assume it is ALREADY in your search results.
- NEVER use `catchall_search_news` to filter data. Always use `catchall_analyze_news`.
- Only use `catchall_search_news` if the user explicitly asks for a 'new search' or a completely different topic.
"#;

/// Prompt asking the completion backend to rewrite a free-text request into
/// the backend's query shape.
pub fn rewrite_prompt(user_query: &str, today: &str, default_window_days: u32) -> String {
    format!(
        r#"Transform this user question into a specific CatchAll search query with explicit dates.

User question: "{user_query}"
Today's date: {today}

Rules:
1. Start with "Find all articles about..."
2. Add date range "between [Date1] and [Date2]"
3. Default range (if not specified): {default_window_days} days ago to today.

Example: "AI news" -> "Find all articles about AI technology developments between November 5 and November 19, 2024"

Return ONLY the transformed query string."#
    )
}

/// Prompt asking the completion backend to answer `question` over the
/// serialized records in `context`.
pub fn analysis_prompt(
    question: &str,
    context: &str,
    included: usize,
    omitted: usize,
    total_found: u64,
) -> String {
    let omitted_note = if omitted > 0 {
        format!(
            "\nNote: {} further cached records were left out to fit the context window.",
            omitted
        )
    } else {
        String::new()
    };
    format!(
        r#"You are analyzing a cached set of news records returned by a CatchAll search.
The search matched {total_found} records in total; {included} are included below, one JSON object per line, in the order the search returned them.{omitted_note}

Records:
{context}

Answer the question using ONLY these records. The question may ask you to:
- filter or sort records by their fields,
- group or count records by a field,
- summarize, compare, or answer an open-ended question.
When listing records, keep their titles. If the records cannot answer the question, say so.

Question: {question}"#
    )
}
