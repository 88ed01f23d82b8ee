/// System prompt for simulated web search.
pub const SEARCH_SYSTEM_PROMPT: &str =
    "You find quantitative business data. Always include numbers and timeframes.";

/// Builds the user prompt for one search query.
///
/// With source material the facts must come from it rather than general
/// knowledge.
pub fn build_search_prompt(query: &str, source: Option<&str>) -> String {
    let source = source
        .map(|s| {
            format!(
                "\nUse ONLY this source material:\n---\n{s}\n---\n"
            )
        })
        .unwrap_or_default();
    format!(
        r#"Find 3-5 QUANTITATIVE facts for: {query}
{source}
Every fact must include:
- a specific number with units ($, %, M, B)
- a timeframe (Q4 2024, FY2024, ...)
- source context

Format each fact on its own line as: [Metric]: [Value] ([Timeframe])

Example: Revenue: $119.6B (Q4 2024)"#
    )
}
