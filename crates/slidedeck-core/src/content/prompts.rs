//! Prompts for per-placeholder content.

pub const SUBTITLE_SYSTEM_PROMPT: &str = "You write short, specific slide subtitles.";
pub const BULLETS_SYSTEM_PROMPT: &str =
    "You write concise, data-driven bullet points for executive presentations.";
pub const CHART_SYSTEM_PROMPT: &str =
    "You produce chart data as JSON. Output only a JSON object, no commentary.";
pub const TABLE_SYSTEM_PROMPT: &str =
    "You produce table data as JSON. Output only a JSON object, no commentary.";
pub const KPI_SYSTEM_PROMPT: &str =
    "You extract a single headline metric as JSON. Output only a JSON object.";
pub const NOTES_SYSTEM_PROMPT: &str = "You write speaker notes for business presentations.";

fn facts_block(facts: &[String], empty: &str) -> String {
    if facts.is_empty() {
        empty.to_string()
    } else {
        facts.join("\n")
    }
}

pub fn build_subtitle_prompt(title: &str, purpose: &str, facts: &[String]) -> String {
    let facts = facts_block(&facts[..facts.len().min(3)], "No data");
    format!(
        r#"Write a subtitle of 2 to 5 words for this slide.

Title: {title}
Purpose: {purpose}
Key facts:
{facts}

Keep it professional and grounded in the facts. Reply with the subtitle text only."#
    )
}

pub fn build_bullets_prompt(
    title: &str,
    purpose: &str,
    facts: &[String],
    max_bullets: usize,
    max_words: usize,
) -> String {
    let facts = facts_block(facts, "No data available");
    format!(
        r#"Write exactly {max_bullets} bullet points for this slide.

Title: {title}
Purpose: {purpose}

Available data:
{facts}

Rules:
- each bullet under {max_words} words so it fits the layout
- include numbers and percentages where the data supports them
- executive tone, no introduction

Reply with plain text, one bullet per line."#
    )
}

pub fn build_chart_prompt(title: &str, purpose: &str, facts: &[String], chart_type: &str) -> String {
    let facts = facts_block(facts, "No data");
    format!(
        r#"Build chart data for the slide "{title}".

Purpose: {purpose}
Chart type: {chart_type}

Available data:
{facts}

Use 3 to 5 short category labels, 1 or 2 series, real numbers from the data
and a meaningful title. Reply with JSON of this shape:
{{"title": "Chart title", "type": "{chart_type}", "categories": ["A", "B", "C"],
  "series": [{{"name": "Series 1", "values": [10, 20, 30]}}]}}"#
    )
}

pub fn build_table_prompt(title: &str, purpose: &str, facts: &[String]) -> String {
    let facts = facts_block(facts, "No data");
    format!(
        r#"Build a comparison table for the slide "{title}".

Purpose: {purpose}

Available data:
{facts}

Use 3 or 4 column headers and 4 to 6 rows with real figures and clear labels.
Reply with JSON of this shape:
{{"headers": ["Metric", "2023", "2024"], "rows": [["Revenue", "$1.2B", "$1.4B"]]}}"#
    )
}

pub fn build_kpi_prompt(title: &str, fact: &str) -> String {
    format!(
        r#"Extract the headline metric from this fact.

Fact: {fact}
Context: {title}

value is the big number (for example "$119.6B", "25%", "5M"); label is a 3 to 5
word description. Reply with JSON: {{"value": "$119.6B", "label": "Q4 Revenue"}}"#
    )
}

pub fn build_notes_prompt(title: &str, bullets: &[String], facts: &[String]) -> String {
    let bullets = if bullets.is_empty() {
        "N/A".to_string()
    } else {
        bullets.join("\n- ")
    };
    let facts = if facts.is_empty() {
        "N/A".to_string()
    } else {
        facts[..facts.len().min(3)].join("\n- ")
    };
    format!(
        r#"Write speaker notes for this slide.

Title: {title}

On the slide:
- {bullets}

Supporting data:
- {facts}

Speak conversationally, explain rather than read the points, end with a
transition when it fits, and stay under 150 words. Reply with the notes only."#
    )
}
