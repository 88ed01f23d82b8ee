use crate::analyzer::LayoutCapability;

use super::plan::{PlanAnalysis, TemplateInfo};

/// System prompt for request analysis.
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a business analyst planning a presentation. Return only valid JSON.";

/// System prompt for choosing the slide count.
pub const SECTION_COUNT_SYSTEM_PROMPT: &str =
    "You are a presentation expert. Return only valid JSON.";

/// System prompt for slide topics.
pub const TOPICS_SYSTEM_PROMPT: &str =
    "You are a presentation designer. Create diverse slide topics. Return only valid JSON.";

/// System prompt for topic-to-layout matching.
pub const LAYOUT_MATCH_SYSTEM_PROMPT: &str =
    "You are a layout expert. Match topics to optimal layouts. Return only valid JSON.";

/// System prompt for section subtitles.
pub const SUBTITLE_SYSTEM_PROMPT: &str =
    "Generate concise, unique section headings. Follow instructions exactly.";

/// System prompt for search query phrasing.
pub const SEARCH_QUERY_SYSTEM_PROMPT: &str =
    "You write precise web search queries. Return only the query text.";

fn excerpt(content: &str, max_chars: usize) -> String {
    let mut out: String = content.chars().take(max_chars).collect();
    if content.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

pub fn build_analysis_prompt(query: &str, extracted: Option<&str>, max_chars: usize) -> String {
    let context = extracted
        .map(|c| format!("Context from uploaded files:\n{}\n", excerpt(c, max_chars)))
        .unwrap_or_default();
    format!(
        r#"Analyze this presentation request:

"{query}"

{context}
Identify:
1. The MAIN SUBJECT (company, product, topic)
2. The CONTEXT (financial report, market analysis, product launch, ...)
3. The time period, if any
4. Six to ten DISTINCT aspects the deck should cover, without overlap

Return JSON:
{{
  "main_subject": "...",
  "context": "...",
  "time_period": null,
  "aspects": ["...", "...", "..."]
}}"#
    )
}

pub fn build_section_count_prompt(query: &str, aspects: usize, has_content: bool) -> String {
    let content = if has_content {
        "Source material: provided\n"
    } else {
        ""
    };
    format!(
        r#"Presentation request: "{query}"
Distinct aspects identified: {aspects}
{content}
How many content slides should this deck have? Consider the complexity of
the topic and the number of aspects; business decks usually run 6 to 12.

Return JSON:
{{"recommended_slides": 8, "reasoning": "..."}}"#
    )
}

pub fn build_topics_prompt(
    analysis: &PlanAnalysis,
    count: usize,
    info: &TemplateInfo,
    extracted: Option<&str>,
    max_chars: usize,
) -> String {
    let aspects = serde_json::to_string_pretty(&analysis.aspects).unwrap_or_default();
    let content = extracted
        .map(|c| format!("Base the topics on this content:\n{}\n", excerpt(c, max_chars)))
        .unwrap_or_default();
    format!(
        r#"Create {count} completely different slide topics.

Main subject: {subject}
Context: {context}
Aspects to cover: {aspects}

{content}
Template capabilities:
- chart layouts: {charts}
- table layouts: {tables}
- multi-item layouts: {multi}

Each topic covers ONE distinct aspect with no overlap. Suggest the best
content type for each: chart, table, icon_grid, kpi or bullets.

Return JSON:
{{
  "slides": [
    {{"title": "...", "purpose": "...", "best_content": "chart", "search_focus": "..."}}
  ]
}}"#,
        subject = analysis.main_subject,
        context = analysis.context,
        charts = info.chart_capable.len(),
        tables = info.table_capable.len(),
        multi = info.multi_content.len(),
    )
}

pub fn build_layout_match_prompt(
    topics_json: &str,
    count: usize,
    info: &TemplateInfo,
    layouts: &[&LayoutCapability],
) -> String {
    let valid = &info.usable_layouts;
    let min = valid.iter().min().copied().unwrap_or(0);
    let max = valid.iter().max().copied().unwrap_or(0);
    let descriptions: Vec<String> = layouts
        .iter()
        .map(|l| {
            let best: Vec<&str> = l.best_for.iter().take(3).map(String::as_str).collect();
            format!(
                "Layout {}: {} ({}; best for {}; {} sections)",
                l.idx,
                l.name,
                l.layout_type,
                best.join(", "),
                l.semantic_sections.len()
            )
        })
        .collect();
    format!(
        r#"Assign a layout to each of these {count} slide topics.

CONSTRAINTS:
- layout_idx MUST be one of {valid:?} (between {min} and {max})
- return EXACTLY {count} assignments, in topic order

Topics:
{topics_json}

Layouts:
{layouts}

Chart layouts: {charts:?}
Table layouts: {tables:?}
Multi-content layouts: {multi:?}

Use chart layouts for charts, table layouts for tables and multi-content
layouts for icon grids. Rotate through the layouts and never use the same
layout three times in a row.

Return JSON:
{{
  "assignments": [
    {{"topic_index": 0, "title": "...", "layout_idx": {min}, "content_type": "chart", "reasoning": "..."}}
  ]
}}"#,
        layouts = descriptions.join("\n"),
        charts = info.chart_capable,
        tables = info.table_capable,
        multi = info.multi_content,
    )
}

pub fn build_subtitle_prompt(purpose: &str, position: &str, content_type: &str, used: &[String]) -> String {
    let used = if used.is_empty() {
        "None".to_string()
    } else {
        used.join(", ")
    };
    format!(
        r#"Write a SHORT heading (2-4 words) for one section of a slide.

Slide purpose: {purpose}
Position on the slide: {position}
Content type: {content_type}

Already used, do not repeat: {used}

The heading is a section label, not the slide title. Return only the heading."#
    )
}

pub fn build_search_query_prompt(topic: &str, purpose: &str, content_type: &str, role: &str) -> String {
    format!(
        r#"Main topic: {topic}
Slide purpose: {purpose}
Content type: {content_type}
Role on the slide: {role}

Write one search query that finds the data this placeholder needs."#
    )
}
