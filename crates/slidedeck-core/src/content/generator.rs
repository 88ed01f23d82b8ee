use tracing::{debug, warn};

use crate::llm::json::parse_json;
use crate::llm::{CompletionOptions, SharedLLM};

use super::prompts::*;
use super::types::{ChartData, ChartType, KpiData, TableData};

/// Generates the text, chart, table and KPI content of single placeholders.
///
/// Every method degrades to fixed fallback content when the model fails, so
/// a slide is never left without something to render.
#[derive(Clone)]
pub struct ContentGenerator {
    llm: SharedLLM,
}

impl ContentGenerator {
    pub fn new(llm: SharedLLM) -> Self {
        Self { llm }
    }

    /// A 2 to 5 word subtitle.
    pub async fn generate_subtitle(&self, title: &str, purpose: &str, facts: &[String]) -> String {
        let prompt = build_subtitle_prompt(title, purpose, facts);
        let options = CompletionOptions::temperature(0.4).with_max_tokens(20);
        match self
            .llm
            .complete_with_options(SUBTITLE_SYSTEM_PROMPT, &prompt, &options)
            .await
        {
            Ok(text) => {
                let subtitle = text
                    .trim()
                    .trim_matches(|c| c == '"' || c == '\'')
                    .trim()
                    .to_string();
                if subtitle.is_empty() {
                    "Key Insights".to_string()
                } else {
                    subtitle
                }
            }
            Err(e) => {
                warn!(error = %e, title, "subtitle generation failed");
                "Analysis".to_string()
            }
        }
    }

    /// Bullet points capped at `max_bullets` items of `max_words` words.
    pub async fn generate_bullets(
        &self,
        title: &str,
        purpose: &str,
        facts: &[String],
        max_bullets: usize,
        max_words: usize,
    ) -> Vec<String> {
        let prompt = build_bullets_prompt(title, purpose, facts, max_bullets, max_words);
        let options = CompletionOptions::temperature(0.3).with_max_tokens(300);
        let bullets = match self
            .llm
            .complete_with_options(BULLETS_SYSTEM_PROMPT, &prompt, &options)
            .await
        {
            Ok(text) => parse_bullets(&text, max_bullets, max_words),
            Err(e) => {
                warn!(error = %e, title, "bullet generation failed");
                Vec::new()
            }
        };
        if bullets.is_empty() {
            return fallback_bullets(title);
        }
        debug!(count = bullets.len(), title, "bullets generated");
        bullets
    }

    /// Chart data; series are normalised to the category count.
    pub async fn generate_chart(
        &self,
        title: &str,
        purpose: &str,
        facts: &[String],
        chart_type: ChartType,
    ) -> ChartData {
        let prompt = build_chart_prompt(title, purpose, facts, chart_type.as_str());
        let options = CompletionOptions::temperature(0.2).with_max_tokens(400).json();
        let response = self
            .llm
            .complete_with_options(CHART_SYSTEM_PROMPT, &prompt, &options)
            .await;
        match response.and_then(|text| parse_json::<ChartData>(&text)) {
            Ok(chart) => {
                let chart = chart.normalize();
                if chart.is_renderable() {
                    debug!(categories = chart.categories.len(), title, "chart generated");
                    chart
                } else {
                    warn!(title, "chart response had no data");
                    ChartData::fallback(title, chart_type)
                }
            }
            Err(e) => {
                warn!(error = %e, title, "chart generation failed");
                ChartData::fallback(title, chart_type)
            }
        }
    }

    /// Table data; rows are padded or truncated to the header width.
    pub async fn generate_table(&self, title: &str, purpose: &str, facts: &[String]) -> TableData {
        let prompt = build_table_prompt(title, purpose, facts);
        let options = CompletionOptions::temperature(0.2).with_max_tokens(500).json();
        let response = self
            .llm
            .complete_with_options(TABLE_SYSTEM_PROMPT, &prompt, &options)
            .await;
        match response.and_then(|text| parse_json::<TableData>(&text)) {
            Ok(table) if table.column_count() > 0 => table.normalize(),
            Ok(_) => {
                warn!(title, "table response had no headers");
                TableData::fallback()
            }
            Err(e) => {
                warn!(error = %e, title, "table generation failed");
                TableData::fallback()
            }
        }
    }

    /// A headline value and label drawn from one fact.
    pub async fn generate_kpi(&self, title: &str, fact: &str) -> KpiData {
        let prompt = build_kpi_prompt(title, fact);
        let options = CompletionOptions::temperature(0.1).with_max_tokens(100).json();
        let response = self
            .llm
            .complete_with_options(KPI_SYSTEM_PROMPT, &prompt, &options)
            .await;
        match response.and_then(|text| parse_json::<KpiData>(&text)) {
            Ok(kpi) if !kpi.value.trim().is_empty() => kpi,
            Ok(_) => KpiData::fallback(title),
            Err(e) => {
                warn!(error = %e, title, "kpi generation failed");
                KpiData::fallback(title)
            }
        }
    }

    pub async fn generate_speaker_notes(
        &self,
        title: &str,
        bullets: &[String],
        facts: &[String],
    ) -> String {
        let prompt = build_notes_prompt(title, bullets, facts);
        let options = CompletionOptions::temperature(0.7).with_max_tokens(250);
        match self
            .llm
            .complete_with_options(NOTES_SYSTEM_PROMPT, &prompt, &options)
            .await
        {
            Ok(notes) if !notes.trim().is_empty() => notes.trim().to_string(),
            Ok(_) => fallback_notes(title),
            Err(e) => {
                warn!(error = %e, title, "speaker notes generation failed");
                fallback_notes(title)
            }
        }
    }
}

fn fallback_bullets(title: &str) -> Vec<String> {
    vec![
        format!("Analysis of {title}"),
        "Key findings pending".to_string(),
        "Data review in progress".to_string(),
    ]
}

fn fallback_notes(title: &str) -> String {
    format!("Speaker notes for {title}: Please cover the key points listed on the slide.")
}

/// Splits a model reply into bullets: strips markers and numbering, skips
/// code fences, truncates each bullet to `max_words` words.
pub fn parse_bullets(text: &str, max_bullets: usize, max_words: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .map(strip_bullet_marker)
        .filter(|line| !line.is_empty())
        .map(|line| truncate_words(line, max_words))
        .take(max_bullets)
        .collect()
}

/// Removes a leading `-`, `*`, `•` or `1.` / `1)` marker.
pub fn strip_bullet_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•', '–', '·']).trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }
    line.trim()
}

fn truncate_words(line: &str, max_words: usize) -> String {
    let words: Vec<&str> = line.split_whitespace().collect();
    if max_words == 0 || words.len() <= max_words {
        words.join(" ")
    } else {
        words[..max_words].join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bullets_strips_markers() {
        let text = "```\n- Revenue grew 12% to $4.1B\n2. Margin expanded 300bps\n• Cash up\n\n3) Headcount flat\n```";
        let bullets = parse_bullets(text, 3, 40);
        assert_eq!(
            bullets,
            vec!["Revenue grew 12% to $4.1B", "Margin expanded 300bps", "Cash up"]
        );
    }

    #[test]
    fn test_parse_bullets_truncates_words() {
        let bullets = parse_bullets("one two three four five six seven", 5, 5);
        assert_eq!(bullets, vec!["one two three four five"]);
    }

    #[test]
    fn test_strip_marker_keeps_leading_numbers() {
        assert_eq!(strip_bullet_marker("2024 revenue hit $3B"), "2024 revenue hit $3B");
        assert_eq!(strip_bullet_marker("12. Growth"), "Growth");
    }
}
