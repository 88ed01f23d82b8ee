use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzer::{LayoutCapability, PlaceholderInfo, TemplateAnalysis};
use crate::config::{
    PlanningConfig, ANALYSIS_CONTENT_CHARS, FALLBACK_MAX_SECTIONS, FALLBACK_MIN_SECTIONS,
    TOPIC_CONTENT_CHARS,
};
use crate::content::{ChartData, ChartType, TableData};
use crate::deck::{BulletGroup, BulletItem, SlideContent};
use crate::llm::json::{parse_json, parse_json_value};
use crate::llm::{CompletionOptions, LLMError, SharedLLM};
use crate::matcher::ContentMatcher;
use crate::pptx::PlaceholderKind;

use super::plan::{
    Dimensions, PlaceholderContentSpec, PlanAnalysis, ResearchPlan, SearchQuery, SectionPlan,
    TemplateInfo,
};
use super::prompts::*;

/// Errors that can occur during planning.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("No layouts found in template")]
    NoLayouts,

    #[error("No usable layouts found in template")]
    NoUsableLayouts,

    #[error("Layout {0} not found in template")]
    UnknownLayout(usize),

    #[error("Invalid layout assignment: {0}")]
    InvalidAssignment(String),

    #[error("LLM error: {0}")]
    LLM(#[from] LLMError),
}

/// A slide topic before it has a layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlideTopic {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default = "default_content")]
    pub best_content: String,
    #[serde(default)]
    pub search_focus: String,
}

fn default_content() -> String {
    "bullets".to_string()
}

/// A topic with its layout and enforced content type.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBlueprint {
    pub title: String,
    pub purpose: String,
    pub layout_idx: usize,
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
struct SectionCount {
    recommended_slides: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Assignments {
    #[serde(default)]
    assignments: Vec<Assignment>,
}

#[derive(Debug, Deserialize)]
struct Assignment {
    layout_idx: Option<Value>,
    content_type: Option<String>,
}

/// Turns a request and an analyzed template into a [`ResearchPlan`].
pub struct PlanGenerator {
    llm: SharedLLM,
    config: PlanningConfig,
}

impl PlanGenerator {
    pub fn new(llm: SharedLLM, config: PlanningConfig) -> Self {
        Self { llm, config }
    }

    /// Plans a deck for `query`.
    ///
    /// `extracted_content` is text pulled from uploaded files; when present
    /// the search queries become extraction instructions against it.
    pub async fn generate_plan(
        &self,
        query: &str,
        template: &TemplateAnalysis,
        num_sections: Option<usize>,
        extracted_content: Option<&str>,
    ) -> Result<ResearchPlan, PlanError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PlanError::EmptyQuery);
        }
        if template.is_empty() {
            return Err(PlanError::NoLayouts);
        }
        info!(query, template = template.template_name(), "planning deck");

        let analysis = self.analyze_request(query, extracted_content).await;
        let target = match num_sections.filter(|n| *n > 0) {
            Some(n) => n,
            None => self.section_count(query, &analysis, extracted_content).await,
        };
        info!(sections = target, aspects = analysis.aspects.len(), "section count decided");

        let info = template_capabilities(template);
        if info.usable_layouts.is_empty() {
            return Err(PlanError::NoUsableLayouts);
        }

        let topics = self
            .generate_topics(&analysis, target, &info, extracted_content)
            .await;
        let mut blueprints = self.match_topics_to_layouts(&topics, &info, template).await;
        enforce_layout_diversity(&mut blueprints, template);

        let mut sections = Vec::with_capacity(blueprints.len());
        for (i, blueprint) in blueprints.iter().enumerate() {
            let section = self
                .detailed_section(blueprint, query, &analysis, template, extracted_content)
                .await?;
            info!(slide = i + 1, title = %section.section_title, layout = section.layout_idx, "section planned");
            sections.push(section);
        }

        let mut plan = ResearchPlan::new(query, analysis, sections);
        plan.search_mode = self.config.search_mode.clone();
        plan.template_info = info;
        info!(sections = plan.sections.len(), queries = plan.total_queries, "plan ready");
        Ok(plan)
    }

    async fn analyze_request(&self, query: &str, extracted: Option<&str>) -> PlanAnalysis {
        let prompt = build_analysis_prompt(query, extracted, ANALYSIS_CONTENT_CHARS);
        let options = CompletionOptions::temperature(0.4).with_max_tokens(800).json();
        let result = self
            .llm
            .complete_with_options(ANALYSIS_SYSTEM_PROMPT, &prompt, &options)
            .await
            .and_then(|text| parse_json::<PlanAnalysis>(&text));
        match result {
            Ok(analysis) if analysis.aspects.len() >= 3 => {
                debug!(aspects = analysis.aspects.len(), "request analyzed");
                analysis
            }
            Ok(_) => {
                warn!("analysis returned fewer than 3 aspects, using fallback");
                fallback_analysis(query)
            }
            Err(e) => {
                warn!(error = %e, "request analysis failed, using fallback");
                fallback_analysis(query)
            }
        }
    }

    async fn section_count(&self, query: &str, analysis: &PlanAnalysis, extracted: Option<&str>) -> usize {
        let aspects = analysis.aspects.len();
        let prompt = build_section_count_prompt(query, aspects, extracted.is_some());
        let options = CompletionOptions::temperature(0.3).with_max_tokens(200).json();
        let result = self
            .llm
            .complete_with_options(SECTION_COUNT_SYSTEM_PROMPT, &prompt, &options)
            .await
            .and_then(|text| parse_json::<SectionCount>(&text));
        match result {
            Ok(count) => {
                let n = count
                    .recommended_slides
                    .as_ref()
                    .and_then(value_as_usize)
                    .unwrap_or(aspects);
                n.max(self.config.min_sections).min(self.config.max_sections)
            }
            Err(e) => {
                warn!(error = %e, "section count failed, deriving from aspects");
                aspects.clamp(FALLBACK_MIN_SECTIONS, FALLBACK_MAX_SECTIONS)
            }
        }
    }

    async fn generate_topics(
        &self,
        analysis: &PlanAnalysis,
        count: usize,
        info: &TemplateInfo,
        extracted: Option<&str>,
    ) -> Vec<SlideTopic> {
        let prompt = build_topics_prompt(analysis, count, info, extracted, TOPIC_CONTENT_CHARS);
        let options = CompletionOptions::temperature(0.9).with_max_tokens(2000).json();
        let result = self
            .llm
            .complete_with_options(TOPICS_SYSTEM_PROMPT, &prompt, &options)
            .await
            .and_then(|text| parse_json_value(&text));
        match result.map(extract_topics) {
            Ok(mut topics) if topics.len() >= count => {
                topics.truncate(count);
                topics
            }
            Ok(topics) => {
                warn!(got = topics.len(), needed = count, "too few topics, using fallback");
                fallback_topics(analysis, count)
            }
            Err(e) => {
                warn!(error = %e, "topic generation failed, using fallback");
                fallback_topics(analysis, count)
            }
        }
    }

    /// LLM assignment with strict validation, retried with rising
    /// temperature; the matcher assigns layouts once attempts run out.
    async fn match_topics_to_layouts(
        &self,
        topics: &[SlideTopic],
        info: &TemplateInfo,
        template: &TemplateAnalysis,
    ) -> Vec<SectionBlueprint> {
        let topics_json = serde_json::to_string_pretty(
            &topics
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "title": t.title,
                        "purpose": t.purpose,
                        "best_content": t.best_content,
                    })
                })
                .collect::<Vec<_>>(),
        )
        .unwrap_or_default();
        let usable: Vec<&LayoutCapability> = template
            .layouts()
            .iter()
            .filter(|l| info.usable_layouts.contains(&l.idx))
            .collect();
        let prompt = build_layout_match_prompt(&topics_json, topics.len(), info, &usable);

        for attempt in 0..self.config.layout_match_attempts {
            let options = CompletionOptions::temperature(0.5 + 0.1 * attempt as f32)
                .with_max_tokens(1500)
                .json();
            let result = self
                .llm
                .complete_with_options(LAYOUT_MATCH_SYSTEM_PROMPT, &prompt, &options)
                .await
                .map_err(PlanError::from)
                .and_then(|text| parse_json::<Assignments>(&text).map_err(PlanError::from))
                .and_then(|a| validate_assignments(&a.assignments, topics, &info.usable_layouts));
            match result {
                Ok(blueprints) => {
                    info!(count = blueprints.len(), attempt = attempt + 1, "topics matched to layouts");
                    return blueprints;
                }
                Err(e) => warn!(attempt = attempt + 1, error = %e, "layout matching attempt failed"),
            }
        }

        warn!("layout matching exhausted, assigning layouts deterministically");
        fallback_assignment(topics, template)
    }

    async fn detailed_section(
        &self,
        blueprint: &SectionBlueprint,
        query: &str,
        analysis: &PlanAnalysis,
        template: &TemplateAnalysis,
        extracted: Option<&str>,
    ) -> Result<SectionPlan, PlanError> {
        let layout = template
            .layout(blueprint.layout_idx)
            .ok_or(PlanError::UnknownLayout(blueprint.layout_idx))?;

        let mut specs = vec![PlaceholderContentSpec {
            placeholder_idx: 0,
            placeholder_type: "title".to_string(),
            content_type: "text".to_string(),
            content_description: blueprint.title.clone(),
            search_queries: Vec::new(),
            position_group: "title".to_string(),
            role: "title".to_string(),
            dimensions: Dimensions::default(),
        }];

        let mut used: Vec<String> = Vec::new();
        for ph in &layout.subtitle_placeholders {
            let heading = self
                .unique_subtitle(&blueprint.purpose, &ph.position_group, &blueprint.content_type, &used)
                .await;
            used.push(heading.clone());
            specs.push(spec_for(ph, "subtitle", heading, Vec::new(), "subtitle"));
        }

        let mut content: Vec<&PlaceholderInfo> = layout.content_placeholders.iter().collect();
        content.sort_by(|a, b| b.area.total_cmp(&a.area));
        let subject = if analysis.main_subject.is_empty() {
            query
        } else {
            analysis.main_subject.as_str()
        };
        for (i, ph) in content.iter().enumerate() {
            let (content_type, role, description) = if i == 0 {
                (
                    determine_content_type(&blueprint.content_type, ph),
                    "primary".to_string(),
                    format!("{} - primary", blueprint.purpose),
                )
            } else {
                let ct = if ph.area < 1.0 { "kpi" } else { "bullets" };
                (
                    ct.to_string(),
                    format!("supporting_{i}"),
                    format!("{} - supporting", blueprint.purpose),
                )
            };
            let search = self
                .search_query(subject, &blueprint.purpose, &content_type, &role, extracted.is_some())
                .await;
            specs.push(spec_for(ph, &content_type, description, vec![search], "content"));
        }

        let total = specs.iter().map(|s| s.search_queries.len()).sum();
        Ok(SectionPlan {
            section_title: blueprint.title.clone(),
            section_purpose: blueprint.purpose.clone(),
            layout_type: layout.layout_type.clone(),
            layout_idx: layout.idx,
            layout_story: layout.layout_story.clone(),
            placeholder_specs: specs,
            total_search_queries: total,
            enforced_content_type: blueprint.content_type.clone(),
        })
    }

    /// A subtitle not in `used`; falls back to `"{first word of purpose} {n}"`.
    async fn unique_subtitle(&self, purpose: &str, position: &str, content_type: &str, used: &[String]) -> String {
        let prompt = build_subtitle_prompt(purpose, position, content_type, used);
        for attempt in 0..self.config.subtitle_attempts.max(1) {
            let options = CompletionOptions::temperature(0.7 + 0.1 * attempt as f32).with_max_tokens(20);
            match self
                .llm
                .complete_with_options(SUBTITLE_SYSTEM_PROMPT, &prompt, &options)
                .await
            {
                Ok(text) => {
                    let heading = clean_line(&text);
                    if !heading.is_empty() && !used.contains(&heading) {
                        return heading;
                    }
                    debug!(heading, attempt = attempt + 1, "subtitle repeated, retrying");
                }
                Err(e) => warn!(error = %e, attempt = attempt + 1, "subtitle generation failed"),
            }
        }
        numbered_subtitle(purpose, used)
    }

    async fn search_query(
        &self,
        subject: &str,
        purpose: &str,
        content_type: &str,
        role: &str,
        from_content: bool,
    ) -> SearchQuery {
        if from_content {
            return SearchQuery {
                query: format!("Extract info about {purpose} for {content_type}"),
                purpose: format!("{purpose} - {role}"),
                expected_source_type: "extracted_content".to_string(),
            };
        }
        let prompt = build_search_query_prompt(subject, purpose, content_type, role);
        let options = CompletionOptions::temperature(0.5).with_max_tokens(50);
        match self
            .llm
            .complete_with_options(SEARCH_QUERY_SYSTEM_PROMPT, &prompt, &options)
            .await
        {
            Ok(text) if !clean_line(&text).is_empty() => {
                SearchQuery::new(clean_line(&text), format!("{purpose} - {role}"))
            }
            Ok(_) => SearchQuery::new(format!("{subject} {content_type}"), purpose),
            Err(e) => {
                warn!(error = %e, "search query generation failed");
                SearchQuery::new(format!("{subject} {content_type}"), purpose)
            }
        }
    }
}

fn fallback_analysis(query: &str) -> PlanAnalysis {
    PlanAnalysis {
        main_subject: query.split_whitespace().next().unwrap_or("Topic").to_string(),
        context: "analysis".to_string(),
        time_period: None,
        aspects: (1..=6).map(|i| format!("Aspect {i}")).collect(),
    }
}

fn fallback_topics(analysis: &PlanAnalysis, count: usize) -> Vec<SlideTopic> {
    (0..count)
        .map(|i| {
            let aspect = analysis
                .aspects
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Topic {}", i + 1));
            SlideTopic {
                title: format!("Analysis {}", i + 1),
                purpose: aspect.clone(),
                best_content: default_content(),
                search_focus: aspect,
            }
        })
        .collect()
}

/// Topics live under `slides`, `topics` or `sections`, or are the document
/// itself when it is an array.
fn extract_topics(value: Value) -> Vec<SlideTopic> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => ["slides", "topics", "sections"]
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .or_else(|| {
                map.into_iter().find_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    list.into_iter()
        .filter_map(|v| serde_json::from_value::<SlideTopic>(v).ok())
        .filter(|t| !t.title.trim().is_empty())
        .collect()
}

fn value_as_usize(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as usize)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Layout indices usable for body slides and what each can hold.
pub fn template_capabilities(template: &TemplateAnalysis) -> TemplateInfo {
    let mut info = TemplateInfo::default();
    for layout in template.layouts().iter().filter(|l| l.idx != 0) {
        info.usable_layouts.push(layout.idx);
        if layout.has_chart {
            info.chart_capable.push(layout.idx);
        }
        if layout.has_table {
            info.table_capable.push(layout.idx);
        }
        if layout.content_placeholders.len() >= 3 {
            info.multi_content.push(layout.idx);
        }
    }
    info.total = info.usable_layouts.len();
    info
}

/// Accepts exactly one valid assignment per topic.
fn validate_assignments(
    assignments: &[Assignment],
    topics: &[SlideTopic],
    usable: &[usize],
) -> Result<Vec<SectionBlueprint>, PlanError> {
    let mut blueprints = Vec::with_capacity(topics.len());
    for (assignment, topic) in assignments.iter().zip(topics) {
        let idx = assignment
            .layout_idx
            .as_ref()
            .and_then(value_as_usize)
            .ok_or_else(|| PlanError::InvalidAssignment("layout_idx is not an integer".to_string()))?;
        if !usable.contains(&idx) {
            return Err(PlanError::InvalidAssignment(format!(
                "layout {idx} not in {usable:?}"
            )));
        }
        blueprints.push(SectionBlueprint {
            title: topic.title.clone(),
            purpose: topic.purpose.clone(),
            layout_idx: idx,
            content_type: assignment
                .content_type
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| topic.best_content.clone()),
        });
    }
    if blueprints.len() != topics.len() {
        return Err(PlanError::InvalidAssignment(format!(
            "expected {} assignments, got {}",
            topics.len(),
            blueprints.len()
        )));
    }
    Ok(blueprints)
}

/// Assigns layouts with the content matcher, probing each topic with
/// placeholder content of its preferred type.
pub fn fallback_assignment(topics: &[SlideTopic], template: &TemplateAnalysis) -> Vec<SectionBlueprint> {
    let mut matcher = ContentMatcher::new(template);
    topics
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            let probe = probe_slide(topic);
            let layout_idx = matcher.select_layout_for_slide(&probe, i, topics.len());
            SectionBlueprint {
                title: topic.title.clone(),
                purpose: topic.purpose.clone(),
                layout_idx,
                content_type: topic.best_content.clone(),
            }
        })
        .collect()
}

fn probe_slide(topic: &SlideTopic) -> SlideContent {
    let mut slide = SlideContent {
        heading: topic.title.clone(),
        ..Default::default()
    };
    let group = |heading: &str| {
        BulletItem::Group(BulletGroup {
            heading: heading.to_string(),
            bullet_points: vec![BulletItem::Text(topic.purpose.clone())],
        })
    };
    match topic.best_content.as_str() {
        c if c.contains("chart") => slide.chart = Some(ChartData::fallback(&topic.title, ChartType::Column)),
        c if c.contains("table") => slide.table = Some(TableData::fallback()),
        "kpi" => slide.bullet_points = (1..=4).map(|i| group(&format!("KPI {i}"))).collect(),
        "icon_grid" => {
            slide.bullet_points = (1..=4)
                .map(|i| BulletItem::Text(format!("[[icon]] Point {i}")))
                .collect()
        }
        "comparison" => slide.bullet_points = vec![group("Option A"), group("Option B")],
        _ => {
            slide.bullet_points = (0..5)
                .map(|_| BulletItem::Text(topic.purpose.clone()))
                .collect()
        }
    }
    slide
}

/// No three consecutive sections on the same layout: the third moves to the
/// first other body layout whose `best_for` lists its content type.
pub fn enforce_layout_diversity(blueprints: &mut [SectionBlueprint], template: &TemplateAnalysis) {
    for i in 2..blueprints.len() {
        let idx = blueprints[i].layout_idx;
        if blueprints[i - 2].layout_idx != idx || blueprints[i - 1].layout_idx != idx {
            continue;
        }
        let content_type = blueprints[i].content_type.clone();
        if let Some(alt) = template
            .layouts()
            .iter()
            .find(|l| l.idx != 0 && l.idx != idx && l.supports(&content_type))
        {
            info!(section = i + 1, from = idx, to = alt.idx, "diversified layout");
            blueprints[i].layout_idx = alt.idx;
        }
    }
}

/// Content type for the largest placeholder given the enforced type.
pub fn determine_content_type(enforced: &str, ph: &PlaceholderInfo) -> String {
    let ct = match enforced {
        "chart" if ph.kind == PlaceholderKind::Chart || ph.area > 30.0 => "column_chart",
        "table" if ph.kind == PlaceholderKind::Tbl || ph.area > 40.0 => "table",
        "icon_grid" if ph.area > 2.0 => "icon_grid",
        "kpi" => "kpi",
        _ => "bullets",
    };
    ct.to_string()
}

fn numbered_subtitle(purpose: &str, used: &[String]) -> String {
    let base = purpose.split_whitespace().next().unwrap_or("Section");
    let mut n = 1;
    loop {
        let candidate = format!("{base} {n}");
        if !used.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn clean_line(text: &str) -> String {
    text.trim()
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

fn spec_for(
    ph: &PlaceholderInfo,
    content_type: &str,
    description: String,
    search_queries: Vec<SearchQuery>,
    role: &str,
) -> PlaceholderContentSpec {
    PlaceholderContentSpec {
        placeholder_idx: ph.idx,
        placeholder_type: ph.kind.as_str().to_string(),
        content_type: content_type.to_string(),
        content_description: description,
        search_queries,
        position_group: ph.position_group.clone(),
        role: role.to_string(),
        dimensions: Dimensions {
            width: ph.width,
            height: ph.height,
            area: ph.area,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_topics_shapes() {
        let wrapped = serde_json::json!({"topics": [{"title": "A", "purpose": "p"}]});
        assert_eq!(extract_topics(wrapped)[0].best_content, "bullets");
        let bare = serde_json::json!([{"title": "A"}, {"title": ""}]);
        assert_eq!(extract_topics(bare).len(), 1);
        let other = serde_json::json!({"items": [{"title": "A"}, {"title": "B"}]});
        assert_eq!(extract_topics(other).len(), 2);
    }

    #[test]
    fn test_numbered_subtitle_is_unique() {
        let used = vec!["Revenue 1".to_string(), "Revenue 2".to_string()];
        assert_eq!(numbered_subtitle("Revenue growth drivers", &used), "Revenue 3");
        assert_eq!(numbered_subtitle("", &[]), "Section 1");
    }

    #[test]
    fn test_validate_assignments() {
        let topics = vec![
            SlideTopic {
                title: "A".into(),
                purpose: "pa".into(),
                best_content: "chart".into(),
                search_focus: String::new(),
            },
            SlideTopic {
                title: "B".into(),
                purpose: "pb".into(),
                best_content: "bullets".into(),
                search_focus: String::new(),
            },
        ];
        let ok = vec![
            Assignment { layout_idx: Some(serde_json::json!(2)), content_type: None },
            Assignment { layout_idx: Some(serde_json::json!("3")), content_type: Some("table".into()) },
        ];
        let bp = validate_assignments(&ok, &topics, &[1, 2, 3]).unwrap();
        assert_eq!(bp[0].content_type, "chart");
        assert_eq!(bp[1].layout_idx, 3);

        let bad = vec![Assignment { layout_idx: Some(serde_json::json!(0)), content_type: None }];
        assert!(validate_assignments(&bad, &topics[..1], &[1, 2]).is_err());
        assert!(validate_assignments(&ok[..1], &topics, &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_determine_content_type() {
        let chart = PlaceholderInfo::new(1, PlaceholderKind::Chart, 0.5, 1.6, 9.0, 5.1);
        let small = PlaceholderInfo::new(2, PlaceholderKind::Body, 0.5, 1.6, 2.0, 1.0);
        assert_eq!(determine_content_type("chart", &chart), "column_chart");
        assert_eq!(determine_content_type("chart", &small), "bullets");
        assert_eq!(determine_content_type("kpi", &small), "kpi");
        assert_eq!(determine_content_type("icon_grid", &small), "bullets");
    }
}
