use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::analyzer::TemplateAnalysis;
use crate::config::{ExecutionConfig, CLOSING_SLIDE_TITLE, TITLE_SLIDE_SUBTITLE};
use crate::content::{
    font_size_for_area, max_bullets_for_area, word_limit, ChartData, ChartType, ContentGenerator,
    FontScale, KpiData, TableData,
};
use crate::deck::{BulletItem, SlideContent};
use crate::llm::json::parse_json_value;
use crate::llm::{CompletionOptions, SharedLLM};
use crate::matcher::{map_content_to_placeholders, PlaceholderAssignment};
use crate::planning::{ResearchPlan, SectionPlan};
use crate::pptx::{DeckWriter, FontDefaults, PptxError, SlideBuilder, Template, TextStyle};
use crate::research::{SearchExecutor, SearchResults};

use super::log::{FillStatus, PlaceholderLog, SlideLog};
use super::progress::Stage;
use super::prompts::{build_role_prompt, ROLE_SYSTEM_PROMPT};
use super::roles::{map_placeholders, merge_suggestions, FillRole, PlaceholderSlot};

/// Content generated for one placeholder before the slide is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Prepared {
    Subtitle { text: String },
    Chart { chart_data: ChartData },
    Table { table_data: TableData },
    Kpi { kpi_data: KpiData },
    Bullets { bullets: Vec<String> },
}

/// Result of executing a plan.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    /// Slides written, including the title and closing slides.
    pub slides_generated: usize,
    /// Wall time in seconds.
    pub execution_time: f64,
    pub slides: Vec<SlideLog>,
}

/// Turns a reviewed plan into a deck: searches, per-placeholder content and
/// the `.pptx` file with its execution log.
pub struct ExecutionOrchestrator {
    template: Template,
    analysis: TemplateAnalysis,
    llm: SharedLLM,
    generator: ContentGenerator,
    searcher: SearchExecutor,
    content_concurrency: usize,
    validate_roles: bool,
    uploaded_chart: Option<ChartData>,
    progress: Option<mpsc::UnboundedSender<Stage>>,
}

impl ExecutionOrchestrator {
    pub fn new(llm: SharedLLM, template: Template, config: &ExecutionConfig) -> Self {
        let analysis = TemplateAnalysis::analyze(&template);
        Self {
            template,
            analysis,
            generator: ContentGenerator::new(llm.clone()),
            searcher: SearchExecutor::new(llm.clone()).with_concurrency(config.search_concurrency),
            llm,
            content_concurrency: config.content_concurrency.max(1),
            validate_roles: config.llm_role_validation,
            uploaded_chart: None,
            progress: None,
        }
    }

    /// Reports stages on `tx`; a closed receiver is ignored.
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<Stage>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Answers searches from uploaded source material.
    pub fn with_source(mut self, source: Option<&str>) -> Self {
        self.searcher = self.searcher.with_source(source);
        self
    }

    /// Chart data extracted from an upload; it fills the first chart
    /// placeholder of the deck instead of a generated chart.
    pub fn with_chart(mut self, chart: Option<ChartData>) -> Self {
        self.uploaded_chart = chart;
        self
    }

    pub fn analysis(&self) -> &TemplateAnalysis {
        &self.analysis
    }

    /// Executes `plan` and writes the deck to `output_path`.
    ///
    /// A section whose slide cannot be built is logged as failed; the deck
    /// is still written.
    pub async fn execute_plan(
        &self,
        plan: &ResearchPlan,
        output_path: &Path,
    ) -> Result<ExecutionReport, ExecutionError> {
        let started = Instant::now();
        info!(
            sections = plan.sections.len(),
            queries = plan.total_queries,
            template = self.template.name(),
            "executing plan"
        );

        self.emit(Stage::Searching);
        let results = self.searcher.execute_searches(plan.unique_queries()).await;
        info!(searches = results.len(), "searches complete");

        self.emit(Stage::Generating);
        let mut writer = DeckWriter::new(&self.template)?;
        add_title_slide(&mut writer, &plan.query)?;

        let chart_section = self
            .uploaded_chart
            .as_ref()
            .and_then(|_| plan.sections.iter().position(|s| renders(FillRole::Chart, s)));

        let mut slides = Vec::with_capacity(plan.sections.len());
        for (n, section) in plan.sections.iter().enumerate() {
            let number = n + 1;
            let uploaded = if chart_section == Some(n) {
                self.uploaded_chart.as_ref()
            } else {
                None
            };
            match self.render_section(&mut writer, section, &results, number, uploaded).await {
                Ok(entry) => slides.push(entry),
                Err(e) => {
                    error!(slide = number, title = %section.section_title, error = %e, "slide failed");
                    slides.push(SlideLog {
                        slide: number,
                        title: section.section_title.clone(),
                        layout_idx: section.layout_idx,
                        layout_type: section.layout_type.clone(),
                        placeholders_found: 0,
                        placeholders: Vec::new(),
                        status: Some("failed".to_string()),
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let closing = writer.add_slide(0)?;
        closing.set_title(CLOSING_SLIDE_TITLE);

        self.emit(Stage::Rendering);
        let slides_generated = writer.slide_count();
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ExecutionError::io(parent, e))?;
        }
        writer.save(output_path)?;
        info!(path = %output_path.display(), slides = slides_generated, "deck saved");

        let log_path = execution_log_path(output_path);
        let json = serde_json::to_string_pretty(&slides)?;
        std::fs::write(&log_path, json).map_err(|e| ExecutionError::io(&log_path, e))?;
        debug!(path = %log_path.display(), "execution log saved");

        self.emit(Stage::Complete);
        Ok(ExecutionReport {
            output_path: output_path.to_path_buf(),
            log_path,
            slides_generated,
            execution_time: started.elapsed().as_secs_f64(),
            slides,
        })
    }

    async fn render_section(
        &self,
        writer: &mut DeckWriter,
        section: &SectionPlan,
        results: &SearchResults,
        number: usize,
        uploaded: Option<&ChartData>,
    ) -> Result<SlideLog, ExecutionError> {
        let layout = self
            .template
            .layout(section.layout_idx)
            .ok_or(PptxError::LayoutOutOfRange {
                index: section.layout_idx,
                count: self.template.layouts().len(),
            })?;
        info!(
            slide = number,
            title = %section.section_title,
            layout = section.layout_idx,
            content = %section.enforced_content_type,
            "rendering slide"
        );

        let mut slots = map_placeholders(layout);
        if let Some(capability) = self.analysis.layout(section.layout_idx) {
            let suggestions = map_content_to_placeholders(&probe_slide(section), capability);
            merge_suggestions(&mut slots, suggestions);
        }
        if self.validate_roles && !slots.is_empty() {
            self.validate_slot_roles(section, &mut slots).await;
        }
        for slot in slots.values() {
            debug!(idx = slot.idx, kind = %slot.kind, area = slot.area, role = %slot.role, "placeholder");
        }

        let mut prepared = self.prepare_content(section, &slots, results, uploaded).await;

        let slide = writer.add_slide(section.layout_idx)?;
        slide.set_title(&section.section_title);
        let font = self.template.properties().default_font.clone();
        let placeholders = slots
            .values()
            .map(|slot| fill_slot(slide, slot, section, prepared.remove(&slot.idx), &font))
            .collect();

        Ok(SlideLog {
            slide: number,
            title: section.section_title.clone(),
            layout_idx: section.layout_idx,
            layout_type: section.layout_type.clone(),
            placeholders_found: slots.len(),
            placeholders,
            status: None,
            error: None,
        })
    }

    /// Generates content for every fillable slot, at most
    /// `content_concurrency` at a time.
    async fn prepare_content(
        &self,
        section: &SectionPlan,
        slots: &BTreeMap<u32, PlaceholderSlot>,
        results: &SearchResults,
        uploaded: Option<&ChartData>,
    ) -> BTreeMap<u32, Prepared> {
        let uploaded_slot = slots
            .values()
            .find(|slot| slot.role == FillRole::Chart && renders(slot.role, section))
            .map(|slot| slot.idx);
        let jobs: Vec<_> = slots
            .values()
            .filter(|slot| renders(slot.role, section))
            .map(|slot| {
                let facts = facts_for(section, slot.idx, results);
                let generator = self.generator.clone();
                let preset = uploaded.filter(|_| uploaded_slot == Some(slot.idx)).cloned();
                async move {
                    let content = match preset {
                        Some(chart_data) => {
                            debug!(idx = slot.idx, "using uploaded chart data");
                            Prepared::Chart { chart_data }
                        }
                        None => prepare_slot(&generator, section, slot, facts).await,
                    };
                    (slot.idx, content)
                }
            })
            .collect();
        stream::iter(jobs)
            .buffer_unordered(self.content_concurrency)
            .collect()
            .await
    }

    /// Lets the model override inferred roles in one batched call. Any
    /// failure keeps the inferred roles.
    async fn validate_slot_roles(&self, section: &SectionPlan, slots: &mut BTreeMap<u32, PlaceholderSlot>) {
        let prompt = build_role_prompt(&section.section_title, &section.section_purpose, slots.values());
        let options = CompletionOptions::temperature(0.0).with_max_tokens(400).json();
        let response = self
            .llm
            .complete_with_options(ROLE_SYSTEM_PROMPT, &prompt, &options)
            .await
            .and_then(|text| parse_json_value(&text));
        let map = match response {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                debug!("role validation returned no object");
                return;
            }
            Err(e) => {
                debug!(error = %e, "role validation failed");
                return;
            }
        };
        for (key, value) in map {
            let Some(slot) = parse_id(&key).and_then(|idx| slots.get_mut(&idx)) else {
                continue;
            };
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            if let Some(role) = FillRole::fuzzy(&text) {
                if role != slot.role {
                    info!(idx = slot.idx, from = %slot.role, to = %role, "role override");
                    slot.role = role;
                }
            }
        }
    }

    fn emit(&self, stage: Stage) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(stage);
        }
    }
}

/// `deck.pptx` -> `deck.execution.json`.
pub fn execution_log_path(output_path: &Path) -> PathBuf {
    output_path.with_extension("execution.json")
}

fn add_title_slide(writer: &mut DeckWriter, title: &str) -> Result<(), ExecutionError> {
    let slide = writer.add_slide(0)?;
    slide.set_title(title);
    let subtitle = slide
        .layout()
        .placeholders
        .iter()
        .find(|p| p.idx != 0 && !p.kind.is_title() && !p.kind.is_footer())
        .map(|p| p.idx);
    if let Some(idx) = subtitle {
        slide.set_text(idx, TITLE_SLIDE_SUBTITLE, &TextStyle::default())?;
    }
    Ok(())
}

/// Slide content the matcher can map: spec descriptions stand in for
/// bullets, and an enforced chart or table claims the largest placeholder.
fn probe_slide(section: &SectionPlan) -> SlideContent {
    let enforced = section.enforced_content_type.as_str();
    if enforced.contains("chart") {
        let chart_type = ChartType::parse(enforced);
        return SlideContent {
            heading: section.section_title.clone(),
            chart: Some(ChartData::fallback(&section.section_title, chart_type)),
            ..SlideContent::default()
        };
    }
    if enforced.contains("table") {
        return SlideContent {
            heading: section.section_title.clone(),
            table: Some(TableData::fallback()),
            ..SlideContent::default()
        };
    }
    let bullet_points = section
        .placeholder_specs
        .iter()
        .map(|s| {
            if s.content_description.is_empty() {
                s.content_type.clone()
            } else {
                s.content_description.clone()
            }
        })
        .filter(|d| !d.is_empty())
        .map(BulletItem::Text)
        .collect();
    SlideContent {
        heading: section.section_title.clone(),
        bullet_points,
        ..SlideContent::default()
    }
}

/// Whether a role produces content for this section.
fn renders(role: FillRole, section: &SectionPlan) -> bool {
    match role {
        FillRole::Chart => section.enforced_content_type.contains("chart"),
        FillRole::Table => section.enforced_content_type.contains("table"),
        FillRole::Image | FillRole::Icon => false,
        _ => true,
    }
}

/// Facts from the specs targeting `idx`, else every fact of the section.
fn facts_for(section: &SectionPlan, idx: u32, results: &SearchResults) -> Vec<String> {
    let collect = |queries: Vec<&str>| -> Vec<String> {
        queries
            .into_iter()
            .filter_map(|q| results.get(q.trim()))
            .flatten()
            .cloned()
            .collect()
    };
    let targeted = collect(
        section
            .specs_for(idx)
            .flat_map(|s| s.search_queries.iter())
            .map(|q| q.query.as_str())
            .collect(),
    );
    if !targeted.is_empty() {
        return targeted;
    }
    collect(section.queries().map(|q| q.query.as_str()).collect())
}

/// Chart family from the placeholder's spec, else the section's enforced type.
fn chart_type_for(section: &SectionPlan, idx: u32) -> ChartType {
    section
        .specs_for(idx)
        .map(|s| s.content_type.as_str())
        .find(|t| t.contains("chart"))
        .map(ChartType::parse)
        .unwrap_or_else(|| ChartType::parse(&section.enforced_content_type))
}

async fn prepare_slot(
    generator: &ContentGenerator,
    section: &SectionPlan,
    slot: &PlaceholderSlot,
    facts: Vec<String>,
) -> Prepared {
    let title = section.section_title.as_str();
    let purpose = section.section_purpose.as_str();
    match slot.role {
        FillRole::Subtitle => {
            let text = match &slot.suggested {
                Some(PlaceholderAssignment::Subtitle { text }) if !text.trim().is_empty() => text.clone(),
                _ => {
                    let head: Vec<String> = facts.iter().take(3).cloned().collect();
                    generator.generate_subtitle(title, purpose, &head).await
                }
            };
            Prepared::Subtitle { text }
        }
        FillRole::Chart => {
            let chart_type = chart_type_for(section, slot.idx);
            let chart_data = generator.generate_chart(title, purpose, &facts, chart_type).await;
            Prepared::Chart { chart_data }
        }
        FillRole::Table => Prepared::Table {
            table_data: generator.generate_table(title, purpose, &facts).await,
        },
        FillRole::Kpi => {
            let fact = facts
                .first()
                .cloned()
                .unwrap_or_else(|| format!("KPI for {title}"));
            Prepared::Kpi {
                kpi_data: generator.generate_kpi(title, &fact).await,
            }
        }
        FillRole::Content | FillRole::MainContent | FillRole::Image | FillRole::Icon => {
            let max_bullets = max_bullets_for_area(slot.area);
            let max_words = word_limit(slot.width, slot.height, max_bullets);
            let bullets = generator
                .generate_bullets(title, purpose, &facts, max_bullets, max_words)
                .await;
            Prepared::Bullets { bullets }
        }
    }
}

fn fill_slot(
    slide: &mut SlideBuilder,
    slot: &PlaceholderSlot,
    section: &SectionPlan,
    prepared: Option<Prepared>,
    font: &FontDefaults,
) -> PlaceholderLog {
    let (idx, role) = (slot.idx, slot.role);
    if !renders(role, section) {
        debug!(idx, role = %role, "placeholder skipped");
        return PlaceholderLog::status(idx, role, FillStatus::Skipped);
    }
    let Some(content) = prepared else {
        return PlaceholderLog::status(idx, role, FillStatus::NoData);
    };

    let result = match &content {
        Prepared::Subtitle { text } => {
            let style = TextStyle::sized(font.size_pt * 0.8).font(font.name.clone());
            slide.set_text(idx, text, &style)
        }
        Prepared::Chart { chart_data } => slide.set_chart(idx, chart_data),
        Prepared::Table { table_data } => {
            if table_data.headers.is_empty() || table_data.rows.is_empty() {
                return PlaceholderLog::status(idx, role, FillStatus::NoData);
            }
            slide.set_table(idx, table_data)
        }
        Prepared::Kpi { kpi_data } => slide.set_kpi(
            idx,
            kpi_data,
            font_size_for_area(slot.area, font.size_pt, FontScale::Large),
            font_size_for_area(slot.area, font.size_pt, FontScale::Small),
        ),
        Prepared::Bullets { bullets } => {
            let items: Vec<(String, u32)> = bullets.iter().map(|b| (b.clone(), 0)).collect();
            let style = TextStyle::sized(font.size_pt).font(font.name.clone());
            slide.set_bullets(idx, &items, &style)
        }
    };

    match result {
        Ok(()) => PlaceholderLog::filled(idx, role, serde_json::to_value(&content).unwrap_or_default()),
        Err(e) => {
            warn!(idx, role = %role, error = %e, "placeholder fill failed");
            PlaceholderLog::failed(idx, role, e)
        }
    }
}

fn parse_id(key: &str) -> Option<u32> {
    let key = key.trim();
    key.parse::<u32>().ok().or_else(|| {
        key.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u32)
    })
}

/// Errors that stop a plan from being executed.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Presentation error: {0}")]
    Pptx(#[from] PptxError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExecutionError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExecutionError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::{Dimensions, PlaceholderContentSpec, SearchQuery};

    fn section(enforced: &str) -> SectionPlan {
        let spec = |idx: u32, query: &str, content_type: &str| PlaceholderContentSpec {
            placeholder_idx: idx,
            placeholder_type: "obj".to_string(),
            content_type: content_type.to_string(),
            content_description: "Revenue trend".to_string(),
            search_queries: vec![SearchQuery::new(query, "Revenue")],
            position_group: "center".to_string(),
            role: "content".to_string(),
            dimensions: Dimensions::default(),
        };
        SectionPlan {
            section_title: "Revenue".to_string(),
            section_purpose: "Revenue growth".to_string(),
            layout_type: "single_column".to_string(),
            layout_idx: 1,
            layout_story: String::new(),
            placeholder_specs: vec![spec(1, "q1", "line_chart"), spec(2, "q2", "bullets")],
            total_search_queries: 2,
            enforced_content_type: enforced.to_string(),
        }
    }

    fn results() -> SearchResults {
        let mut results = SearchResults::new();
        results.insert("q1".to_string(), vec!["Revenue: $10B (FY2024)".to_string()]);
        results.insert("q2".to_string(), vec!["Margin: 40% (FY2024)".to_string()]);
        results
    }

    #[test]
    fn test_facts_for_prefers_targeted_specs() {
        let s = section("bullets");
        assert_eq!(facts_for(&s, 2, &results()), vec!["Margin: 40% (FY2024)".to_string()]);
        assert_eq!(facts_for(&s, 9, &results()).len(), 2);
    }

    #[test]
    fn test_facts_for_matches_padded_queries() {
        let mut s = section("bullets");
        s.placeholder_specs[1].search_queries = vec![SearchQuery::new("  q2 ", "Margin")];
        assert_eq!(facts_for(&s, 2, &results()), vec!["Margin: 40% (FY2024)".to_string()]);
    }

    #[test]
    fn test_chart_and_table_render_only_when_enforced() {
        assert!(!renders(FillRole::Chart, &section("bullets")));
        assert!(renders(FillRole::Chart, &section("line_chart")));
        assert!(!renders(FillRole::Table, &section("chart")));
        assert!(renders(FillRole::Table, &section("comparison_table")));
        assert!(!renders(FillRole::Image, &section("bullets")));
        assert!(renders(FillRole::Kpi, &section("bullets")));
    }

    #[test]
    fn test_chart_type_from_spec() {
        assert_eq!(chart_type_for(&section("chart"), 1), ChartType::Line);
        assert_eq!(chart_type_for(&section("pie_chart"), 2), ChartType::Pie);
    }

    #[test]
    fn test_probe_slide_claims_enforced_chart() {
        assert!(probe_slide(&section("line_chart")).chart.is_some());
        assert!(probe_slide(&section("table")).table.is_some());
        let probe = probe_slide(&section("bullets"));
        assert!(probe.chart.is_none());
        assert_eq!(probe.bullet_points.len(), 2);
    }

    #[test]
    fn test_log_path_and_ids() {
        assert_eq!(
            execution_log_path(Path::new("out/deck.pptx")),
            PathBuf::from("out/deck.execution.json")
        );
        assert_eq!(parse_id("3"), Some(3));
        assert_eq!(parse_id("4.0"), Some(4));
        assert_eq!(parse_id("x"), None);
    }
}
