//! Template layout analysis.
//!
//! Measures every placeholder of every layout and derives what each layout
//! is good for: sections of subtitle plus content, KPI grids, capacity,
//! story type and a handful of scores the planner and matcher rank by.

mod capability;
mod derive;
mod placeholder;
mod report;

use tracing::{debug, info, warn};

use crate::pptx::{SlideLayout, Template};

pub use capability::{
    BulletCapacity, ChartCapacity, ContentCapacity, DensityRecommendation, FillDifficulty,
    KpiGrid, LayoutCategory, LayoutCapability, PictogramCapacity, SectionPattern,
    SemanticSection, StoryType, TableCapacity,
};
pub use placeholder::{classify_role, largest, PlaceholderInfo, PlaceholderRole};
pub use report::{AnalysisExport, LayoutSummary};

/// Analysis of every layout in a template.
#[derive(Debug, Clone)]
pub struct TemplateAnalysis {
    template_name: String,
    slide_size: (f64, f64),
    layouts: Vec<LayoutCapability>,
}

impl TemplateAnalysis {
    /// Analyzes all layouts of the template's first master.
    pub fn analyze(template: &Template) -> Self {
        info!(template = template.name(), layouts = template.layouts().len(), "analyzing template");
        let layouts = template
            .layouts()
            .iter()
            .map(|layout| match analyze_layout(layout) {
                Some(capability) => {
                    debug!(
                        idx = layout.index,
                        name = %layout.name,
                        sections = capability.semantic_sections.len(),
                        content = capability.content_placeholders.len(),
                        story = %capability.semantic_story_type,
                        "layout analyzed"
                    );
                    capability
                }
                None => {
                    warn!(idx = layout.index, name = %layout.name, "layout analysis failed, using fallback");
                    LayoutCapability::fallback(layout.index, &layout.name)
                }
            })
            .collect();

        Self {
            template_name: template.name().to_string(),
            slide_size: template.slide_size_in(),
            layouts,
        }
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Slide width and height in inches.
    pub fn slide_size(&self) -> (f64, f64) {
        self.slide_size
    }

    pub fn layouts(&self) -> &[LayoutCapability] {
        &self.layouts
    }

    pub fn layout(&self, idx: usize) -> Option<&LayoutCapability> {
        self.layouts.get(idx)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

/// Measures and classifies one layout.
///
/// Returns `None` when the layout declares placeholders but none of them
/// has geometry.
pub fn analyze_layout(layout: &SlideLayout) -> Option<LayoutCapability> {
    let mut all = Vec::new();
    for ph in &layout.placeholders {
        match PlaceholderInfo::from_layout(ph) {
            Some(info) => all.push(info),
            None => debug!(layout = layout.index, idx = ph.idx, "placeholder without geometry skipped"),
        }
    }
    if all.is_empty() && !layout.placeholders.is_empty() {
        return None;
    }

    let mut has_title = false;
    let mut has_subtitle = false;
    let mut has_chart = false;
    let mut has_table = false;
    let mut has_picture = false;
    let mut subtitles = Vec::new();
    let mut content = Vec::new();
    let mut text = Vec::new();

    use crate::pptx::PlaceholderKind as K;
    for info in &all {
        match info.kind {
            k if k.is_title() => has_title = true,
            K::SubTitle => {
                has_subtitle = true;
                subtitles.push(info.clone());
            }
            K::Chart => {
                has_chart = true;
                content.push(info.clone());
            }
            K::Tbl => {
                has_table = true;
                content.push(info.clone());
            }
            K::Pic => {
                has_picture = true;
                content.push(info.clone());
            }
            K::Body | K::Obj => {
                if info.role == PlaceholderRole::Subtitle {
                    subtitles.push(info.clone());
                } else {
                    content.push(info.clone());
                    if info.kind == K::Body {
                        text.push(info.clone());
                    }
                }
            }
            _ => {}
        }
    }

    let kpi_grid = derive::detect_kpi_grid(&content);
    let spatial_groups = derive::group_by_spatial_position(&mut content);
    derive::match_subtitles_to_groups(&mut subtitles, &spatial_groups);
    sync_groups(&mut all, &content, &subtitles);
    sync_groups(&mut text, &content, &subtitles);

    let sections = derive::group_semantically(&subtitles, &content);
    let story = derive::infer_story_type(&sections, &content, kpi_grid.as_ref());
    let capacity = derive::content_capacity(&content, &sections, kpi_grid.as_ref());
    let executive_score = derive::executive_score(&sections, &content, &subtitles);
    let layout_story = derive::layout_story(
        &spatial_groups,
        has_chart,
        has_table,
        kpi_grid.as_ref(),
        &sections,
    );
    let layout_type = derive::layout_type(
        has_chart,
        has_table,
        has_picture,
        text.len(),
        sections.len(),
        kpi_grid.as_ref(),
    );
    let best_for = derive::best_use(
        has_chart,
        has_table,
        &content,
        &spatial_groups,
        &sections,
        kpi_grid.as_ref(),
    );
    let complexity = derive::complexity(&sections, &content);
    let balance = derive::balance(&content);
    let (fill_difficulty, verbosity) = derive::fill_difficulty(sections.len(), content.len());
    let suitability = derive::executive_suitability(balance, complexity, sections.len(), story);
    let usable_area: f64 = content.iter().map(|p| p.area).sum();
    let density = derive::density_recommendation(usable_area, sections.len(), story);
    let category = derive::layout_category(has_title, kpi_grid.as_ref(), &content, &layout.name);

    Some(LayoutCapability {
        idx: layout.index,
        name: layout.name.clone(),
        has_title,
        has_subtitle,
        has_chart,
        has_table,
        has_picture,
        subtitle_placeholders: subtitles,
        content_placeholders: content,
        text_placeholders: text,
        all_placeholders: all,
        layout_type: layout_type.to_string(),
        best_for,
        spatial_groups,
        layout_story,
        semantic_sections: sections,
        kpi_grid,
        usable_content_area: usable_area,
        content_capacity: capacity,
        complexity_score: complexity,
        visual_balance: balance,
        fill_difficulty,
        recommended_verbosity: verbosity,
        executive_score,
        semantic_story_type: story,
        executive_suitability: suitability,
        content_density: density,
        layout_category: category,
    })
}

/// Copies group names assigned on the content and subtitle lists.
fn sync_groups(target: &mut [PlaceholderInfo], content: &[PlaceholderInfo], subtitles: &[PlaceholderInfo]) {
    for info in target.iter_mut() {
        if let Some(src) = content
            .iter()
            .chain(subtitles)
            .find(|p| p.idx == info.idx && !p.position_group.is_empty())
        {
            info.position_group = src.position_group.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::{blank_template, Template};

    fn analysis() -> TemplateAnalysis {
        let bytes = blank_template().unwrap();
        TemplateAnalysis::analyze(&Template::from_bytes(&bytes, "Built-in").unwrap())
    }

    #[test]
    fn test_title_slide_is_cover() {
        let a = analysis();
        let cover = a.layout(0).unwrap();
        assert!(cover.has_title);
        assert!(cover.has_subtitle);
        assert!(cover.content_placeholders.is_empty());
        assert_eq!(cover.layout_category, LayoutCategory::Cover);
    }

    #[test]
    fn test_metrics_layout_is_dashboard() {
        let a = analysis();
        let metrics = a.layouts().iter().find(|l| l.name == "Four Metrics").unwrap();
        let grid = metrics.kpi_grid.as_ref().unwrap();
        assert_eq!((grid.rows, grid.cols), (2, 2));
        assert_eq!(metrics.semantic_story_type, StoryType::MetricsDashboard);
        assert_eq!(metrics.layout_type, "kpi_dashboard");
        assert_eq!(metrics.layout_category, LayoutCategory::Kpicards);
        assert!(metrics.supports("kpi_dashboard"));
        assert_eq!(metrics.content_capacity.kpis, 4);
    }

    #[test]
    fn test_comparison_layout_sections() {
        let a = analysis();
        let cmp = a.layouts().iter().find(|l| l.name == "Comparison").unwrap();
        assert_eq!(cmp.semantic_sections.len(), 2);
        assert_eq!(cmp.semantic_story_type, StoryType::BalancedComparison);
        assert!(cmp.supports("comparison"));
        assert!(cmp
            .subtitle_placeholders
            .iter()
            .all(|s| s.position_group.ends_with("_subtitle")));
    }

    #[test]
    fn test_three_columns_narrative() {
        let a = analysis();
        let three = a.layouts().iter().find(|l| l.name == "Three Columns").unwrap();
        assert_eq!(three.semantic_story_type, StoryType::ThreeStageNarrative);
        assert_eq!(three.layout_story, "3 topic sections");
        assert!(three.supports("three_points"));
    }

    #[test]
    fn test_chart_and_blank_layouts() {
        let a = analysis();
        let chart = a.layouts().iter().find(|l| l.name == "Chart").unwrap();
        assert!(chart.has_chart);
        assert_eq!(chart.layout_type, "chart_layout");
        assert!(chart.content_capacity.chart.suitable);

        let blank = a.layouts().iter().find(|l| l.name == "Blank").unwrap();
        assert_eq!(blank.layout_category, LayoutCategory::Blank);
        assert_eq!(blank.best_for, vec!["bullets"]);
    }
}
