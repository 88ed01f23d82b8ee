//! Matching slide content to template layouts.
//!
//! [`ContentMatcher`] ranks every body layout of an analyzed template for a
//! slide, mixing content fit with the position of the slide in an
//! opening/body/closing story arc, and keeps enough history to avoid
//! repeating the same layout or story type.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyzer::{largest, FillDifficulty, LayoutCapability, StoryType, TemplateAnalysis};
use crate::content::{ChartData, TableData};
use crate::deck::{BulletItem, SlideContent, ICON_MARKER};

/// Maximum number of past selections remembered.
const HISTORY_LIMIT: usize = 50;

/// Story types cycled through the body of a deck.
const BODY_STORIES: [StoryType; 7] = [
    StoryType::DataVisualization,
    StoryType::BalancedComparison,
    StoryType::ThreeStageNarrative,
    StoryType::MetricsDashboard,
    StoryType::DetailedAnalysis,
    StoryType::HierarchicalStory,
    StoryType::FeatureGrid,
];

/// Pairs of story types that can stand in for one another.
const COMPATIBLE_STORIES: [[StoryType; 2]; 4] = [
    [StoryType::DataVisualization, StoryType::MetricsDashboard],
    [StoryType::BalancedComparison, StoryType::HierarchicalStory],
    [StoryType::ThreeStageNarrative, StoryType::FeatureGrid],
    [StoryType::FocusedMessage, StoryType::MainSupporting],
];

/// The kind of content a slide carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Chart,
    Table,
    Bullets,
    Pictogram,
    KpiDashboard,
    Comparison,
}

impl SlideKind {
    /// Name as used in a layout's `best_for` list.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Table => "table",
            Self::Bullets => "bullets",
            Self::Pictogram => "pictogram",
            Self::KpiDashboard => "kpi_dashboard",
            Self::Comparison => "comparison",
        }
    }
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart, then table, then the shape of the bullets decides.
pub fn infer_content_type(slide: &SlideContent) -> SlideKind {
    if slide.chart.is_some() {
        return SlideKind::Chart;
    }
    if slide.table.is_some() {
        return SlideKind::Table;
    }
    let bullets = &slide.bullet_points;
    if bullets.is_empty() {
        return SlideKind::Bullets;
    }
    if bullets
        .iter()
        .all(|b| b.as_text().is_some_and(|t| t.contains(ICON_MARKER)))
    {
        return SlideKind::Pictogram;
    }
    if bullets.iter().all(|b| b.as_group().is_some()) {
        let short_headings = bullets
            .iter()
            .filter_map(BulletItem::as_group)
            .all(|g| g.heading.chars().count() < 20);
        return if bullets.len() >= 4 && short_headings {
            SlideKind::KpiDashboard
        } else {
            SlideKind::Comparison
        };
    }
    SlideKind::Bullets
}

pub fn is_compatible_story(layout_story: StoryType, preferred: StoryType) -> bool {
    COMPATIBLE_STORIES
        .iter()
        .any(|pair| pair.contains(&layout_story) && pair.contains(&preferred))
}

/// Preferred story type per slide position.
///
/// A tenth of the slides (at least one) open with a focused message, 70%
/// cycle through the body stories, and the rest close on metrics with a
/// final focused message.
pub fn build_section_sequence(total: usize) -> Vec<StoryType> {
    let opening = (total / 10).max(1);
    let body = total * 7 / 10;
    let closing = total.saturating_sub(opening + body);

    let mut sequence = vec![StoryType::FocusedMessage; opening];
    sequence.extend((0..body).map(|i| BODY_STORIES[i % BODY_STORIES.len()]));
    sequence.extend((0..closing).map(|i| {
        if i + 1 == closing {
            StoryType::FocusedMessage
        } else {
            StoryType::MetricsDashboard
        }
    }));
    sequence
}

/// Rough line count of a bullet list: one line per 50 characters, two
/// extra lines per group heading.
pub fn estimate_bullet_lines(items: &[BulletItem]) -> usize {
    items
        .iter()
        .map(|item| match item {
            BulletItem::Text(text) => (text.chars().count() / 50).max(1),
            BulletItem::Nested(inner) => estimate_bullet_lines(inner),
            BulletItem::Group(group) => 2 + estimate_bullet_lines(&group.bullet_points),
        })
        .sum()
}

/// Fit of a layout for a kind of content, 0 to 100.
pub fn score_layout_for_content(layout: &LayoutCapability, kind: SlideKind, slide: &SlideContent) -> f64 {
    let mut score = 0.0;
    if layout.supports(kind.as_str()) {
        score += 40.0;
    }
    score += match kind {
        SlideKind::Chart => score_chart(layout),
        SlideKind::Table => score_table(layout, slide),
        SlideKind::KpiDashboard => score_kpi(layout, slide),
        SlideKind::Pictogram => score_pictogram(layout, slide),
        SlideKind::Comparison => score_comparison(layout, slide),
        SlideKind::Bullets => score_bullets(layout, slide),
    };
    if layout.visual_balance > 70.0 {
        score += 5.0;
    }
    if layout.fill_difficulty == FillDifficulty::Easy {
        score += 3.0;
    }
    score.min(100.0)
}

fn score_chart(layout: &LayoutCapability) -> f64 {
    let mut score = 0.0;
    let chart = &layout.content_capacity.chart;
    if chart.suitable {
        score += 30.0;
        if chart.available_area > 50.0 {
            score += 10.0;
        }
    }
    if let [section] = layout.semantic_sections.as_slice() {
        if let [area] = section.content_areas.as_slice() {
            if area.is_large {
                score += 20.0;
            }
        }
    }
    score
}

fn score_table(layout: &LayoutCapability, slide: &SlideContent) -> f64 {
    let (needed_cols, needed_rows) = slide
        .table
        .as_ref()
        .map_or((0, 0), |t| (t.headers.len(), t.rows.len()));
    let capacity = &layout.content_capacity.table;

    let mut score = if capacity.max_cols >= needed_cols && capacity.max_rows >= needed_rows {
        if capacity.max_cols <= needed_cols + 2 {
            50.0
        } else {
            40.0
        }
    } else {
        10.0
    };
    if layout.semantic_sections.len() == 1 {
        score += 10.0;
    }
    score
}

fn score_kpi(layout: &LayoutCapability, slide: &SlideContent) -> f64 {
    let needed = slide.bullet_points.len();
    if layout.kpi_grid.is_some() {
        let available = layout.content_capacity.kpis;
        match available.cmp(&needed) {
            std::cmp::Ordering::Equal => 60.0,
            std::cmp::Ordering::Greater => 50.0,
            std::cmp::Ordering::Less => 0.0,
        }
    } else {
        let small = layout.content_placeholders.iter().filter(|p| p.is_small).count();
        if small >= needed {
            30.0
        } else {
            0.0
        }
    }
}

fn score_pictogram(layout: &LayoutCapability, slide: &SlideContent) -> f64 {
    let needed = slide.bullet_points.len();
    let mut score = 0.0;
    let pictograms = &layout.content_capacity.pictograms;
    if pictograms.suitable && pictograms.estimated_count >= needed {
        score += 40.0;
        if pictograms.estimated_count.abs_diff(needed) <= 1 {
            score += 10.0;
        }
    }
    if layout
        .content_placeholders
        .iter()
        .any(|p| p.is_medium && p.is_wide)
    {
        score += 10.0;
    }
    score
}

fn score_comparison(layout: &LayoutCapability, slide: &SlideContent) -> f64 {
    let needed = match slide.bullet_points.first() {
        Some(BulletItem::Group(_)) => slide.bullet_points.len(),
        _ => 2,
    };
    let sections = layout.semantic_sections.len();
    let mut score = match sections.abs_diff(needed) {
        0 => 50.0,
        1 => 30.0,
        _ => 0.0,
    };
    if needed == 2 && layout.spatial_groups.iter().any(|(name, _)| name == "left_column") {
        score += 10.0;
    }
    score
}

fn score_bullets(layout: &LayoutCapability, slide: &SlideContent) -> f64 {
    let lines = estimate_bullet_lines(&slide.bullet_points);
    let target = layout.content_density.bullets_recommended;
    let capacity = layout.content_capacity.bullets.max_lines;

    let mut score = if lines.abs_diff(target) <= 2 {
        50.0
    } else if capacity >= lines {
        if capacity <= lines + 5 {
            50.0
        } else {
            40.0
        }
    } else {
        20.0
    };
    if layout.executive_suitability >= 70.0 {
        score += 10.0;
    }
    score
}

/// What goes into one placeholder of a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaceholderAssignment {
    Chart { data: ChartData },
    Table { data: TableData },
    Subtitle { text: String },
    Bullets { items: Vec<BulletItem> },
    Icon { spec: String },
}

impl PlaceholderAssignment {
    pub fn role(&self) -> &'static str {
        match self {
            Self::Chart { .. } => "chart",
            Self::Table { .. } => "table",
            Self::Subtitle { .. } => "subtitle",
            Self::Bullets { .. } => "bullets",
            Self::Icon { .. } => "icon",
        }
    }
}

/// Maps slide content onto the placeholders of a layout, keyed by
/// placeholder idx.
///
/// Charts and tables take the largest content area; headed groups fill one
/// section each on multi-section layouts; pictograms fill KPI boxes or
/// content areas left to right; plain bullets take the largest area.
pub fn map_content_to_placeholders(
    slide: &SlideContent,
    layout: &LayoutCapability,
) -> BTreeMap<u32, PlaceholderAssignment> {
    let mut mapping = BTreeMap::new();
    let biggest = largest(&layout.content_placeholders);

    if let Some(chart) = &slide.chart {
        if let Some(ph) = biggest {
            mapping.insert(ph.idx, PlaceholderAssignment::Chart { data: chart.clone() });
        }
        return mapping;
    }
    if let Some(table) = &slide.table {
        if let Some(ph) = biggest {
            mapping.insert(ph.idx, PlaceholderAssignment::Table { data: table.clone() });
        }
        return mapping;
    }

    let sections = &layout.semantic_sections;
    if sections.len() >= 2 {
        if matches!(slide.bullet_points.first(), Some(BulletItem::Group(_))) {
            for (i, (group, section)) in slide.groups().zip(sections).enumerate() {
                let text = if group.heading.is_empty() {
                    format!("Section {}", i + 1)
                } else {
                    group.heading.clone()
                };
                mapping.insert(section.subtitle.idx, PlaceholderAssignment::Subtitle { text });
                if let Some(area) = section.content_areas.first() {
                    mapping.insert(
                        area.idx,
                        PlaceholderAssignment::Bullets {
                            items: group.bullet_points.clone(),
                        },
                    );
                }
            }
        }
        return mapping;
    }

    if slide.is_icon_slide() {
        let items = slide
            .bullet_points
            .iter()
            .filter_map(BulletItem::as_text)
            .filter(|t| t.contains(ICON_MARKER));
        let targets: Vec<u32> = match &layout.kpi_grid {
            Some(grid) => grid.boxes.iter().map(|b| b.idx).collect(),
            None => {
                let mut content: Vec<_> = layout.content_placeholders.iter().collect();
                content.sort_by(|a, b| a.left.total_cmp(&b.left));
                content.iter().map(|p| p.idx).collect()
            }
        };
        for (idx, item) in targets.into_iter().zip(items) {
            mapping.insert(idx, PlaceholderAssignment::Icon { spec: item.to_string() });
        }
        return mapping;
    }

    if !slide.bullet_points.is_empty() {
        if let Some(ph) = biggest {
            mapping.insert(
                ph.idx,
                PlaceholderAssignment::Bullets {
                    items: slide.bullet_points.clone(),
                },
            );
        }
    }
    mapping
}

/// Layout selection with memory of earlier choices.
pub struct ContentMatcher<'a> {
    analysis: &'a TemplateAnalysis,
    used_layouts: Vec<usize>,
    used_stories: Vec<StoryType>,
    sequence: Vec<StoryType>,
}

impl<'a> ContentMatcher<'a> {
    pub fn new(analysis: &'a TemplateAnalysis) -> Self {
        Self {
            analysis,
            used_layouts: Vec::new(),
            used_stories: Vec::new(),
            sequence: Vec::new(),
        }
    }

    pub fn used_layouts(&self) -> &[usize] {
        &self.used_layouts
    }

    /// Body layouts: everything but the title layout.
    fn candidates(&self) -> impl Iterator<Item = &'a LayoutCapability> {
        self.analysis.layouts().iter().filter(|l| l.idx != 0)
    }

    fn fallback_layout(&self) -> usize {
        if self.analysis.len() > 1 {
            1
        } else {
            0
        }
    }

    /// Best layout by content fit, story position, executive suitability
    /// and recent use. Does not record the choice.
    pub fn select_layout_with_story_awareness(
        &mut self,
        slide: &SlideContent,
        slide_index: usize,
        total_slides: usize,
    ) -> usize {
        if self.sequence.is_empty() {
            self.sequence = build_section_sequence(total_slides);
        }
        let preferred = self
            .sequence
            .get(slide_index.min(self.sequence.len().saturating_sub(1)))
            .copied()
            .unwrap_or(StoryType::FocusedMessage);
        let kind = infer_content_type(slide);

        let recent: &[usize] = &self.used_layouts[self.used_layouts.len().saturating_sub(5)..];
        let last_two: &[usize] = &self.used_layouts[self.used_layouts.len().saturating_sub(2)..];

        let mut best: Option<(f64, &LayoutCapability)> = None;
        for layout in self.candidates() {
            let mut score = score_layout_for_content(layout, kind, slide);
            if layout.semantic_story_type == preferred {
                score += 30.0;
            } else if is_compatible_story(layout.semantic_story_type, preferred) {
                score += 15.0;
            }
            score += layout.executive_suitability / 100.0 * 20.0;
            if self.used_layouts.len() >= 2 && !last_two.contains(&layout.idx) {
                score += 10.0;
            }
            if recent.iter().filter(|&&i| i == layout.idx).count() >= 2 {
                score -= 20.0;
            }
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, layout));
            }
        }

        match best {
            Some((score, layout)) => {
                info!(
                    slide = slide_index + 1,
                    total = total_slides,
                    layout = layout.idx,
                    name = %layout.name,
                    score,
                    story = %layout.semantic_story_type,
                    preferred = %preferred,
                    "layout selected"
                );
                layout.idx
            }
            None => {
                debug!(slide = slide_index + 1, "no body layout available");
                self.fallback_layout()
            }
        }
    }

    /// Story-aware selection that also refuses a third consecutive slide of
    /// the same story type when an alternative scores within 12 points.
    /// Records the final choice.
    pub fn select_layout_for_slide(
        &mut self,
        slide: &SlideContent,
        slide_index: usize,
        total_slides: usize,
    ) -> usize {
        let mut chosen = self.select_layout_with_story_awareness(slide, slide_index, total_slides);
        let story = self.analysis.layout(chosen).map(|l| l.semantic_story_type);

        let n = self.used_stories.len();
        if n >= 2 && story.is_some_and(|s| self.used_stories[n - 1] == s && self.used_stories[n - 2] == s) {
            if let (Some(current), Some(story)) = (self.analysis.layout(chosen), story) {
                let kind = infer_content_type(slide);
                let baseline = score_layout_for_content(current, kind, slide);
                let recent_stories = &self.used_stories[n.saturating_sub(3)..];

                let mut best: Option<(f64, usize)> = None;
                for layout in self.candidates() {
                    if layout.idx == chosen || layout.semantic_story_type == story {
                        continue;
                    }
                    let score = score_layout_for_content(layout, kind, slide);
                    if score < baseline - 12.0 {
                        continue;
                    }
                    let adjusted = if recent_stories.contains(&layout.semantic_story_type) {
                        score - 5.0
                    } else {
                        score
                    };
                    if best.map_or(true, |(s, _)| adjusted > s) {
                        best = Some((adjusted, layout.idx));
                    }
                }
                if let Some((_, alt)) = best {
                    info!(from = chosen, to = alt, story = %story, "avoiding third consecutive story type");
                    chosen = alt;
                }
            }
        }

        self.record(chosen);
        chosen
    }

    /// Adds a layout chosen elsewhere to the history the diversity rules read.
    pub fn record(&mut self, idx: usize) {
        self.used_layouts.push(idx);
        if self.used_layouts.len() > HISTORY_LIMIT {
            self.used_layouts.remove(0);
        }
        let story = self
            .analysis
            .layout(idx)
            .map(|l| l.semantic_story_type)
            .unwrap_or_default();
        self.used_stories.push(story);
        if self.used_stories.len() > HISTORY_LIMIT {
            self.used_stories.remove(0);
        }
    }
}
