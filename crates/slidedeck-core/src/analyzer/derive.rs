//! Per-layout derivations over measured placeholders.
//!
//! Distances and sizes are inches, areas square inches.

use super::capability::{
    BulletCapacity, ChartCapacity, ContentCapacity, DensityRecommendation, FillDifficulty,
    KpiGrid, LayoutCategory, PictogramCapacity, SectionPattern, SemanticSection, StoryType,
    TableCapacity,
};
use super::placeholder::{largest, PlaceholderInfo};

type Groups = Vec<(String, Vec<PlaceholderInfo>)>;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn max_deviation(values: &[f64], avg: f64) -> f64 {
    values.iter().map(|a| (a - avg).abs()).fold(0.0, f64::max)
}

/// Rounds to one decimal, as an integer key.
fn tenth(x: f64) -> i64 {
    (x * 10.0).round() as i64
}

fn members(content: &[PlaceholderInfo], pred: impl Fn(&PlaceholderInfo) -> bool) -> Vec<usize> {
    content
        .iter()
        .enumerate()
        .filter(|(_, p)| pred(p))
        .map(|(i, _)| i)
        .collect()
}

/// Four or more small boxes laid out in at least two rows of two, all
/// within 30% of the mean area.
pub fn detect_kpi_grid(content: &[PlaceholderInfo]) -> Option<KpiGrid> {
    let small: Vec<PlaceholderInfo> = content.iter().filter(|p| p.is_small).cloned().collect();
    if small.len() < 4 {
        return None;
    }

    // Rows keyed by top rounded to a third of an inch, in first-seen order.
    let mut rows: Vec<(i64, usize)> = Vec::new();
    for b in &small {
        let key = (b.top * 3.0).round() as i64;
        match rows.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => rows.push((key, 1)),
        }
    }
    if rows.len() < 2 || rows.iter().any(|(_, n)| *n < 2) {
        return None;
    }

    let areas: Vec<f64> = small.iter().map(|b| b.area).collect();
    let avg = mean(&areas);
    if max_deviation(&areas, avg) > avg * 0.3 {
        return None;
    }

    Some(KpiGrid {
        rows: rows.len(),
        cols: rows[0].1,
        total_area: areas.iter().sum(),
        avg_box_size: avg,
        boxes: small,
    })
}

/// Groups content by distinct left and top positions and records the group
/// name on each placeholder.
pub fn group_by_spatial_position(content: &mut [PlaceholderInfo]) -> Groups {
    if content.is_empty() {
        return Vec::new();
    }

    let mut lefts: Vec<i64> = content.iter().map(|p| tenth(p.left)).collect();
    lefts.sort_unstable();
    lefts.dedup();
    let mut tops: Vec<i64> = content.iter().map(|p| tenth(p.top)).collect();
    tops.sort_unstable();
    tops.dedup();

    let mut named: Vec<(String, Vec<usize>)> = Vec::new();
    match lefts.len() {
        1 if tops.len() == 1 => named.push(("center".into(), (0..content.len()).collect())),
        1 => {
            for (i, top) in tops.iter().enumerate() {
                named.push((
                    format!("row_{}", i + 1),
                    members(content, |p| tenth(p.top) == *top),
                ));
            }
        }
        2 => {
            let mid = (lefts[0] + lefts[1]) as f64 / 20.0;
            named.push(("left_column".into(), members(content, |p| p.left < mid)));
            named.push(("right_column".into(), members(content, |p| p.left >= mid)));
        }
        3 => {
            for (name, key) in ["left_column", "center_column", "right_column"]
                .iter()
                .zip(&lefts)
            {
                named.push((name.to_string(), members(content, |p| tenth(p.left) == *key)));
            }
        }
        _ => {
            for i in 0..content.len() {
                named.push((format!("cell_{}", i + 1), vec![i]));
            }
        }
    }

    for (name, members) in &named {
        for &i in members {
            content[i].position_group = name.clone();
        }
    }
    named
        .into_iter()
        .map(|(name, members)| (name, members.iter().map(|&i| content[i].clone()).collect()))
        .collect()
}

/// Names each subtitle after the group whose first box is vertically closest.
pub fn match_subtitles_to_groups(subtitles: &mut [PlaceholderInfo], groups: &Groups) {
    for subtitle in subtitles.iter_mut() {
        let mut closest: Option<(&str, f64)> = None;
        for (name, members) in groups {
            let Some(first) = members.first() else {
                continue;
            };
            let dist = (subtitle.top - first.top).abs();
            if closest.map_or(true, |(_, d)| dist < d) {
                closest = Some((name.as_str(), dist));
            }
        }
        if let Some((name, _)) = closest {
            subtitle.position_group = format!("{name}_subtitle");
        }
    }
}

/// Pairs each subtitle with the unclaimed content boxes just below it.
pub fn group_semantically(
    subtitles: &[PlaceholderInfo],
    content: &[PlaceholderInfo],
) -> Vec<SemanticSection> {
    let mut ordered: Vec<&PlaceholderInfo> = subtitles.iter().collect();
    ordered.sort_by(|a, b| a.top.total_cmp(&b.top));

    let mut used: Vec<u32> = Vec::new();
    let mut sections = Vec::new();
    for subtitle in ordered {
        let mut related = Vec::new();
        for c in content {
            if used.contains(&c.idx) {
                continue;
            }
            let below = c.top - subtitle.top;
            if !(below > 0.0 && below < 1.0) {
                continue;
            }
            if (c.left - subtitle.left).abs() > 1.5 {
                continue;
            }
            used.push(c.idx);
            related.push(c.clone());
        }
        if related.is_empty() {
            continue;
        }
        let pattern = section_pattern(&related);
        sections.push(SemanticSection {
            section_id: format!("section_{}", subtitle.idx),
            subtitle: subtitle.clone(),
            total_capacity: related.iter().map(|c| c.area).sum(),
            best_for: section_best_for(&related, pattern),
            layout_pattern: pattern,
            content_areas: related,
        });
    }
    sections
}

fn section_pattern(areas: &[PlaceholderInfo]) -> SectionPattern {
    if areas.len() == 1 {
        return SectionPattern::Single;
    }
    if areas.iter().filter(|c| c.is_small).count() >= 3 {
        return SectionPattern::Grid;
    }
    let mut by_left: Vec<&PlaceholderInfo> = areas.iter().collect();
    by_left.sort_by(|a, b| a.left.total_cmp(&b.left));
    if (by_left[0].top - by_left[1].top).abs() < 0.5 {
        return SectionPattern::Columns;
    }
    SectionPattern::Mixed
}

fn section_best_for(areas: &[PlaceholderInfo], pattern: SectionPattern) -> Vec<String> {
    let names: &[&str] = match pattern {
        SectionPattern::Single if areas[0].is_large => &["chart", "table", "bullets"],
        SectionPattern::Single if areas[0].is_medium => &["bullets", "pictogram"],
        SectionPattern::Single | SectionPattern::Mixed => &[],
        SectionPattern::Grid => &["kpi_dashboard", "icon_grid"],
        SectionPattern::Columns => &["comparison", "bullets"],
    };
    names.iter().map(|s| s.to_string()).collect()
}

pub fn infer_story_type(
    sections: &[SemanticSection],
    content: &[PlaceholderInfo],
    kpi_grid: Option<&KpiGrid>,
) -> StoryType {
    if kpi_grid.is_some() {
        return StoryType::MetricsDashboard;
    }
    match sections.len() {
        1 => {
            return match largest(content) {
                Some(l) if l.area > 40.0 && l.aspect_ratio > 1.5 => StoryType::DataVisualization,
                Some(l) if l.area > 40.0 => StoryType::DetailedAnalysis,
                _ => StoryType::FocusedMessage,
            };
        }
        2 => {
            let a: f64 = sections[0].content_areas.iter().map(|p| p.area).sum();
            let b: f64 = sections[1].content_areas.iter().map(|p| p.area).sum();
            return if (a - b).abs() < 5.0 {
                StoryType::BalancedComparison
            } else {
                StoryType::MainSupporting
            };
        }
        3 => return StoryType::ThreeStageNarrative,
        _ => {}
    }
    if content.len() >= 6 && content.iter().all(|p| p.is_small) {
        return StoryType::FeatureGrid;
    }
    let large = content.iter().filter(|p| p.is_large).count();
    let small = content.iter().filter(|p| p.is_small).count();
    if large >= 1 && small >= 2 {
        return StoryType::HierarchicalStory;
    }
    StoryType::GeneralContent
}

pub fn content_capacity(
    content: &[PlaceholderInfo],
    sections: &[SemanticSection],
    kpi_grid: Option<&KpiGrid>,
) -> ContentCapacity {
    let bullets = largest(content.iter().filter(|p| p.height > 1.0))
        .map(|l| BulletCapacity {
            max_lines: (l.height / 0.3) as usize,
            chars_per_line: (l.width * 8.0) as usize,
            estimated_words: (l.area * 20.0) as usize,
        })
        .unwrap_or_default();

    let table = largest(content)
        .map(|l| TableCapacity {
            max_cols: ((l.width / 1.5) as usize).max(2),
            max_rows: ((l.height / 0.4) as usize).max(3),
        })
        .unwrap_or_default();

    let large_max = content
        .iter()
        .filter(|p| p.is_large)
        .map(|p| p.area)
        .fold(None, |m: Option<f64>, a| Some(m.map_or(a, |m| m.max(a))));
    let chart = match large_max {
        Some(area) => ChartCapacity {
            suitable: true,
            available_area: area,
            ..ChartCapacity::default()
        },
        None => ChartCapacity::default(),
    };

    let pictograms = content
        .iter()
        .find(|p| p.is_medium && p.is_wide)
        .map(|p| PictogramCapacity {
            suitable: true,
            estimated_count: (p.width / 1.5) as usize,
        })
        .unwrap_or_default();

    ContentCapacity {
        bullets,
        table,
        chart,
        kpis: kpi_grid.map_or(0, |g| g.boxes.len()),
        pictograms,
        sections: sections.len(),
    }
}

pub fn executive_score(
    sections: &[SemanticSection],
    content: &[PlaceholderInfo],
    subtitles: &[PlaceholderInfo],
) -> f64 {
    let mut score: f64 = 50.0;
    match sections.len() {
        1..=3 => score += 20.0,
        n if n > 5 => score -= 15.0,
        _ => {}
    }
    if !subtitles.is_empty() {
        score += 15.0;
    }
    if content.iter().filter(|p| p.height > 3.0).count() > 2 {
        score -= 10.0;
    }
    if has_visual_balance(content) {
        score += 15.0;
    }
    score.clamp(0.0, 100.0)
}

fn has_visual_balance(content: &[PlaceholderInfo]) -> bool {
    if content.len() < 2 {
        return true;
    }
    let areas: Vec<f64> = content.iter().map(|p| p.area).collect();
    let avg = mean(&areas);
    avg > 0.0 && max_deviation(&areas, avg) / avg < 1.0
}

pub fn layout_story(
    groups: &Groups,
    has_chart: bool,
    has_table: bool,
    kpi_grid: Option<&KpiGrid>,
    sections: &[SemanticSection],
) -> String {
    if let Some(grid) = kpi_grid {
        return format!("KPI Dashboard ({}x{} metrics)", grid.rows, grid.cols);
    }
    if sections.len() >= 3 {
        return format!("{} topic sections", sections.len());
    }
    if has_chart {
        return "Chart with supporting text".to_string();
    }
    if has_table {
        return "Data table presentation".to_string();
    }
    let has = |name: &str| groups.iter().any(|(n, _)| n == name);
    if has("left_column") && has("right_column") {
        return "Two column comparison".to_string();
    }
    let n = groups.len();
    if n == 3 && groups.iter().all(|(g, _)| g.contains("column")) {
        return "Three column layout".to_string();
    }
    if n >= 1 && groups.iter().all(|(g, _)| g.contains("row")) {
        return format!("Vertical stack ({n} sections)");
    }
    if n == 1 {
        return "Single content area".to_string();
    }
    format!("Multi-area layout ({n} areas)")
}

pub fn layout_type(
    has_chart: bool,
    has_table: bool,
    has_picture: bool,
    text_count: usize,
    section_count: usize,
    kpi_grid: Option<&KpiGrid>,
) -> &'static str {
    if kpi_grid.is_some() {
        return "kpi_dashboard";
    }
    if has_chart {
        return "chart_layout";
    }
    if has_table {
        return "table_layout";
    }
    if has_picture {
        return "image_layout";
    }
    match section_count {
        0 => {}
        1 => return "single_section",
        2 => return "double_section",
        _ => return "multi_section",
    }
    match text_count {
        0 => "title_only",
        1 => "single_column",
        2 => "double_column",
        3 => "triple_column",
        _ => "multi_column",
    }
}

pub fn best_use(
    has_chart: bool,
    has_table: bool,
    content: &[PlaceholderInfo],
    groups: &Groups,
    sections: &[SemanticSection],
    kpi_grid: Option<&KpiGrid>,
) -> Vec<String> {
    let mut best: Vec<String> = Vec::new();
    let mut add = |s: &str| {
        if !best.iter().any(|b| b == s) {
            best.push(s.to_string());
        }
    };

    if kpi_grid.is_some() {
        ["kpi_dashboard", "metrics", "scorecard"].iter().for_each(|s| add(s));
    }
    if has_chart {
        add("chart");
    }
    if has_table {
        add("table");
    }
    for section in sections {
        section.best_for.iter().for_each(|s| add(s));
    }
    let has = |name: &str| groups.iter().any(|(n, _)| n == name);
    if has("left_column") && has("right_column") {
        add("comparison");
        add("before_after");
    }
    if groups.len() == 3 {
        add("three_points");
        add("process_steps");
    }
    if groups.len() >= 4 && kpi_grid.is_none() {
        add("icon_grid");
    }
    if content.iter().any(|p| p.is_medium) {
        add("pictogram");
    }
    if best.is_empty() {
        best.push("bullets".to_string());
    }
    best
}

pub fn complexity(sections: &[SemanticSection], content: &[PlaceholderInfo]) -> f64 {
    let small = content.iter().filter(|p| p.is_small).count();
    let score = (sections.len() as f64 * 15.0).min(40.0)
        + (content.len() as f64 * 8.0).min(40.0)
        + (small as f64 * 5.0).min(20.0);
    score.min(100.0)
}

/// 100 when all content boxes share one size, falling with the largest
/// deviation from the mean.
pub fn balance(content: &[PlaceholderInfo]) -> f64 {
    if content.is_empty() {
        return 0.0;
    }
    let areas: Vec<f64> = content.iter().map(|p| p.area).collect();
    let avg = mean(&areas);
    let deviation = if avg > 0.0 {
        max_deviation(&areas, avg) / avg * 100.0
    } else {
        100.0
    };
    100.0 - deviation.min(100.0)
}

pub fn fill_difficulty(sections: usize, placeholders: usize) -> (FillDifficulty, u8) {
    if sections <= 2 && placeholders <= 3 {
        (FillDifficulty::Easy, 7)
    } else if sections <= 4 && placeholders <= 6 {
        (FillDifficulty::Medium, 8)
    } else {
        (FillDifficulty::Hard, 9)
    }
}

pub fn executive_suitability(balance: f64, complexity: f64, sections: usize, story: StoryType) -> f64 {
    let mut score = balance / 100.0 * 40.0;
    score += if (30.0..=60.0).contains(&complexity) {
        30.0
    } else if complexity < 30.0 {
        20.0
    } else {
        10.0
    };
    score += match story {
        StoryType::MetricsDashboard
        | StoryType::DataVisualization
        | StoryType::BalancedComparison
        | StoryType::ThreeStageNarrative => 20.0,
        StoryType::FocusedMessage | StoryType::MainSupporting => 15.0,
        _ => 5.0,
    };
    score += if (1..=3).contains(&sections) { 10.0 } else { 3.0 };
    score.min(100.0)
}

pub fn density_recommendation(
    usable_area: f64,
    sections: usize,
    story: StoryType,
) -> DensityRecommendation {
    let density = match story {
        StoryType::MetricsDashboard | StoryType::FeatureGrid => 10,
        StoryType::DetailedAnalysis => 20,
        _ => 15,
    };
    let total_words = (usable_area * density as f64) as usize;
    let words_per_section = if sections > 0 {
        total_words / sections
    } else {
        total_words
    };
    let bullets_recommended = match story {
        StoryType::MetricsDashboard => 4 + sections * 2,
        StoryType::BalancedComparison | StoryType::ThreeStageNarrative => 6 + sections * 3,
        _ => 8 + sections * 4,
    };
    let executive = density <= 15;
    DensityRecommendation {
        total_words_target: total_words,
        words_per_section,
        density_style: if executive { "executive" } else { "detailed" }.to_string(),
        bullets_recommended,
        verbosity_level: if executive { 6 } else { 8 },
        avoid_overflow: true,
    }
}

pub fn layout_category(
    has_title: bool,
    kpi_grid: Option<&KpiGrid>,
    content: &[PlaceholderInfo],
    name: &str,
) -> LayoutCategory {
    if content.is_empty() {
        if !has_title {
            return LayoutCategory::Blank;
        }
        let lower = name.to_lowercase();
        if lower.contains("title") && !lower.contains("only") {
            return LayoutCategory::Cover;
        }
        return LayoutCategory::SectionDivider;
    }
    if kpi_grid.is_some() || content.iter().filter(|p| p.is_small).count() >= 4 {
        return LayoutCategory::Kpicards;
    }
    if content.iter().any(|p| p.is_large) || (content.len() == 1 && content[0].area > 10.0) {
        return LayoutCategory::LargeContent;
    }
    LayoutCategory::SmallContent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::PlaceholderKind;

    fn body(idx: u32, left: f64, top: f64, w: f64, h: f64) -> PlaceholderInfo {
        PlaceholderInfo::new(idx, PlaceholderKind::Body, left, top, w, h)
    }

    #[test]
    fn test_kpi_grid_two_by_two() {
        let boxes = vec![
            body(1, 1.5, 2.2, 2.5, 1.1),
            body(2, 6.0, 2.2, 2.5, 1.1),
            body(3, 1.5, 4.2, 2.5, 1.1),
            body(4, 6.0, 4.2, 2.5, 1.1),
        ];
        let grid = detect_kpi_grid(&boxes).unwrap();
        assert_eq!((grid.rows, grid.cols), (2, 2));
        assert!((grid.total_area - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_kpi_grid_rejects_uneven_sizes() {
        let boxes = vec![
            body(1, 1.5, 2.2, 2.5, 1.1),
            body(2, 6.0, 2.2, 1.0, 1.0),
            body(3, 1.5, 4.2, 2.5, 1.1),
            body(4, 6.0, 4.2, 2.5, 1.1),
        ];
        assert!(detect_kpi_grid(&boxes).is_none());
    }

    #[test]
    fn test_kpi_grid_needs_two_per_row() {
        let boxes = vec![
            body(1, 1.0, 1.0, 1.5, 1.5),
            body(2, 3.0, 1.0, 1.5, 1.5),
            body(3, 5.0, 1.0, 1.5, 1.5),
            body(4, 1.0, 4.0, 1.5, 1.5),
        ];
        assert!(detect_kpi_grid(&boxes).is_none());
    }

    #[test]
    fn test_spatial_groups() {
        let mut two = vec![body(1, 0.5, 1.75, 4.4, 4.95), body(2, 5.1, 1.75, 4.4, 4.95)];
        let groups = group_by_spatial_position(&mut two);
        assert_eq!(groups[0].0, "left_column");
        assert_eq!(groups[1].0, "right_column");
        assert_eq!(two[1].position_group, "right_column");

        let mut stacked = vec![body(1, 0.5, 1.0, 9.0, 2.0), body(2, 0.5, 3.5, 9.0, 2.0)];
        let groups = group_by_spatial_position(&mut stacked);
        assert_eq!(groups[1].0, "row_2");

        let mut many: Vec<_> = (0..4).map(|i| body(i, i as f64 * 2.0, 1.0, 1.5, 1.5)).collect();
        assert_eq!(group_by_spatial_position(&mut many).len(), 4);
    }

    #[test]
    fn test_semantic_sections_and_story() {
        let subtitles = vec![body(3, 5.1, 1.6, 4.4, 0.6), body(1, 0.5, 1.6, 4.4, 0.6)];
        let content = vec![body(2, 0.5, 2.3, 4.4, 4.2), body(4, 5.1, 2.3, 4.4, 4.2)];
        let sections = group_semantically(&subtitles, &content);
        assert_eq!(sections.len(), 2);
        let ids: Vec<_> = sections.iter().map(|s| s.section_id.as_str()).collect();
        assert!(ids.contains(&"section_1") && ids.contains(&"section_3"));
        assert_eq!(sections[0].layout_pattern, SectionPattern::Single);
        assert_eq!(sections[0].best_for, vec!["chart", "table", "bullets"]);
        assert_eq!(
            infer_story_type(&sections, &content, None),
            StoryType::BalancedComparison
        );
    }

    #[test]
    fn test_content_too_far_below_subtitle_is_not_claimed() {
        let subtitles = vec![body(1, 0.5, 1.0, 4.0, 0.4)];
        let content = vec![body(2, 0.5, 2.5, 4.0, 3.0)];
        assert!(group_semantically(&subtitles, &content).is_empty());
    }

    #[test]
    fn test_story_without_sections() {
        let content: Vec<_> = (0..6)
            .map(|i| body(i, (i % 3) as f64 * 3.0, (i / 3) as f64 * 2.0 + 1.0, 1.5, 1.0))
            .collect();
        assert_eq!(infer_story_type(&[], &content, None), StoryType::FeatureGrid);

        let mixed = vec![
            body(1, 0.5, 1.0, 6.0, 4.0),
            body(2, 7.0, 1.0, 2.0, 1.0),
            body(3, 7.0, 3.0, 2.0, 1.0),
        ];
        assert_eq!(infer_story_type(&[], &mixed, None), StoryType::HierarchicalStory);
    }

    #[test]
    fn test_scores() {
        let content = vec![body(1, 0.5, 1.75, 9.0, 4.95)];
        assert_eq!(complexity(&[], &content), 8.0);
        assert_eq!(balance(&content), 100.0);
        assert_eq!(balance(&[]), 0.0);
        assert_eq!(fill_difficulty(0, 1), (FillDifficulty::Easy, 7));
        assert_eq!(fill_difficulty(3, 6), (FillDifficulty::Medium, 8));
        assert_eq!(fill_difficulty(5, 2), (FillDifficulty::Hard, 9));
        // 40 balance + 20 simple + 5 story + 3 sections
        assert_eq!(
            executive_suitability(100.0, 8.0, 0, StoryType::GeneralContent),
            68.0
        );
        assert_eq!(executive_score(&[], &content, &[]), 65.0);
    }

    #[test]
    fn test_density() {
        let d = density_recommendation(12.0, 2, StoryType::BalancedComparison);
        assert_eq!(d.total_words_target, 180);
        assert_eq!(d.words_per_section, 90);
        assert_eq!(d.bullets_recommended, 12);
        assert_eq!(d.density_style, "executive");

        let d = density_recommendation(10.0, 0, StoryType::DetailedAnalysis);
        assert_eq!(d.total_words_target, 200);
        assert_eq!(d.verbosity_level, 8);
    }

    #[test]
    fn test_category() {
        assert_eq!(layout_category(false, None, &[], "Blank"), LayoutCategory::Blank);
        assert_eq!(layout_category(true, None, &[], "Title Slide"), LayoutCategory::Cover);
        assert_eq!(
            layout_category(true, None, &[], "Title Only"),
            LayoutCategory::SectionDivider
        );
        let small = vec![body(1, 0.5, 1.0, 3.0, 2.0)];
        assert_eq!(layout_category(true, None, &small, "x"), LayoutCategory::SmallContent);
    }
}
