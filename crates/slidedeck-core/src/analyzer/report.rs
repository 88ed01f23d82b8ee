use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::capability::{
    ContentCapacity, DensityRecommendation, KpiGrid, LayoutCapability, SemanticSection,
};
use super::placeholder::PlaceholderInfo;
use super::TemplateAnalysis;

/// Serialisable view of one analyzed layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub idx: usize,
    pub name: String,
    pub has_title: bool,
    pub has_subtitle: bool,
    pub has_chart: bool,
    pub has_table: bool,
    pub has_picture: bool,
    pub content_count: usize,
    pub subtitle_count: usize,
    pub text_count: usize,
    pub layout_type: String,
    pub best_for: Vec<String>,
    pub spatial_groups: BTreeMap<String, Vec<PlaceholderInfo>>,
    pub layout_story: String,
    pub semantic_sections: Vec<SemanticSection>,
    pub kpi_grid: Option<KpiGrid>,
    pub usable_content_area: f64,
    pub content_capacity: ContentCapacity,
    pub complexity_score: f64,
    pub visual_balance: f64,
    pub fill_difficulty: String,
    pub recommended_verbosity: u8,
    pub executive_score: f64,
    pub semantic_story_type: String,
    pub executive_suitability: f64,
    pub content_density: DensityRecommendation,
    pub layout_category: String,
    pub placeholders: PlaceholderLists,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderLists {
    pub subtitles: Vec<PlaceholderInfo>,
    pub content: Vec<PlaceholderInfo>,
    pub text: Vec<PlaceholderInfo>,
    pub all: Vec<PlaceholderInfo>,
}

impl From<&LayoutCapability> for LayoutSummary {
    fn from(l: &LayoutCapability) -> Self {
        Self {
            idx: l.idx,
            name: l.name.clone(),
            has_title: l.has_title,
            has_subtitle: l.has_subtitle,
            has_chart: l.has_chart,
            has_table: l.has_table,
            has_picture: l.has_picture,
            content_count: l.content_placeholders.len(),
            subtitle_count: l.subtitle_placeholders.len(),
            text_count: l.text_placeholders.len(),
            layout_type: l.layout_type.clone(),
            best_for: l.best_for.clone(),
            spatial_groups: l.spatial_groups.iter().cloned().collect(),
            layout_story: l.layout_story.clone(),
            semantic_sections: l.semantic_sections.clone(),
            kpi_grid: l.kpi_grid.clone(),
            usable_content_area: l.usable_content_area,
            content_capacity: l.content_capacity.clone(),
            complexity_score: l.complexity_score,
            visual_balance: l.visual_balance,
            fill_difficulty: l.fill_difficulty.as_str().to_string(),
            recommended_verbosity: l.recommended_verbosity,
            executive_score: l.executive_score,
            semantic_story_type: l.semantic_story_type.to_string(),
            executive_suitability: l.executive_suitability,
            content_density: l.content_density.clone(),
            layout_category: l.layout_category.as_str().to_string(),
            placeholders: PlaceholderLists {
                subtitles: l.subtitle_placeholders.clone(),
                content: l.content_placeholders.clone(),
                text: l.text_placeholders.clone(),
                all: l.all_placeholders.clone(),
            },
        }
    }
}

/// The `analysis.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisExport {
    pub template_name: String,
    pub total_layouts: usize,
    pub layouts: BTreeMap<usize, LayoutSummary>,
}

impl TemplateAnalysis {
    pub fn export_analysis(&self) -> AnalysisExport {
        AnalysisExport {
            template_name: self.template_name().to_string(),
            total_layouts: self.len(),
            layouts: self
                .layouts()
                .iter()
                .map(|l| (l.idx, LayoutSummary::from(l)))
                .collect(),
        }
    }

    /// Multi-line human readable summary.
    pub fn summary_report(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(72);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "TEMPLATE ANALYSIS: {}", self.template_name());
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Total layouts: {}", self.len());

        for l in self.layouts() {
            let best: Vec<&str> = l.best_for.iter().take(3).map(String::as_str).collect();
            let _ = writeln!(out);
            let _ = writeln!(out, "  Layout {}: {}", l.idx, l.name);
            let _ = writeln!(out, "    Type: {} ({})", l.layout_type, l.semantic_story_type);
            let _ = writeln!(out, "    Best for: {}", best.join(", "));
            let _ = writeln!(
                out,
                "    Placeholders: {} content, {} subtitle",
                l.content_placeholders.len(),
                l.subtitle_placeholders.len()
            );
            let _ = writeln!(out, "    Sections: {}", l.semantic_sections.len());
            let _ = writeln!(
                out,
                "    Complexity: {:.0}/100, Balance: {:.0}/100",
                l.complexity_score, l.visual_balance
            );
            if let Some(grid) = &l.kpi_grid {
                let _ = writeln!(out, "    KPI Grid: {}x{}", grid.rows, grid.cols);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::analyzer::TemplateAnalysis;
    use crate::pptx::{blank_template, Template};

    #[test]
    fn test_export_and_summary() {
        let bytes = blank_template().unwrap();
        let analysis = TemplateAnalysis::analyze(&Template::from_bytes(&bytes, "Basic").unwrap());
        let export = analysis.export_analysis();
        assert_eq!(export.template_name, "Basic");
        assert_eq!(export.total_layouts, 12);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["layouts"]["8"]["kpi_grid"]["rows"], 2);
        assert_eq!(json["layouts"]["0"]["layout_category"], "cover");

        let report = analysis.summary_report();
        assert!(report.contains("Layout 8: Four Metrics"));
        assert!(report.contains("KPI Grid: 2x2"));
    }
}
