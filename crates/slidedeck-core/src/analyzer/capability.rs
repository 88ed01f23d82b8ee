use serde::{Deserialize, Serialize};
use std::fmt;

use super::placeholder::{largest, PlaceholderInfo};

/// The narrative a layout is suited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryType {
    MetricsDashboard,
    DataVisualization,
    DetailedAnalysis,
    FocusedMessage,
    BalancedComparison,
    MainSupporting,
    ThreeStageNarrative,
    FeatureGrid,
    HierarchicalStory,
    #[default]
    GeneralContent,
}

impl StoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetricsDashboard => "metrics_dashboard",
            Self::DataVisualization => "data_visualization",
            Self::DetailedAnalysis => "detailed_analysis",
            Self::FocusedMessage => "focused_message",
            Self::BalancedComparison => "balanced_comparison",
            Self::MainSupporting => "main_supporting",
            Self::ThreeStageNarrative => "three_stage_narrative",
            Self::FeatureGrid => "feature_grid",
            Self::HierarchicalStory => "hierarchical_story",
            Self::GeneralContent => "general_content",
        }
    }
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse layout bucket used when choosing layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCategory {
    Blank,
    Cover,
    SectionDivider,
    Kpicards,
    LargeContent,
    SmallContent,
}

impl LayoutCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Cover => "cover",
            Self::SectionDivider => "section_divider",
            Self::Kpicards => "kpicards",
            Self::LargeContent => "large_content",
            Self::SmallContent => "small_content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillDifficulty {
    Easy,
    Medium,
    Hard,
}

impl FillDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// Arrangement of the content areas under one subtitle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionPattern {
    Single,
    Grid,
    Columns,
    Mixed,
}

/// A subtitle with the content areas directly beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticSection {
    pub section_id: String,
    pub subtitle: PlaceholderInfo,
    pub content_areas: Vec<PlaceholderInfo>,
    pub total_capacity: f64,
    pub layout_pattern: SectionPattern,
    pub best_for: Vec<String>,
}

/// Rows of similarly sized small boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiGrid {
    pub boxes: Vec<PlaceholderInfo>,
    pub rows: usize,
    pub cols: usize,
    pub total_area: f64,
    pub avg_box_size: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulletCapacity {
    pub max_lines: usize,
    pub chars_per_line: usize,
    pub estimated_words: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCapacity {
    pub max_cols: usize,
    pub max_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartCapacity {
    pub suitable: bool,
    pub min_area: f64,
    pub available_area: f64,
}

impl Default for ChartCapacity {
    fn default() -> Self {
        Self {
            suitable: false,
            min_area: 30.0,
            available_area: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PictogramCapacity {
    pub suitable: bool,
    pub estimated_count: usize,
}

/// How much of each content kind a layout can hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentCapacity {
    pub bullets: BulletCapacity,
    pub table: TableCapacity,
    pub chart: ChartCapacity,
    pub kpis: usize,
    pub pictograms: PictogramCapacity,
    pub sections: usize,
}

/// How much text to write into a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityRecommendation {
    pub total_words_target: usize,
    pub words_per_section: usize,
    pub density_style: String,
    pub bullets_recommended: usize,
    pub verbosity_level: u8,
    pub avoid_overflow: bool,
}

impl Default for DensityRecommendation {
    fn default() -> Self {
        Self {
            total_words_target: 0,
            words_per_section: 0,
            density_style: "executive".to_string(),
            bullets_recommended: 8,
            verbosity_level: 6,
            avoid_overflow: true,
        }
    }
}

/// Everything the analyzer derives about one layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutCapability {
    pub idx: usize,
    pub name: String,
    pub has_title: bool,
    pub has_subtitle: bool,
    pub has_chart: bool,
    pub has_table: bool,
    pub has_picture: bool,

    pub subtitle_placeholders: Vec<PlaceholderInfo>,
    pub content_placeholders: Vec<PlaceholderInfo>,
    pub text_placeholders: Vec<PlaceholderInfo>,
    pub all_placeholders: Vec<PlaceholderInfo>,

    pub layout_type: String,
    pub best_for: Vec<String>,
    /// Groups in creation order.
    pub spatial_groups: Vec<(String, Vec<PlaceholderInfo>)>,
    pub layout_story: String,

    pub semantic_sections: Vec<SemanticSection>,
    pub kpi_grid: Option<KpiGrid>,
    pub usable_content_area: f64,
    pub content_capacity: ContentCapacity,

    pub complexity_score: f64,
    pub visual_balance: f64,
    pub fill_difficulty: FillDifficulty,
    pub recommended_verbosity: u8,
    pub executive_score: f64,

    pub semantic_story_type: StoryType,
    pub executive_suitability: f64,
    pub content_density: DensityRecommendation,
    pub layout_category: LayoutCategory,
}

impl LayoutCapability {
    /// Minimal capability for a layout whose analysis failed.
    pub fn fallback(idx: usize, name: &str) -> Self {
        Self {
            idx,
            name: name.to_string(),
            has_title: false,
            has_subtitle: false,
            has_chart: false,
            has_table: false,
            has_picture: false,
            subtitle_placeholders: Vec::new(),
            content_placeholders: Vec::new(),
            text_placeholders: Vec::new(),
            all_placeholders: Vec::new(),
            layout_type: "single_column".to_string(),
            best_for: vec!["bullets".to_string()],
            spatial_groups: Vec::new(),
            layout_story: "Single content area".to_string(),
            semantic_sections: Vec::new(),
            kpi_grid: None,
            usable_content_area: 0.0,
            content_capacity: ContentCapacity::default(),
            complexity_score: 0.0,
            visual_balance: 0.0,
            fill_difficulty: FillDifficulty::Medium,
            recommended_verbosity: 7,
            executive_score: 0.0,
            semantic_story_type: StoryType::GeneralContent,
            executive_suitability: 0.0,
            content_density: DensityRecommendation::default(),
            layout_category: LayoutCategory::SmallContent,
        }
    }

    pub fn supports(&self, content_type: &str) -> bool {
        self.best_for.iter().any(|b| b == content_type)
    }

    /// Content placeholders, largest first.
    pub fn content_by_area(&self) -> Vec<&PlaceholderInfo> {
        let mut content: Vec<&PlaceholderInfo> = self.content_placeholders.iter().collect();
        content.sort_by(|a, b| b.area.total_cmp(&a.area));
        content
    }

    pub fn largest_content(&self) -> Option<&PlaceholderInfo> {
        largest(&self.content_placeholders)
    }
}
