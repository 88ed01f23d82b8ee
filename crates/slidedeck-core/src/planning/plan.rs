use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SEARCH_MODE;

fn research() -> String {
    "research".to_string()
}

fn content() -> String {
    "content".to_string()
}

fn bullets() -> String {
    "bullets".to_string()
}

fn normal() -> String {
    DEFAULT_SEARCH_MODE.to_string()
}

/// A query to run against the search executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub purpose: String,
    /// `research` for simulated web search, `extracted_content` when the
    /// answer comes from uploaded files.
    #[serde(default = "research")]
    pub expected_source_type: String,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            purpose: purpose.into(),
            expected_source_type: research(),
        }
    }
}

/// Placeholder size in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub area: f64,
}

/// What one placeholder of a planned slide should hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderContentSpec {
    pub placeholder_idx: u32,
    /// OOXML placeholder kind (`title`, `body`, `obj`, `chart`, ...).
    pub placeholder_type: String,
    /// `text`, `subtitle`, `bullets`, `kpi`, `column_chart`, `table`, ...
    pub content_type: String,
    pub content_description: String,
    #[serde(default)]
    pub search_queries: Vec<SearchQuery>,
    #[serde(default)]
    pub position_group: String,
    #[serde(default = "content")]
    pub role: String,
    #[serde(default)]
    pub dimensions: Dimensions,
}

/// One planned slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionPlan {
    pub section_title: String,
    pub section_purpose: String,
    pub layout_type: String,
    pub layout_idx: usize,
    #[serde(default)]
    pub layout_story: String,
    #[serde(default)]
    pub placeholder_specs: Vec<PlaceholderContentSpec>,
    #[serde(default)]
    pub total_search_queries: usize,
    #[serde(default = "bullets")]
    pub enforced_content_type: String,
}

impl SectionPlan {
    pub fn queries(&self) -> impl Iterator<Item = &SearchQuery> {
        self.placeholder_specs.iter().flat_map(|s| s.search_queries.iter())
    }

    /// Specs that target placeholder `idx`.
    pub fn specs_for(&self, idx: u32) -> impl Iterator<Item = &PlaceholderContentSpec> {
        self.placeholder_specs
            .iter()
            .filter(move |s| s.placeholder_idx == idx)
    }
}

/// What the planner understood about the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanAnalysis {
    #[serde(default)]
    pub main_subject: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub time_period: Option<String>,
    #[serde(default)]
    pub aspects: Vec<String>,
}

/// Layout indices grouped by what they can hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub usable_layouts: Vec<usize>,
    pub chart_capable: Vec<usize>,
    pub table_capable: Vec<usize>,
    pub multi_content: Vec<usize>,
    pub total: usize,
}

/// The reviewable output of planning.
///
/// Serialised to YAML for the CLI and to JSON for the web API; the user may
/// edit sections before execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub query: String,
    #[serde(default)]
    pub analysis: PlanAnalysis,
    pub sections: Vec<SectionPlan>,
    #[serde(default = "normal")]
    pub search_mode: String,
    #[serde(default)]
    pub total_queries: usize,
    #[serde(default)]
    pub template_info: TemplateInfo,
}

impl ResearchPlan {
    pub fn new(query: impl Into<String>, analysis: PlanAnalysis, sections: Vec<SectionPlan>) -> Self {
        let mut plan = Self {
            query: query.into(),
            analysis,
            sections,
            search_mode: normal(),
            total_queries: 0,
            template_info: TemplateInfo::default(),
        };
        plan.recount();
        plan
    }

    /// Converts the plan to YAML format.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Parses a plan from YAML format.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Refreshes per-section and total query counts after edits.
    pub fn recount(&mut self) {
        for section in &mut self.sections {
            section.total_search_queries = section.queries().count();
        }
        self.total_queries = self.sections.iter().map(|s| s.total_search_queries).sum();
    }

    /// Every query text in plan order, without duplicates.
    pub fn unique_queries(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.sections
            .iter()
            .flat_map(SectionPlan::queries)
            .filter(|q| seen.insert(q.query.clone()))
            .map(|q| q.query.clone())
            .collect()
    }
}
