use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::ChartData;
use crate::planning::ResearchPlan;

/// A generated plan, kept until it is executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub query: String,
    pub template: String,
    pub search_mode: String,
    pub plan: ResearchPlan,
    /// Text extracted from uploaded files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    /// Chart data extracted from an uploaded chart file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<ChartData>,
}

impl PlanRecord {
    pub fn new(plan: ResearchPlan, template: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            query: plan.query.clone(),
            template: template.into(),
            search_mode: plan.search_mode.clone(),
            plan,
            source_text: None,
            chart_data: None,
        }
    }

    pub fn with_source_text(mut self, text: Option<String>) -> Self {
        self.source_text = text.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_chart_data(mut self, chart: Option<ChartData>) -> Self {
        self.chart_data = chart;
        self
    }

    pub fn to_summary(&self) -> PlanSummary {
        PlanSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            query: self.query.clone(),
            template: self.template.clone(),
            sections: self.plan.sections.len(),
            total_queries: self.plan.total_queries,
        }
    }
}

/// Listing row for a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub query: String,
    pub template: String,
    pub sections: usize,
    pub total_queries: usize,
}

/// An executed plan and the files it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    pub plan_id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub template: String,
    /// Body sections plus the title and closing slides.
    pub slides_generated: usize,
    /// Seconds.
    pub execution_time: f64,
    pub deck_path: PathBuf,
    pub log_path: PathBuf,
}
