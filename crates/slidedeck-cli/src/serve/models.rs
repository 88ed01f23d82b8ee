//! API request and response types for the web server.
//!
//! These are Data Transfer Objects (DTOs) that define the shape of the JSON
//! exchanged with the browser UI.

use serde::{Deserialize, Serialize};

use slidedeck_core::planning::{PlanAnalysis, SectionPlan};
use slidedeck_core::pptx::SlideText;

// =============================================================================
// Planning (`/api/plan`)
// =============================================================================

/// JSON body of `/api/plan`. Multipart requests carry the same fields as
/// form parts, plus `files` and `chart_file` uploads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    pub query: String,
    pub template: Option<String>,
    pub search_mode: Option<String>,
    pub num_sections: Option<usize>,
    pub api_key: Option<String>,
}

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Everything `/api/plan` needs, however it was sent.
#[derive(Debug, Default)]
pub struct PlanInput {
    pub request: PlanRequest,
    pub files: Vec<Upload>,
    pub chart_file: Option<Upload>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan_id: String,
    pub query: String,
    pub template: String,
    pub total_queries: usize,
    pub analysis: PlanAnalysis,
    pub sections: Vec<SectionPlan>,
    pub search_mode: String,
}

// =============================================================================
// Execution (`/api/execute`)
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExecuteRequest {
    pub plan_id: Option<String>,
    /// Sections edited in the review step; replace the stored ones.
    pub sections: Option<Vec<SectionPlan>>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub report_id: String,
    pub title: String,
    pub slides_generated: usize,
    pub template_used: String,
    pub execution_time: f64,
}

// =============================================================================
// Download (`/api/download/{id}`)
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "ppt".to_string()
}

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub report_id: String,
    pub template: String,
    pub topic: String,
}

// =============================================================================
// Chat (`/api/chat`)
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub report_id: Option<String>,
    pub plan_id: Option<String>,
    /// Zero-based slide the question is about.
    pub slide_idx: Option<usize>,
    pub instruction: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_idx: Option<usize>,
}

// =============================================================================
// Preview and health
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub report_id: String,
    pub title: String,
    pub slides: Vec<SlideText>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub plans_cached: usize,
    pub slides_cached: usize,
    pub templates_analyzed: usize,
    pub templates_available: usize,
}
