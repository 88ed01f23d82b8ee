//! HTTP route handlers for the web server.
//!
//! Handlers are kept thin, delegating the pipeline to `slidedeck_core`.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{info, warn};

use slidedeck_core::files::{extract_all, extract_chart_data};
use slidedeck_core::llm::{Provider, LLM};
use slidedeck_core::pptx::{read_slide_texts, SlideText};
use slidedeck_core::storage::StorageError;
use slidedeck_core::templates::TemplateListing;
use slidedeck_core::{ExecutionOrchestrator, ManagerError, PlanGenerator, ResearchPlan};

use super::error::ApiError;
use super::models::{
    ChatRequest, ChatResponse, DownloadQuery, ExecuteRequest, ExecuteResponse, HealthResponse, PlanInput,
    PlanRequest, PlanResponse, PreviewResponse, ReportSummary, Upload,
};
use super::templates;
use super::AppState;

const PPTX_MIME: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const CHAT_SYSTEM_PROMPT: &str = "You are a presentation assistant. You are given the text of a \
slide deck or its plan and a request from its author. Answer concisely. When asked to change a \
slide, reply with the revised title and bullet points in plain text.";

// =============================================================================
// Page Handlers
// =============================================================================

/// GET `/` - The single-page UI.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(templates::render_index(state.registry.default_name()))
}

// =============================================================================
// API Handlers
// =============================================================================

/// POST `/api/plan` - Plans a deck from a query, as JSON or multipart with
/// uploaded source files.
pub async fn api_plan(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<PlanResponse>, ApiError> {
    let PlanInput {
        request,
        files,
        chart_file,
    } = read_plan_input(request).await?;

    let query = request.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::bad_request("Query required"));
    }
    let llm_config = state.config.llm.with_api_key(request.api_key.as_deref());
    let (planner, content) = Provider::build_pair(&llm_config)?;
    let template = state
        .registry
        .resolve(request.template.as_deref().unwrap_or_default())?
        .name
        .clone();
    info!(query = %query, template = %template, uploads = files.len(), "creating plan");

    let analysis = state.analysis_for(&template).await?;
    let source_text = if files.is_empty() {
        None
    } else {
        Some(extract_all(files.iter().map(|f| (f.name.as_str(), f.bytes.as_slice())))?)
    };
    let chart_data = match &chart_file {
        Some(upload) => match extract_chart_data(&content, &upload.name, &upload.bytes).await {
            Ok(chart) => Some(chart),
            Err(e) => {
                warn!(file = %upload.name, error = %e, "chart extraction failed");
                None
            }
        },
        None => None,
    };

    let mut planning = state.config.planning.clone();
    if let Some(mode) = request.search_mode.filter(|m| !m.trim().is_empty()) {
        planning.search_mode = mode;
    }
    let plan = PlanGenerator::new(planner, planning)
        .generate_plan(&query, &analysis, request.num_sections, source_text.as_deref())
        .await?;

    let record = state
        .manager
        .create_plan(plan, &template, source_text, chart_data)?;
    Ok(Json(PlanResponse {
        plan_id: record.id,
        query: record.query,
        template: record.template,
        total_queries: record.plan.total_queries,
        analysis: record.plan.analysis,
        sections: record.plan.sections,
        search_mode: record.search_mode,
    }))
}

/// POST `/api/execute` - Executes a stored plan, optionally with edited
/// sections, and records the report.
pub async fn api_execute(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let body = json_body(payload)?;
    let invalid = || ApiError::bad_request("Invalid or expired plan_id");
    let plan_id = body.plan_id.filter(|id| !id.trim().is_empty()).ok_or_else(invalid)?;
    let mut record = state.manager.get_plan(&plan_id).map_err(|e| {
        if is_missing(&e) {
            invalid()
        } else {
            e.into()
        }
    })?;
    if let Some(sections) = body.sections {
        record = state.manager.update_sections(&plan_id, sections)?;
    }

    let llm_config = state.config.llm.with_api_key(body.api_key.as_deref());
    let llm = Provider::content_from_config(&llm_config).build()?;
    let template = state.registry.load(&record.template)?;
    let output_path = PathBuf::from(&state.config.execution.output_dir).join(format!("report_{}.pptx", record.id));

    let orchestrator = ExecutionOrchestrator::new(llm, template, &state.config.execution)
        .with_source(record.source_text.as_deref())
        .with_chart(record.chart_data.clone());
    let report = orchestrator.execute_plan(&record.plan, &output_path).await?;
    let stored = state.manager.record_execution(&record, &report)?;

    Ok(Json(ExecuteResponse {
        success: true,
        report_id: stored.id,
        title: stored.title,
        slides_generated: stored.slides_generated,
        template_used: stored.template,
        execution_time: stored.execution_time,
    }))
}

/// GET `/api/download/{id}` - The deck file, or a JSON summary with
/// `?format=json`.
pub async fn api_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let report = state.manager.get_report(&id)?;
    match params.format.to_ascii_lowercase().as_str() {
        "ppt" | "pptx" => {
            let bytes = read_deck(&report.deck_path).await?;
            let disposition = format!("attachment; filename=\"report_{}.pptx\"", report.id);
            let headers = [
                (header::CONTENT_TYPE, PPTX_MIME.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ];
            Ok((headers, bytes).into_response())
        }
        "json" => Ok(Json(ReportSummary {
            report_id: report.id,
            template: report.template,
            topic: report.title,
        })
        .into_response()),
        _ => Err(ApiError::bad_request("Unsupported format")),
    }
}

/// GET `/api/templates` - Registered templates by name.
pub async fn api_templates(
    State(state): State<Arc<AppState>>,
) -> Json<std::collections::BTreeMap<String, TemplateListing>> {
    Json(state.registry.listings())
}

/// POST `/api/chat` - Answers a request about a generated deck or a plan.
pub async fn api_chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let body = json_body(payload)?;
    let missing = || ApiError::bad_request("Missing parameters");
    let instruction = body
        .instruction
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(missing)?;

    let context = if let Some(report_id) = non_empty(&body.report_id) {
        let report = state.manager.get_report(report_id)?;
        let slides = read_slide_texts(&read_deck(&report.deck_path).await?)?;
        deck_context(&report.title, &slides, body.slide_idx)
    } else if let Some(plan_id) = non_empty(&body.plan_id) {
        let record = state.manager.get_plan(plan_id)?;
        plan_context(&record.plan, body.slide_idx)
    } else {
        return Err(missing());
    };
    info!(slide = ?body.slide_idx, "chat request");

    let llm_config = state.config.llm.with_api_key(body.api_key.as_deref());
    let llm = Provider::content_from_config(&llm_config).build()?;
    let prompt = format!("{context}\n\nRequest: {instruction}");
    let answer = llm.complete_with_system(CHAT_SYSTEM_PROMPT, &prompt).await?;

    Ok(Json(ChatResponse {
        success: true,
        message: answer.trim().to_string(),
        slide_idx: body.slide_idx,
    }))
}

/// GET `/api/preview/{id}` - Slide titles and text read back from the deck.
pub async fn api_preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let report = state.manager.get_report(&id)?;
    let slides = read_slide_texts(&read_deck(&report.deck_path).await?)?;
    Ok(Json(PreviewResponse {
        report_id: report.id,
        title: report.title,
        slides,
    }))
}

/// GET `/api/health` - Liveness and record counts.
pub async fn api_health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        plans_cached: state.manager.list_plans()?.len(),
        slides_cached: state.manager.list_reports()?.len(),
        templates_analyzed: state.analyses.read().await.len(),
        templates_available: state.registry.len(),
    }))
}

// =============================================================================
// Helpers
// =============================================================================

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn is_missing(e: &ManagerError) -> bool {
    e.is_not_found() || matches!(e, ManagerError::Storage(StorageError::InvalidId(_)))
}

async fn read_deck(path: &FsPath) -> Result<Vec<u8>, ApiError> {
    tokio::fs::read(path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "deck file unreadable");
        ApiError::not_found("Presentation file not found")
    })
}

/// Reads `/api/plan` input from a JSON body or a multipart form.
async fn read_plan_input(request: Request) -> Result<PlanInput, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    if !is_multipart {
        let body = json_body(Json::<PlanRequest>::from_request(request, &()).await)?;
        return Ok(PlanInput {
            request: body,
            ..PlanInput::default()
        });
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut input = PlanInput::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "files" || name == "chart_file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            if file_name.is_empty() || bytes.is_empty() {
                continue;
            }
            let upload = Upload {
                name: file_name,
                bytes: bytes.to_vec(),
            };
            if name == "files" {
                input.files.push(upload);
            } else {
                input.chart_file = Some(upload);
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        let value = value.trim().to_string();
        let optional = Some(value.clone()).filter(|v| !v.is_empty());
        match name.as_str() {
            "query" => input.request.query = value,
            "template" => input.request.template = optional,
            "search_mode" => input.request.search_mode = optional,
            "num_sections" => input.request.num_sections = value.parse().ok(),
            "api_key" => input.request.api_key = optional,
            _ => {}
        }
    }
    Ok(input)
}

/// Deck text as chat context; `slide_idx` is zero-based.
fn deck_context(title: &str, slides: &[SlideText], slide_idx: Option<usize>) -> String {
    let mut out = format!("Presentation: {title}\n\nSlides:");
    for slide in slides {
        out.push_str(&format!(
            "\nSlide {}: {}",
            slide.number,
            slide.title.as_deref().unwrap_or("(untitled)")
        ));
        for paragraph in &slide.paragraphs {
            out.push_str(&format!("\n  - {paragraph}"));
        }
    }
    if let Some(slide) = slide_idx.and_then(|i| slides.get(i)) {
        out.push_str(&format!(
            "\n\nThe request is about slide {} ({}).",
            slide.number,
            slide.title.as_deref().unwrap_or("untitled")
        ));
    }
    out
}

/// Plan sections as chat context; `slide_idx` counts sections from zero.
fn plan_context(plan: &ResearchPlan, slide_idx: Option<usize>) -> String {
    let mut out = format!("Planned presentation: {}\n\nSections:", plan.query);
    for (i, section) in plan.sections.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} ({}): {}",
            i + 1,
            section.section_title,
            section.enforced_content_type,
            section.section_purpose
        ));
    }
    if let Some(section) = slide_idx.and_then(|i| plan.sections.get(i)) {
        out.push_str(&format!("\n\nThe request is about the section \"{}\".", section.section_title));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use slidedeck_core::pptx::blank_template;
    use slidedeck_core::{Config, ReportRecord, Storage};
    use tempfile::TempDir;

    fn state(temp: &TempDir) -> Arc<AppState> {
        let mut config = Config::default();
        config.storage.data_dir = temp.path().join("data").to_string_lossy().to_string();
        config.templates.dir = temp.path().join("templates").to_string_lossy().to_string();
        config.execution.output_dir = temp.path().join("output").to_string_lossy().to_string();
        Arc::new(AppState::new(config))
    }

    fn stored_report(state: &AppState, temp: &TempDir) -> ReportRecord {
        let deck_path = temp.path().join("report_r1.pptx");
        std::fs::write(&deck_path, blank_template().unwrap()).unwrap();
        let record = ReportRecord {
            id: "r1".to_string(),
            plan_id: "p1".to_string(),
            created_at: Utc::now(),
            title: "Cloud Costs".to_string(),
            template: "Basic".to_string(),
            slides_generated: 3,
            execution_time: 1.0,
            deck_path,
            log_path: temp.path().join("report_r1.execution.json"),
        };
        state.manager.storage().save_report(&record).unwrap();
        record
    }

    fn format(value: &str) -> Query<DownloadQuery> {
        Query(DownloadQuery {
            format: value.to_string(),
        })
    }

    fn slide(number: usize, title: &str, paragraphs: &[&str]) -> SlideText {
        SlideText {
            number,
            title: Some(title.to_string()),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_deck_context_marks_selected_slide() {
        let slides = vec![
            slide(1, "Cloud Costs", &[]),
            slide(2, "Spend by Region", &["EMEA grew 12%", "APAC flat"]),
        ];
        let context = deck_context("Cloud Costs", &slides, Some(1));
        assert!(context.contains("Slide 2: Spend by Region\n  - EMEA grew 12%"));
        assert!(context.ends_with("about slide 2 (Spend by Region)."));

        let context = deck_context("Cloud Costs", &slides, Some(9));
        assert!(!context.contains("The request is about"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("  r1 ".to_string())), Some("r1"));
        assert_eq!(non_empty(&Some("   ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_plan() {
        let temp = TempDir::new().unwrap();
        let body = ExecuteRequest {
            plan_id: Some("missing".to_string()),
            ..ExecuteRequest::default()
        };
        let err = api_execute(State(state(&temp)), Ok(Json(body))).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid or expired plan_id");

        let err = api_execute(State(state(&temp)), Ok(Json(ExecuteRequest::default())))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_formats() {
        let temp = TempDir::new().unwrap();
        let state = state(&temp);
        stored_report(&state, &temp);

        let response = api_download(State(state.clone()), Path("r1".to_string()), format("PPTX"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PPTX_MIME);

        let response = api_download(State(state.clone()), Path("r1".to_string()), format("json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let err = api_download(State(state.clone()), Path("r1".to_string()), format("pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = api_download(State(state), Path("nope".to_string()), format("ppt"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preview_reads_deck_text() {
        let temp = TempDir::new().unwrap();
        let state = state(&temp);
        let record = stored_report(&state, &temp);

        let Json(preview) = api_preview(State(state.clone()), Path("r1".to_string()))
            .await
            .unwrap();
        assert_eq!(preview.title, "Cloud Costs");
        // The bare template has no slides
        assert!(preview.slides.is_empty());

        std::fs::remove_file(&record.deck_path).unwrap();
        let err = api_preview(State(state), Path("r1".to_string())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Presentation file not found");
    }

    #[tokio::test]
    async fn test_chat_requires_instruction_and_target() {
        let temp = TempDir::new().unwrap();
        let body = ChatRequest {
            instruction: Some("Shorten slide 2".to_string()),
            ..ChatRequest::default()
        };
        let err = api_chat(State(state(&temp)), Ok(Json(body))).await.unwrap_err();
        assert_eq!(err.message, "Missing parameters");

        let body = ChatRequest {
            report_id: Some("r1".to_string()),
            ..ChatRequest::default()
        };
        let err = api_chat(State(state(&temp)), Ok(Json(body))).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_counts_cached_analyses() {
        let temp = TempDir::new().unwrap();
        let state = state(&temp);
        let name = state.registry.default_name().to_string();

        let first = state.analysis_for(&name).await.unwrap();
        let second = state.analysis_for(&name).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        stored_report(&state, &temp);

        let Json(health) = api_health(State(state.clone())).await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.plans_cached, 0);
        assert_eq!(health.slides_cached, 1);
        assert_eq!(health.templates_analyzed, 1);
        assert_eq!(health.templates_available, state.registry.len());
    }
}
