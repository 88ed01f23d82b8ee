mod common;

use std::sync::Arc;

use common::{FailingLLM, ScriptedLLM};
use slidedeck_core::config::{ExecutionConfig, CLOSING_SLIDE_TITLE};
use slidedeck_core::content::prompts::{BULLETS_SYSTEM_PROMPT, CHART_SYSTEM_PROMPT};
use slidedeck_core::content::{ChartData, ChartSeries, ChartType};
use slidedeck_core::execution::{FillRole, FillStatus, PlaceholderLog, SlideLog};
use slidedeck_core::llm::SharedLLM;
use slidedeck_core::pptx::read_slide_texts;
use slidedeck_core::research::prompts::SEARCH_SYSTEM_PROMPT;
use slidedeck_core::{ExecutionOrchestrator, Stage};
use tempfile::TempDir;
use tokio::sync::mpsc;

const FACTS: &str = "- EV sales reached 14 million units in 2023\n- EV revenue grew 35% year over year in 2024";

const CHART: &str = r#"{"type": "column", "title": "EV Revenue", "categories": ["2022", "2023", "2024"],
    "series": [{"name": "Revenue ($B)", "values": [250, 340, 460]}]}"#;

fn scripted() -> ScriptedLLM {
    ScriptedLLM::new("{}")
        .on(SEARCH_SYSTEM_PROMPT, FACTS)
        .on(BULLETS_SYSTEM_PROMPT, "- Sales hit 14M units in 2023\n- Revenue up 35% in 2024")
        .on(CHART_SYSTEM_PROMPT, CHART)
}

fn config() -> ExecutionConfig {
    ExecutionConfig {
        llm_role_validation: false,
        ..ExecutionConfig::default()
    }
}

fn chart_log(slide: &SlideLog) -> &PlaceholderLog {
    slide
        .placeholders
        .iter()
        .find(|p| p.role == FillRole::Chart)
        .expect("chart placeholder")
}

#[tokio::test]
async fn test_execute_plan_writes_deck_and_log() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out/deck.pptx");
    let (_llm, shared) = scripted().shared();
    let plan = common::sample_plan();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = ExecutionOrchestrator::new(shared, common::template(), &config()).with_progress(tx);
    let report = orchestrator.execute_plan(&plan, &output).await.unwrap();

    assert_eq!(report.slides_generated, plan.sections.len() + 2);
    assert_eq!(report.slides.len(), 2);
    assert!(report.output_path.exists());
    assert_eq!(report.log_path, temp.path().join("out/deck.execution.json"));

    let logged: Vec<SlideLog> = serde_json::from_str(&std::fs::read_to_string(&report.log_path).unwrap()).unwrap();
    assert_eq!(logged, report.slides);

    let texts = read_slide_texts(&std::fs::read(&output).unwrap()).unwrap();
    let titles: Vec<_> = texts.iter().map(|t| t.title.clone().unwrap_or_default()).collect();
    assert_eq!(
        titles,
        vec!["Electric vehicle market", "Market Overview", "Revenue Growth", CLOSING_SLIDE_TITLE]
    );
    assert!(texts[1].paragraphs.iter().any(|p| p.contains("14M units")));

    let chart = chart_log(&report.slides[1]);
    assert_eq!(chart.status, FillStatus::Filled);
    assert_eq!(chart.content.as_ref().unwrap()["chart_data"]["title"], "EV Revenue");

    let mut stages = Vec::new();
    while let Ok(stage) = rx.try_recv() {
        stages.push(stage);
    }
    assert_eq!(stages.first(), Some(&Stage::Searching));
    assert_eq!(stages.last(), Some(&Stage::Complete));
}

#[tokio::test]
async fn test_uploaded_chart_fills_first_chart() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("deck.pptx");
    let (_llm, shared) = scripted().shared();
    let uploaded = ChartData {
        title: "Uploaded revenue".to_string(),
        chart_type: ChartType::Line,
        categories: vec!["Q1".to_string(), "Q2".to_string()],
        series: vec![ChartSeries {
            name: "Revenue".to_string(),
            values: vec![1.5, 2.25],
        }],
    };

    let orchestrator = ExecutionOrchestrator::new(shared, common::template(), &config())
        .with_source(Some("Revenue was 1.5 in Q1 and 2.25 in Q2"))
        .with_chart(Some(uploaded));
    let report = orchestrator
        .execute_plan(&common::sample_plan(), &output)
        .await
        .unwrap();

    let chart = chart_log(&report.slides[1]);
    assert_eq!(chart.status, FillStatus::Filled);
    assert_eq!(chart.content.as_ref().unwrap()["chart_data"]["title"], "Uploaded revenue");
}

#[tokio::test]
async fn test_chart_skipped_when_not_enforced() {
    let temp = TempDir::new().unwrap();
    let (_llm, shared) = scripted().shared();
    let mut plan = common::sample_plan();
    plan.sections[1].enforced_content_type = "bullets".to_string();
    for spec in &mut plan.sections[1].placeholder_specs {
        spec.content_type = "bullets".to_string();
    }

    let orchestrator = ExecutionOrchestrator::new(shared, common::template(), &config());
    let report = orchestrator
        .execute_plan(&plan, &temp.path().join("deck.pptx"))
        .await
        .unwrap();

    let chart = chart_log(&report.slides[1]);
    assert_eq!(chart.status, FillStatus::Skipped);
}

#[tokio::test]
async fn test_unknown_layout_is_logged_not_fatal() {
    let temp = TempDir::new().unwrap();
    let (_llm, shared) = scripted().shared();
    let mut plan = common::sample_plan();
    plan.sections[0].layout_idx = 42;

    let orchestrator = ExecutionOrchestrator::new(shared, common::template(), &config());
    let report = orchestrator
        .execute_plan(&plan, &temp.path().join("deck.pptx"))
        .await
        .unwrap();

    assert!(report.slides[0].is_failed());
    assert!(report.slides[0].error.is_some());
    assert!(!report.slides[1].is_failed());
    // The failed section writes no slide
    assert_eq!(report.slides_generated, 3);
}

#[tokio::test]
async fn test_failing_model_still_writes_deck() {
    let temp = TempDir::new().unwrap();
    let shared: SharedLLM = Arc::new(FailingLLM);
    let config = ExecutionConfig {
        llm_role_validation: true,
        ..ExecutionConfig::default()
    };

    let orchestrator = ExecutionOrchestrator::new(shared, common::template(), &config);
    let report = orchestrator
        .execute_plan(&common::sample_plan(), &temp.path().join("deck.pptx"))
        .await
        .unwrap();

    assert_eq!(report.slides_generated, 4);
    assert!(report.output_path.exists());
    assert!(report.slides.iter().all(|s| !s.is_failed()));
}
