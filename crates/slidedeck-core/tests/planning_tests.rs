mod common;

use std::sync::Arc;

use common::{FailingLLM, ScriptedLLM};
use slidedeck_core::config::PlanningConfig;
use slidedeck_core::llm::SharedLLM;
use slidedeck_core::planning::prompts::{
    ANALYSIS_SYSTEM_PROMPT, LAYOUT_MATCH_SYSTEM_PROMPT, SEARCH_QUERY_SYSTEM_PROMPT,
    SECTION_COUNT_SYSTEM_PROMPT, TOPICS_SYSTEM_PROMPT,
};
use slidedeck_core::planning::PlanError;
use slidedeck_core::{PlanGenerator, ResearchPlan, TemplateAnalysis};

fn analysis() -> TemplateAnalysis {
    TemplateAnalysis::analyze(&common::template())
}

const ANALYSIS: &str = r#"{"main_subject": "Electric vehicles", "context": "market review",
    "time_period": "2024", "aspects": ["market size", "growth", "competition", "outlook"]}"#;

const TOPICS: &str = r#"{"topics": [
    {"title": "Revenue Trend", "purpose": "Show revenue growth", "best_content": "chart"},
    {"title": "Key Players", "purpose": "Profile market leaders", "best_content": "bullets"}
]}"#;

const ASSIGNMENTS: &str = r#"{"assignments": [
    {"layout_idx": 9, "content_type": "chart"},
    {"layout_idx": "1", "content_type": "bullets"}
]}"#;

fn scripted() -> ScriptedLLM {
    ScriptedLLM::new("")
        .on(ANALYSIS_SYSTEM_PROMPT, ANALYSIS)
        .on(SECTION_COUNT_SYSTEM_PROMPT, r#"{"recommended_slides": 40}"#)
        .on(TOPICS_SYSTEM_PROMPT, TOPICS)
        .on(LAYOUT_MATCH_SYSTEM_PROMPT, ASSIGNMENTS)
        .on(SEARCH_QUERY_SYSTEM_PROMPT, "\"EV revenue 2024\"\nextra line")
}

#[test]
fn test_plan_yaml_round_trip() {
    let plan = common::sample_plan();
    let yaml = plan.to_yaml().unwrap();
    assert!(yaml.contains("section_title: Market Overview"));
    assert_eq!(ResearchPlan::from_yaml(&yaml).unwrap(), plan);

    let json = plan.to_json().unwrap();
    assert_eq!(ResearchPlan::from_json(&json).unwrap(), plan);
}

#[test]
fn test_edited_yaml_fills_defaults() {
    // A hand-written plan with only the required fields
    let yaml = r#"
query: Cloud costs
sections:
  - section_title: Spend by team
    section_purpose: Break down spend
    layout_type: Chart
    layout_idx: 9
"#;
    let plan = ResearchPlan::from_yaml(yaml).unwrap();
    assert_eq!(plan.search_mode, "normal");
    assert_eq!(plan.sections[0].enforced_content_type, "bullets");
    assert!(plan.sections[0].placeholder_specs.is_empty());
}

#[test]
fn test_recount_and_unique_queries() {
    let mut plan = common::sample_plan();
    assert_eq!(plan.total_queries, 4);
    assert_eq!(
        plan.unique_queries(),
        vec!["EV market size 2024", "EV unit sales by region", "EV revenue by year"]
    );

    plan.sections[0].placeholder_specs[1].search_queries.clear();
    plan.recount();
    assert_eq!(plan.sections[0].total_search_queries, 0);
    assert_eq!(plan.total_queries, 2);
}

#[tokio::test]
async fn test_generate_plan_follows_model() {
    let (llm, shared) = scripted().shared();
    let generator = PlanGenerator::new(shared, PlanningConfig::default());

    let plan = generator
        .generate_plan("EV market 2024", &analysis(), Some(2), None)
        .await
        .unwrap();

    assert_eq!(plan.query, "EV market 2024");
    assert_eq!(plan.analysis.main_subject, "Electric vehicles");
    assert_eq!(plan.sections.len(), 2);

    let chart = &plan.sections[0];
    assert_eq!(chart.section_title, "Revenue Trend");
    assert_eq!(chart.layout_idx, 9);
    assert_eq!(chart.layout_type, "Chart");
    assert_eq!(chart.enforced_content_type, "chart");
    assert_eq!(chart.placeholder_specs[0].role, "title");
    assert_eq!(chart.placeholder_specs[1].content_type, "column_chart");
    assert_eq!(chart.placeholder_specs[1].search_queries[0].query, "EV revenue 2024");

    assert_eq!(plan.sections[1].layout_idx, 1);
    assert_eq!(plan.total_queries, 2);
    assert_eq!(plan.search_mode, "normal");
    // Layout 0 is reserved for the title slide
    assert!(!plan.template_info.usable_layouts.contains(&0));

    // An explicit count skips the section-count call
    assert!(!llm.calls().iter().any(|p| p.contains("recommended_slides")));
}

#[tokio::test]
async fn test_section_count_is_clamped() {
    let (_llm, shared) = scripted().shared();
    let config = PlanningConfig {
        min_sections: 1,
        max_sections: 2,
        ..PlanningConfig::default()
    };
    let generator = PlanGenerator::new(shared, config);

    let plan = generator
        .generate_plan("EV market 2024", &analysis(), None, None)
        .await
        .unwrap();
    assert_eq!(plan.sections.len(), 2);
}

#[tokio::test]
async fn test_failing_model_falls_back() {
    let shared: SharedLLM = Arc::new(FailingLLM);
    let config = PlanningConfig {
        search_mode: "deep".to_string(),
        ..PlanningConfig::default()
    };
    let template = analysis();
    let generator = PlanGenerator::new(shared, config);

    let plan = generator
        .generate_plan("Cloud cost review", &template, Some(3), Some("Spend rose 12% in Q3"))
        .await
        .unwrap();

    assert_eq!(plan.sections.len(), 3);
    assert_eq!(plan.search_mode, "deep");
    assert_eq!(plan.sections[0].section_title, "Analysis 1");
    for section in &plan.sections {
        assert!(template.layout(section.layout_idx).is_some());
        assert_eq!(section.placeholder_specs[0].placeholder_idx, 0);
        for query in section.queries() {
            assert_eq!(query.expected_source_type, "extracted_content");
            assert!(query.query.starts_with("Extract info about"));
        }
    }
    let counted: usize = plan.sections.iter().map(|s| s.total_search_queries).sum();
    assert_eq!(plan.total_queries, counted);
}

#[tokio::test]
async fn test_empty_query_rejected() {
    let shared: SharedLLM = Arc::new(FailingLLM);
    let generator = PlanGenerator::new(shared, PlanningConfig::default());
    let result = generator.generate_plan("   ", &analysis(), None, None).await;
    assert!(matches!(result, Err(PlanError::EmptyQuery)));
}
