//! Shared fixtures: a scripted model and the in-memory built-in template.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use slidedeck_core::config::{StorageConfig, TemplateEntry, TemplatesConfig};
use slidedeck_core::llm::{LLMError, SharedLLM, LLM};
use slidedeck_core::planning::{
    Dimensions, PlaceholderContentSpec, PlanAnalysis, ResearchPlan, SearchQuery, SectionPlan,
};
use slidedeck_core::pptx::{blank_template, Template};
use slidedeck_core::{FileStorage, TemplateRegistry};

/// Answers by the first rule whose needle appears in the system prompt or
/// the prompt, else with the fallback. Records every prompt it sees.
pub struct ScriptedLLM {
    rules: Vec<(String, String)>,
    fallback: String,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLLM {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: fallback.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((needle.into(), response.into()));
        self
    }

    pub fn shared(self) -> (Arc<Self>, SharedLLM) {
        let llm = Arc::new(self);
        let shared: SharedLLM = llm.clone();
        (llm, shared)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, system: &str, prompt: &str) -> String {
        self.calls.lock().unwrap().push(prompt.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| system.contains(needle.as_str()) || prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        Ok(self.respond("", prompt))
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError> {
        Ok(self.respond(system, prompt))
    }
}

/// A model whose every call fails.
pub struct FailingLLM;

#[async_trait]
impl LLM for FailingLLM {
    async fn complete(&self, _prompt: &str) -> Result<String, LLMError> {
        Err(LLMError::RateLimited)
    }

    async fn complete_with_system(&self, _system: &str, _prompt: &str) -> Result<String, LLMError> {
        Err(LLMError::RateLimited)
    }
}

/// The built-in layouts as a parsed template.
pub fn template() -> Template {
    let bytes = blank_template().unwrap();
    Template::from_bytes(&bytes, "Basic").unwrap()
}

/// A registry whose entries point at missing files, so every entry loads
/// the built-in layouts.
pub fn registry(temp: &TempDir) -> TemplateRegistry {
    TemplateRegistry::new(TemplatesConfig {
        dir: temp.path().join("templates").to_string_lossy().to_string(),
        default: "Basic".to_string(),
        entries: vec![
            TemplateEntry {
                name: "Basic".to_string(),
                file: "Basic.pptx".to_string(),
                caption: "Plain layouts".to_string(),
            },
            TemplateEntry {
                name: "Minimal".to_string(),
                file: "Minimal.pptx".to_string(),
                caption: String::new(),
            },
        ],
    })
}

pub fn storage(temp: &TempDir) -> FileStorage {
    FileStorage::with_config(StorageConfig {
        data_dir: temp.path().join("data").to_string_lossy().to_string(),
        ..StorageConfig::default()
    })
}

/// One placeholder spec with the given search queries.
pub fn spec(idx: u32, placeholder_type: &str, content_type: &str, queries: &[&str]) -> PlaceholderContentSpec {
    PlaceholderContentSpec {
        placeholder_idx: idx,
        placeholder_type: placeholder_type.to_string(),
        content_type: content_type.to_string(),
        content_description: format!("{content_type} content"),
        search_queries: queries.iter().map(|q| SearchQuery::new(*q, "supporting data")).collect(),
        position_group: String::new(),
        role: "content".to_string(),
        dimensions: Dimensions::default(),
    }
}

pub fn section(title: &str, layout_idx: usize, layout_type: &str, enforced: &str) -> SectionPlan {
    SectionPlan {
        section_title: title.to_string(),
        section_purpose: format!("Explain {title}"),
        layout_type: layout_type.to_string(),
        layout_idx,
        layout_story: String::new(),
        placeholder_specs: Vec::new(),
        total_search_queries: 0,
        enforced_content_type: enforced.to_string(),
    }
}

/// Two sections on the built-in "Title and Content" and "Chart" layouts.
pub fn sample_plan() -> ResearchPlan {
    let mut market = section("Market Overview", 1, "Title and Content", "bullets");
    market.placeholder_specs = vec![
        spec(0, "title", "text", &[]),
        spec(1, "obj", "bullets", &["EV market size 2024", "EV unit sales by region"]),
    ];
    let mut growth = section("Revenue Growth", 9, "Chart", "chart");
    growth.placeholder_specs = vec![
        spec(0, "title", "text", &[]),
        spec(1, "chart", "column_chart", &["EV revenue by year", "EV market size 2024"]),
    ];
    ResearchPlan::new(
        "Electric vehicle market",
        PlanAnalysis {
            main_subject: "Electric vehicles".to_string(),
            ..PlanAnalysis::default()
        },
        vec![market, growth],
    )
}
