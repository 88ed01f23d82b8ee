use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::analyzer::TemplateAnalysis;
use crate::config::{LLMConfig, MAX_CHAT_HISTORY};
use crate::llm::json::{clean_json, parse_json};
use crate::llm::{collect_stream, LLMError, Provider, SharedLLM};
use crate::planning::ResearchPlan;
use crate::pptx::{PptxError, BUILTIN_TEMPLATE_NAME};
use crate::templates::{TemplateError, TemplateRegistry};

use super::model::DeckContent;
use super::prompts::{build_initial_prompt, build_refinement_prompt, build_story_guidance, DECK_SYSTEM_PROMPT};
use super::renderer::render_deck;

/// Providers accepted in a `[provider]model` name.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "anthropic", "ollama", "openrouter"];

/// One section of the fixed executive storyline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorySection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub purpose: &'static str,
    pub preferred_story: &'static str,
    pub content_type: &'static str,
}

const STORY: [(&str, &str, &str, &str); 10] = [
    ("opening", "Hook attention with key insight", "focused_message", "bullets"),
    ("overview", "Establish scope and framework", "balanced_comparison", "bullets"),
    ("data_analysis", "Present quantitative evidence", "data_visualization", "chart"),
    ("data_breakdown", "Detailed data comparison", "data_visualization", "table"),
    ("comparison", "Contrast key dimensions", "balanced_comparison", "double_column"),
    ("deep_dive", "Detailed examination", "detailed_analysis", "bullets"),
    ("metrics", "Key performance indicators", "metrics_dashboard", "kpi_dashboard"),
    ("concept_visual", "Illustrate key concepts", "feature_grid", "pictogram"),
    ("implications", "Strategic implications", "three_stage_narrative", "bullets"),
    ("closing", "Clear next steps", "focused_message", "bullets"),
];

/// The ten-section storyline every one-shot deck follows.
pub fn executive_story_plan() -> Vec<StorySection> {
    STORY
        .iter()
        .map(|&(kind, purpose, preferred_story, content_type)| StorySection {
            kind,
            purpose,
            preferred_story,
            content_type,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Splits `[provider]model` into its parts.
pub fn parse_model_name(name: &str) -> Result<(String, String), DeckError> {
    let invalid = || DeckError::InvalidModel(name.to_string());
    let rest = name.trim().strip_prefix('[').ok_or_else(invalid)?;
    let (provider, model) = rest.split_once(']').ok_or_else(invalid)?;
    let provider = provider.trim().to_lowercase();
    let model = model.trim();
    if model.is_empty() || !KNOWN_PROVIDERS.contains(&provider.as_str()) {
        return Err(invalid());
    }
    Ok((provider, model.to_string()))
}

/// Topic text that carries a reviewed plan into the one-shot generator.
pub fn plan_topic(plan: &ResearchPlan) -> String {
    let mut topic = format!("{}\n\n", plan.query);
    for section in &plan.sections {
        topic.push_str(&format!(
            "\n## {}\n{}\n\n*Visualization: {}*\n\n",
            section.section_title, section.section_purpose, section.enforced_content_type
        ));
        for query in section.queries() {
            topic.push_str(&format!("- {}\n", query.query));
        }
    }
    topic
}

/// A one-shot generation session with revision history.
pub struct SlideDeck {
    topic: String,
    llm_config: LLMConfig,
    llm: SharedLLM,
    registry: TemplateRegistry,
    template_idx: usize,
    history: Vec<ChatMessage>,
    last_response: Option<String>,
    additional_info: Option<String>,
    stream: Option<mpsc::UnboundedSender<String>>,
}

impl SlideDeck {
    pub fn new(topic: impl Into<String>, llm: SharedLLM, llm_config: LLMConfig, registry: TemplateRegistry) -> Self {
        Self {
            topic: topic.into(),
            llm_config,
            llm,
            registry,
            template_idx: 0,
            history: Vec::new(),
            last_response: None,
            additional_info: None,
            stream: None,
        }
    }

    /// Builds the model client from `llm_config`.
    pub fn from_config(
        topic: impl Into<String>,
        llm_config: LLMConfig,
        registry: TemplateRegistry,
    ) -> Result<Self, DeckError> {
        let llm = Provider::from_config(&llm_config).build()?;
        Ok(Self::new(topic, llm, llm_config, registry))
    }

    /// Extracted file text added to every prompt.
    pub fn with_additional_info(mut self, info: Option<String>) -> Self {
        self.additional_info = info.filter(|s| !s.trim().is_empty());
        self
    }

    /// Forwards response chunks as they stream in.
    pub fn with_stream(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.stream = Some(tx);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn template_idx(&self) -> usize {
        self.template_idx
    }

    pub fn model(&self) -> String {
        format!("[{}]{}", self.llm_config.provider, self.llm_config.model_or_default())
    }

    /// Generates a deck for the current topic and writes it to `output_path`.
    /// Returns the slide headings, deck title first.
    pub async fn generate(&mut self, output_path: &Path) -> Result<Vec<String>, DeckError> {
        info!(topic = %self.topic, template_idx = self.template_idx, "generating deck");
        let story = executive_story_plan();
        for (n, section) in story.iter().enumerate() {
            debug!(section = n + 1, kind = section.kind, purpose = section.purpose, "story section");
        }
        let prompt = build_initial_prompt(
            &self.topic,
            &build_story_guidance(&story),
            self.additional_info.as_deref().unwrap_or_default(),
        );
        let response = self.ask(&prompt).await?;
        let deck: DeckContent = parse_json(&response)?;
        self.last_response = Some(response);
        self.render(&deck, output_path)
    }

    /// Revises the last deck with `instructions` and re-renders it.
    pub async fn revise(&mut self, instructions: &str, output_path: &Path) -> Result<Vec<String>, DeckError> {
        let previous = self.last_response.clone().ok_or(DeckError::NotGenerated)?;
        if self.history.len() >= MAX_CHAT_HISTORY {
            return Err(DeckError::HistoryFull);
        }
        self.history.push(ChatMessage {
            role: ChatRole::User,
            content: instructions.to_string(),
        });

        let numbered = self
            .history
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .enumerate()
            .map(|(i, m)| format!("{}. {}", i + 1, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = build_refinement_prompt(
            &numbered,
            &previous,
            self.additional_info.as_deref().unwrap_or_default(),
        );
        let response = self.ask(&prompt).await?;
        self.history.push(ChatMessage {
            role: ChatRole::Assistant,
            content: response.clone(),
        });
        let deck: DeckContent = parse_json(&response)?;
        self.last_response = Some(response);
        info!(revisions = self.history.len() / 2, "deck revised");
        self.render(&deck, output_path)
    }

    /// Generates from a reviewed plan by folding its sections into the topic.
    pub async fn generate_from_plan(
        &mut self,
        plan: &ResearchPlan,
        output_path: &Path,
    ) -> Result<Vec<String>, DeckError> {
        self.topic = plan_topic(plan);
        self.generate(output_path).await
    }

    /// Switches to a `[provider]model` name, optionally with a new key.
    pub fn set_model(&mut self, name: &str, api_key: Option<&str>) -> Result<(), DeckError> {
        let (provider, model) = parse_model_name(name)?;
        let mut config = self.llm_config.with_api_key(api_key);
        config.provider = provider;
        config.model = Some(model);
        self.llm = Provider::from_config(&config).build()?;
        self.llm_config = config;
        debug!(model = %self.model(), "model set");
        Ok(())
    }

    /// Out-of-range indices select the first template.
    pub fn set_template(&mut self, idx: usize) {
        self.template_idx = self.registry.clamp_index(idx);
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.last_response = None;
        self.template_idx = 0;
        self.topic.clear();
    }

    async fn ask(&self, prompt: &str) -> Result<String, LLMError> {
        let stream = self.stream.clone();
        let response = collect_stream(self.llm.as_ref(), DECK_SYSTEM_PROMPT, prompt, move |chunk| {
            if let Some(tx) = &stream {
                let _ = tx.send(chunk.to_string());
            }
        })
        .await?;
        info!(chars = response.len(), "response received");
        Ok(clean_json(&response))
    }

    fn render(&self, deck: &DeckContent, output_path: &Path) -> Result<Vec<String>, DeckError> {
        let name = self
            .registry
            .by_index(self.template_idx)
            .map_or(BUILTIN_TEMPLATE_NAME, |e| e.name.as_str());
        let template = self.registry.load(name)?;
        let analysis = TemplateAnalysis::analyze(&template);
        render_deck(&template, &analysis, deck, output_path)
    }
}

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("You must generate a slide deck before you can revise it")]
    NotGenerated,

    #[error("Chat history is full, reset to continue")]
    HistoryFull,

    #[error("Invalid model name: {0} (expected [provider]model, provider one of openai, anthropic, ollama, openrouter)")]
    InvalidModel(String),

    #[error("LLM error: {0}")]
    LLM(#[from] LLMError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Presentation error: {0}")]
    Pptx(#[from] PptxError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_plan_has_unique_types() {
        let story = executive_story_plan();
        assert_eq!(story.len(), 10);
        let mut kinds: Vec<_> = story.iter().map(|s| s.kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), 10);
        assert_eq!(story[6].content_type, "kpi_dashboard");
    }

    #[test]
    fn test_parse_model_name() {
        assert_eq!(
            parse_model_name("[openai]gpt-4o-mini").unwrap(),
            ("openai".to_string(), "gpt-4o-mini".to_string())
        );
        assert_eq!(
            parse_model_name("[OpenRouter]meta-llama/llama-3-70b").unwrap().1,
            "meta-llama/llama-3-70b"
        );
        assert!(parse_model_name("gpt-4o").is_err());
        assert!(parse_model_name("[acme]model").is_err());
        assert!(parse_model_name("[openai]").is_err());
    }
}
