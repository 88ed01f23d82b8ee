//! Configuration management for SlideDeck.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `slidedeck.toml` file
//! 3. User config `~/.config/slidedeck/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration.
    pub llm: LLMConfig,

    /// Web server configuration.
    pub server: ServerConfig,

    /// Template registry configuration.
    pub templates: TemplatesConfig,

    /// Plan generation configuration.
    pub planning: PlanningConfig,

    /// Plan execution configuration.
    pub execution: ExecutionConfig,

    /// Storage configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./slidedeck.toml` (project local)
    /// 2. `~/.config/slidedeck/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new("slidedeck.toml").exists() {
            return Self::from_file("slidedeck.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("slidedeck").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // LLM overrides
        if let Ok(provider) = std::env::var("SLIDEDECK_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("SLIDEDECK_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Ok(model) = std::env::var("SLIDEDECK_CONTENT_MODEL") {
            self.llm.content_model = Some(model);
        }
        if let Ok(url) = std::env::var("SLIDEDECK_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("SLIDEDECK_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(tokens) = std::env::var("SLIDEDECK_LLM_MAX_TOKENS") {
            if let Ok(n) = tokens.parse() {
                self.llm.max_tokens = n;
            }
        }

        // Server overrides
        if let Ok(host) = std::env::var("SLIDEDECK_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SLIDEDECK_PORT") {
            if let Ok(n) = port.parse() {
                self.server.port = n;
            }
        }

        // Template and storage overrides
        if let Ok(dir) = std::env::var("SLIDEDECK_TEMPLATES_DIR") {
            self.templates.dir = dir;
        }
        if let Ok(dir) = std::env::var("SLIDEDECK_DATA_DIR") {
            self.storage.data_dir = dir;
        }
        if let Ok(dir) = std::env::var("SLIDEDECK_OUTPUT_DIR") {
            self.execution.output_dir = dir;
        }
    }

    /// Rejects settings that would make the pipeline unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.planning.min_sections == 0 || self.planning.min_sections > self.planning.max_sections {
            return Err(ConfigError::Invalid(format!(
                "planning.min_sections ({}) must be between 1 and max_sections ({})",
                self.planning.min_sections, self.planning.max_sections
            )));
        }
        if self.execution.search_concurrency == 0 || self.execution.content_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "execution concurrency limits must be at least 1".to_string(),
            ));
        }
        if self.templates.entries.is_empty() {
            return Err(ConfigError::Invalid("no templates configured".to_string()));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Provider name: "openai", "anthropic", "ollama", or "openrouter".
    pub provider: String,

    /// Model used for planning (provider-specific).
    pub model: Option<String>,

    /// Model used for search and per-placeholder content. Falls back to `model`.
    pub content_model: Option<String>,

    /// Base URL for API (for openai-compatible providers).
    pub base_url: Option<String>,

    /// API key (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum tokens for response.
    pub max_tokens: u32,

    /// API version (for Anthropic).
    pub api_version: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_LLM_PROVIDER.to_string(),
            model: None,
            content_model: None,
            base_url: None,
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            api_version: Some(DEFAULT_ANTHROPIC_API_VERSION.to_string()),
        }
    }
}

impl LLMConfig {
    /// Get the model name, falling back to provider defaults.
    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider.as_str() {
            "anthropic" | "claude" => DEFAULT_ANTHROPIC_MODEL.to_string(),
            "ollama" => DEFAULT_OLLAMA_MODEL.to_string(),
            _ => DEFAULT_OPENAI_MODEL.to_string(),
        })
    }

    /// Get the content model, falling back to the planning model for
    /// providers without a cheaper default.
    pub fn content_model_or_default(&self) -> String {
        if let Some(model) = &self.content_model {
            return model.clone();
        }
        match self.provider.as_str() {
            "openai" if self.model.is_none() => DEFAULT_OPENAI_CONTENT_MODEL.to_string(),
            _ => self.model_or_default(),
        }
    }

    /// Get the base URL, falling back to provider defaults.
    pub fn base_url_or_default(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| match self.provider.as_str() {
            "anthropic" | "claude" => DEFAULT_ANTHROPIC_URL.to_string(),
            "ollama" => DEFAULT_OLLAMA_URL.to_string(),
            "openrouter" => DEFAULT_OPENROUTER_URL.to_string(),
            _ => DEFAULT_OPENAI_URL.to_string(),
        })
    }

    /// Get API key from config or environment.
    pub fn api_key_or_env(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("SLIDEDECK_LLM_API_KEY").ok())
            .or_else(|| match self.provider.as_str() {
                "anthropic" | "claude" => std::env::var("ANTHROPIC_API_KEY").ok(),
                "openrouter" => std::env::var("OPENROUTER_API_KEY").ok(),
                _ => std::env::var("OPENAI_API_KEY").ok(),
            })
    }

    /// Whether the provider can run without an API key.
    pub fn is_keyless(&self) -> bool {
        self.provider == "ollama"
    }

    /// Returns a copy using `api_key` when one is given.
    pub fn with_api_key(&self, api_key: Option<&str>) -> Self {
        let mut config = self.clone();
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(key.trim().to_string());
        }
        config
    }
}

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Open the UI in a browser after binding.
    pub open_browser: bool,

    /// Largest accepted multipart upload in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            open_browser: false,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// A named template file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Display and lookup name.
    pub name: String,
    /// File name relative to the templates directory (or absolute).
    pub file: String,
    /// Short description shown in the UI.
    #[serde(default)]
    pub caption: String,
}

/// Template registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory holding the template files.
    pub dir: String,

    /// Template used when none is requested.
    pub default: String,

    /// Registered templates, in display order.
    pub entries: Vec<TemplateEntry>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_TEMPLATES_DIR.to_string(),
            default: DEFAULT_TEMPLATE_NAME.to_string(),
            entries: DEFAULT_TEMPLATES
                .iter()
                .map(|(name, file, caption)| TemplateEntry {
                    name: name.to_string(),
                    file: file.to_string(),
                    caption: caption.to_string(),
                })
                .collect(),
        }
    }
}

impl TemplatesConfig {
    /// Full path of a template entry.
    pub fn path_for(&self, entry: &TemplateEntry) -> PathBuf {
        let file = PathBuf::from(&entry.file);
        if file.is_absolute() {
            file
        } else {
            PathBuf::from(&self.dir).join(file)
        }
    }
}

/// Plan generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Lower clamp for the LLM-recommended section count.
    pub min_sections: usize,

    /// Upper clamp for the LLM-recommended section count.
    pub max_sections: usize,

    /// LLM layout-matching attempts before the deterministic fallback.
    pub layout_match_attempts: usize,

    /// LLM tries for a unique subtitle before numbering one.
    pub subtitle_attempts: usize,

    /// Search mode recorded on new plans.
    pub search_mode: String,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            min_sections: DEFAULT_MIN_SECTIONS,
            max_sections: DEFAULT_MAX_SECTIONS,
            layout_match_attempts: DEFAULT_LAYOUT_MATCH_ATTEMPTS,
            subtitle_attempts: DEFAULT_SUBTITLE_ATTEMPTS,
            search_mode: DEFAULT_SEARCH_MODE.to_string(),
        }
    }
}

/// Plan execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Searches in flight at once.
    pub search_concurrency: usize,

    /// Placeholder content generations in flight at once.
    pub content_concurrency: usize,

    /// Ask the LLM to confirm placeholder roles before filling.
    pub llm_role_validation: bool,

    /// Directory for generated decks.
    pub output_dir: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            search_concurrency: DEFAULT_SEARCH_CONCURRENCY,
            content_concurrency: DEFAULT_CONTENT_CONCURRENCY,
            llm_role_validation: false,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for SlideDeck data (default: ".slidedeck").
    pub data_dir: String,

    /// Plan records subdirectory.
    pub plans_dir: String,

    /// Report records subdirectory.
    pub reports_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            plans_dir: DEFAULT_PLANS_DIR.to_string(),
            reports_dir: DEFAULT_REPORTS_DIR.to_string(),
        }
    }
}

impl StorageConfig {
    /// Get the full path to the plans directory.
    pub fn plans_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.plans_dir)
    }

    /// Get the full path to the reports directory.
    pub fn reports_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.reports_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, DEFAULT_LLM_PROVIDER);
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
        assert_eq!(config.storage.data_dir, DEFAULT_DATA_DIR);
        assert_eq!(config.templates.entries.len(), DEFAULT_TEMPLATES.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[llm]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[execution]"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn test_content_model_falls_back() {
        let mut config = LLMConfig::default();
        assert_eq!(config.content_model_or_default(), DEFAULT_OPENAI_CONTENT_MODEL);

        config.model = Some("gpt-4o".to_string());
        assert_eq!(config.content_model_or_default(), "gpt-4o");

        config.provider = "ollama".to_string();
        config.model = None;
        assert_eq!(config.content_model_or_default(), DEFAULT_OLLAMA_MODEL);

        config.content_model = Some("small".to_string());
        assert_eq!(config.content_model_or_default(), "small");
    }

    #[test]
    fn test_with_api_key_ignores_blank() {
        let config = LLMConfig::default();
        assert!(config.with_api_key(Some("  ")).api_key.is_none());
        assert_eq!(config.with_api_key(Some(" sk-1 ")).api_key.as_deref(), Some("sk-1"));
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = Config::default();
        config.planning.min_sections = 20;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_template_path_for_relative_and_absolute() {
        let templates = TemplatesConfig::default();
        let entry = &templates.entries[0];
        assert_eq!(templates.path_for(entry), PathBuf::from(DEFAULT_TEMPLATES_DIR).join(&entry.file));

        let abs = TemplateEntry {
            name: "x".into(),
            file: "/tmp/x.pptx".into(),
            caption: String::new(),
        };
        assert_eq!(templates.path_for(&abs), PathBuf::from("/tmp/x.pptx"));
    }
}
