use std::sync::Arc;

use crate::config::{
    LLMConfig, DEFAULT_ANTHROPIC_MODEL, DEFAULT_MAX_TOKENS, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL, DEFAULT_OPENROUTER_URL,
};
use super::{ClaudeClient, LLMError, OpenAIClient, SharedLLM};

/// LLM Provider configuration.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI-compatible endpoint (default, most universal)
    OpenAI {
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
        max_tokens: u32,
    },
    /// Anthropic Claude
    Anthropic {
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
        max_tokens: u32,
        api_version: Option<String>,
    },
    /// Local Ollama instance
    Ollama {
        base_url: Option<String>,
        model: String,
        max_tokens: u32,
    },
    /// OpenRouter (OpenAI-compatible, always needs a key)
    OpenRouter {
        api_key: Option<String>,
        model: Option<String>,
        max_tokens: u32,
    },
}

impl Default for Provider {
    fn default() -> Self {
        Provider::OpenAI {
            base_url: None,
            api_key: None,
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Provider {
    /// Creates a provider from LLMConfig using the planning model.
    pub fn from_config(config: &LLMConfig) -> Self {
        Self::with_model(config, config.model.clone())
    }

    /// Creates a provider from LLMConfig using the content model.
    pub fn content_from_config(config: &LLMConfig) -> Self {
        Self::with_model(config, Some(config.content_model_or_default()))
    }

    fn with_model(config: &LLMConfig, model: Option<String>) -> Self {
        let max_tokens = config.max_tokens;
        match config.provider.to_lowercase().as_str() {
            "anthropic" | "claude" => Provider::Anthropic {
                base_url: config.base_url.clone(),
                api_key: config.api_key_or_env(),
                model,
                max_tokens,
                api_version: config.api_version.clone(),
            },
            "ollama" => Provider::Ollama {
                base_url: config.base_url.clone(),
                model: model.unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                max_tokens,
            },
            "openrouter" => Provider::OpenRouter {
                api_key: config.api_key_or_env(),
                model,
                max_tokens,
            },
            _ => Provider::OpenAI {
                base_url: config.base_url.clone(),
                api_key: config.api_key_or_env(),
                model,
                max_tokens,
            },
        }
    }

    /// Creates an LLM client from the provider configuration.
    pub fn build(self) -> Result<SharedLLM, LLMError> {
        match self {
            Provider::OpenAI {
                base_url,
                api_key,
                model,
                max_tokens,
            } => {
                let base = base_url
                    .or_else(|| std::env::var("SLIDEDECK_LLM_BASE_URL").ok())
                    .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
                    .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());

                let key = api_key
                    .or_else(|| std::env::var("SLIDEDECK_LLM_API_KEY").ok())
                    .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                    .unwrap_or_default();

                // Hosted OpenAI rejects anonymous calls; local servers don't.
                if key.is_empty() && base == DEFAULT_OPENAI_URL {
                    return Err(LLMError::MissingApiKey);
                }

                let mdl = model
                    .or_else(|| std::env::var("SLIDEDECK_LLM_MODEL").ok())
                    .or_else(|| std::env::var("OPENAI_MODEL").ok())
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

                Ok(Arc::new(
                    OpenAIClient::new(base, key, mdl).with_max_tokens(max_tokens),
                ))
            }

            Provider::Anthropic {
                base_url,
                api_key,
                model,
                max_tokens,
                api_version,
            } => {
                let key = api_key
                    .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                    .ok_or(LLMError::MissingApiKey)?;

                let mdl = model
                    .or_else(|| std::env::var("ANTHROPIC_MODEL").ok())
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string());

                let mut client = ClaudeClient::new(key)
                    .with_model(mdl)
                    .with_max_tokens(max_tokens);
                if let Some(url) = base_url {
                    client = client.with_api_url(url);
                }
                if let Some(version) = api_version {
                    client = client.with_api_version(version);
                }
                Ok(Arc::new(client))
            }

            Provider::Ollama {
                base_url,
                model,
                max_tokens,
            } => {
                let base = base_url
                    .or_else(|| {
                        std::env::var("OLLAMA_HOST")
                            .ok()
                            .map(|h| format!("{}/v1", h.trim_end_matches('/')))
                    })
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

                Ok(Arc::new(
                    OpenAIClient::new(base, "", model).with_max_tokens(max_tokens),
                ))
            }

            Provider::OpenRouter {
                api_key,
                model,
                max_tokens,
            } => {
                let key = api_key
                    .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                    .ok_or(LLMError::MissingApiKey)?;
                let mdl = model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

                Ok(Arc::new(
                    OpenAIClient::new(DEFAULT_OPENROUTER_URL, key, mdl).with_max_tokens(max_tokens),
                ))
            }
        }
    }

    /// Builds the planning and content clients for a config.
    ///
    /// Both share provider and credentials; only the model differs.
    pub fn build_pair(config: &LLMConfig) -> Result<(SharedLLM, SharedLLM), LLMError> {
        let planner = Self::from_config(config).build()?;
        let content = Self::content_from_config(config).build()?;
        Ok((planner, content))
    }

    /// Auto-detect provider from environment variables.
    ///
    /// Detection order:
    /// 1. SLIDEDECK_LLM_PROVIDER explicitly set
    /// 2. SLIDEDECK_LLM_BASE_URL set → OpenAI-compatible
    /// 3. ANTHROPIC_API_KEY set → Anthropic
    /// 4. OPENAI_API_KEY set → OpenAI
    /// 5. OLLAMA_HOST set → Ollama
    /// 6. Default to OpenAI-compatible
    pub fn from_env() -> Result<SharedLLM, LLMError> {
        if let Ok(provider) = std::env::var("SLIDEDECK_LLM_PROVIDER") {
            let config = LLMConfig {
                provider: provider.to_lowercase(),
                ..LLMConfig::default()
            };
            return match config.provider.as_str() {
                "openai" | "anthropic" | "claude" | "openrouter" => Self::from_config(&config).build(),
                "ollama" => {
                    let model = std::env::var("SLIDEDECK_LLM_MODEL")
                        .or_else(|_| std::env::var("OLLAMA_MODEL"))
                        .unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());
                    Provider::Ollama {
                        base_url: None,
                        model,
                        max_tokens: DEFAULT_MAX_TOKENS,
                    }
                    .build()
                }
                other => Err(LLMError::UnknownProvider(other.to_string())),
            };
        }

        if std::env::var("ANTHROPIC_API_KEY").is_ok()
            && std::env::var("SLIDEDECK_LLM_BASE_URL").is_err()
        {
            return Provider::Anthropic {
                base_url: None,
                api_key: None,
                model: None,
                max_tokens: DEFAULT_MAX_TOKENS,
                api_version: None,
            }
            .build();
        }

        if std::env::var("OPENAI_API_KEY").is_err()
            && std::env::var("SLIDEDECK_LLM_BASE_URL").is_err()
            && std::env::var("OLLAMA_HOST").is_ok()
        {
            let model = std::env::var("SLIDEDECK_LLM_MODEL")
                .or_else(|_| std::env::var("OLLAMA_MODEL"))
                .unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());
            return Provider::Ollama {
                base_url: None,
                model,
                max_tokens: DEFAULT_MAX_TOKENS,
            }
            .build();
        }

        Provider::default().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provider() {
        let provider = Provider::default();
        assert!(matches!(provider, Provider::OpenAI { .. }));
    }

    #[test]
    fn test_ollama_provider_build() {
        let provider = Provider::Ollama {
            base_url: None,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        };
        // Should succeed without API key
        assert!(provider.build().is_ok());
    }

    #[test]
    fn test_openai_compatible_build() {
        let provider = Provider::OpenAI {
            base_url: Some("http://localhost:8080/v1".to_string()),
            api_key: Some("test".to_string()),
            model: Some("local-model".to_string()),
            max_tokens: 512,
        };
        assert!(provider.build().is_ok());
    }

    #[test]
    fn test_from_config_ollama() {
        let config = LLMConfig {
            provider: "ollama".to_string(),
            model: Some("codellama".to_string()),
            ..LLMConfig::default()
        };

        let provider = Provider::from_config(&config);
        assert!(matches!(provider, Provider::Ollama { model, .. } if model == "codellama"));
    }

    #[test]
    fn test_content_provider_uses_content_model() {
        let config = LLMConfig {
            provider: "openai".to_string(),
            model: Some("gpt-4o".to_string()),
            content_model: Some("gpt-4.1-mini".to_string()),
            api_key: Some("k".to_string()),
            ..LLMConfig::default()
        };

        let provider = Provider::content_from_config(&config);
        assert!(
            matches!(provider, Provider::OpenAI { model: Some(m), .. } if m == "gpt-4.1-mini")
        );
    }

    #[test]
    fn test_openrouter_from_config() {
        let config = LLMConfig {
            provider: "openrouter".to_string(),
            api_key: Some("or-key".to_string()),
            ..LLMConfig::default()
        };
        let provider = Provider::from_config(&config);
        assert!(matches!(provider, Provider::OpenRouter { .. }));
        assert!(provider.build().is_ok());
    }
}
