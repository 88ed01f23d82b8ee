use slidedeck_core::config::{LLMConfig, DEFAULT_OLLAMA_MODEL, DEFAULT_OPENAI_CONTENT_MODEL};
use slidedeck_core::llm::json::parse_json_value;
use slidedeck_core::llm::{ClaudeClient, LLMError, OpenAIClient, Provider};

// Claude client tests
mod claude {
    use super::*;

    #[test]
    fn test_client_builders() {
        let _client = ClaudeClient::new("test-key")
            .with_model("claude-3-opus")
            .with_max_tokens(1024)
            .with_api_url("https://proxy.example.com/v1/messages")
            .with_api_version("2023-06-01");
    }

    #[test]
    fn test_from_env_missing() {
        std::env::remove_var("ANTHROPIC_API_KEY");
        let result = ClaudeClient::from_env();
        assert!(matches!(result, Err(LLMError::MissingApiKey)));
    }
}

// OpenAI-compatible client tests
mod openai {
    use super::*;

    #[test]
    fn test_client_constructors() {
        let client = OpenAIClient::new("https://api.example.com/v1/", "test-key", "gpt-4");
        assert_eq!(client.model(), "gpt-4");
        assert_eq!(OpenAIClient::openai("k", "gpt-4o").model(), "gpt-4o");
        assert_eq!(OpenAIClient::ollama("llama3").model(), "llama3");
        assert_eq!(
            OpenAIClient::openrouter("k", "anthropic/claude-3-opus").model(),
            "anthropic/claude-3-opus"
        );
    }
}

// Provider tests
mod provider {
    use super::*;

    #[test]
    fn test_default_provider() {
        assert!(matches!(Provider::default(), Provider::OpenAI { .. }));
    }

    #[test]
    fn test_ollama_provider_build_needs_no_key() {
        let provider = Provider::Ollama {
            base_url: None,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            max_tokens: 1024,
        };
        assert!(provider.build().is_ok());
    }

    #[test]
    fn test_local_openai_endpoint_build() {
        let provider = Provider::OpenAI {
            base_url: Some("http://localhost:8080/v1".to_string()),
            api_key: Some("test".to_string()),
            model: Some("local-model".to_string()),
            max_tokens: 1024,
        };
        assert!(provider.build().is_ok());
    }

    #[test]
    fn test_from_config_selects_variant() {
        let config = LLMConfig {
            provider: "ollama".to_string(),
            model: Some("mistral".to_string()),
            ..LLMConfig::default()
        };
        let provider = Provider::from_config(&config);
        assert!(matches!(provider, Provider::Ollama { model, .. } if model == "mistral"));

        let config = LLMConfig {
            provider: "anthropic".to_string(),
            ..LLMConfig::default()
        };
        assert!(matches!(Provider::from_config(&config), Provider::Anthropic { .. }));
    }

    #[test]
    fn test_content_model_falls_back() {
        let config = LLMConfig::default();
        let provider = Provider::content_from_config(&config);
        assert!(
            matches!(provider, Provider::OpenAI { model: Some(m), .. } if m == DEFAULT_OPENAI_CONTENT_MODEL)
        );

        let config = LLMConfig {
            model: Some("gpt-4o".to_string()),
            ..LLMConfig::default()
        };
        let provider = Provider::content_from_config(&config);
        assert!(matches!(provider, Provider::OpenAI { model: Some(m), .. } if m == "gpt-4o"));
    }
}

// Lenient JSON parsing of model output
mod json {
    use super::*;

    #[test]
    fn test_fenced_truncated_response() {
        let response = "Here is the deck:\n```json\n{\"title\": \"Q3\", \"slides\": [{\"heading\": \"Revenue\",}";
        let value = parse_json_value(response).unwrap();
        assert_eq!(value["title"], "Q3");
        assert_eq!(value["slides"][0]["heading"], "Revenue");
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            parse_json_value("no json here"),
            Err(LLMError::ParseError(_))
        ));
    }
}
