use slidedeck_core::config::{
    LLMConfig, DEFAULT_ANTHROPIC_MODEL, DEFAULT_DATA_DIR, DEFAULT_LLM_PROVIDER, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OPENAI_MODEL, DEFAULT_SERVER_PORT, DEFAULT_TEMPLATE_NAME,
};
use slidedeck_core::{Config, ConfigError};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.llm.provider, DEFAULT_LLM_PROVIDER);
    assert_eq!(config.storage.data_dir, DEFAULT_DATA_DIR);
    assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
    assert_eq!(config.templates.default, DEFAULT_TEMPLATE_NAME);
    assert!(!config.templates.entries.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_config_string_sections() {
    let toml_str = Config::default_config_string();
    for section in ["[llm]", "[server]", "[templates]", "[planning]", "[execution]", "[storage]"] {
        assert!(toml_str.contains(section), "missing {section}");
    }
    // Keys never land in a generated file
    assert!(!toml_str.contains("api_key"));
}

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
[llm]
provider = "ollama"
model = "llama3"

[server]
port = 8080

[execution]
search_concurrency = 2

[storage]
data_dir = ".custom-slidedeck"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.llm.provider, "ollama");
    assert_eq!(config.llm.model, Some("llama3".to_string()));
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.execution.search_concurrency, 2);
    assert_eq!(config.storage.data_dir, ".custom-slidedeck");
    // Unset sections keep their defaults
    assert_eq!(config.templates.default, DEFAULT_TEMPLATE_NAME);
}

#[test]
fn test_from_file_rejects_invalid_sections() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("slidedeck.toml");
    std::fs::write(&path, "[planning]\nmin_sections = 9\nmax_sections = 3\n").unwrap();
    assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));

    std::fs::write(&path, "[execution]\ncontent_concurrency = 0\n").unwrap();
    assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_model_or_default() {
    let mut config = LLMConfig {
        provider: "anthropic".to_string(),
        ..Default::default()
    };
    assert_eq!(config.model_or_default(), DEFAULT_ANTHROPIC_MODEL);

    config.provider = "ollama".to_string();
    assert_eq!(config.model_or_default(), DEFAULT_OLLAMA_MODEL);

    config.provider = "openai".to_string();
    assert_eq!(config.model_or_default(), DEFAULT_OPENAI_MODEL);

    config.model = Some("custom-model".to_string());
    assert_eq!(config.model_or_default(), "custom-model");
}

#[test]
fn test_with_api_key_ignores_blank() {
    let config = LLMConfig {
        api_key: Some("configured".to_string()),
        ..Default::default()
    };
    assert_eq!(config.with_api_key(Some("  ")).api_key.as_deref(), Some("configured"));
    assert_eq!(config.with_api_key(Some(" sk-1 ")).api_key.as_deref(), Some("sk-1"));
    assert_eq!(config.with_api_key(None).api_key.as_deref(), Some("configured"));
}
