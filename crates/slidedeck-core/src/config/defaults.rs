//! Default values for SlideDeck configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// LLM Defaults
// ============================================================================

/// Default LLM provider.
pub const DEFAULT_LLM_PROVIDER: &str = "openai";

/// Default max tokens for LLM responses.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

// OpenAI defaults
/// Default OpenAI API URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
/// Default OpenAI model used for planning.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default OpenAI model used for per-placeholder content and search.
pub const DEFAULT_OPENAI_CONTENT_MODEL: &str = "gpt-4.1-mini";

// Anthropic defaults
/// Default Anthropic API URL.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
/// Default Anthropic API version.
pub const DEFAULT_ANTHROPIC_API_VERSION: &str = "2023-06-01";

// Ollama defaults
/// Default Ollama API URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1";
/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

// OpenRouter defaults
/// Default OpenRouter API URL.
pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

// ============================================================================
// Server Defaults
// ============================================================================

/// Default bind address for the web UI.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default port for the web UI.
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Largest accepted upload (10 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// Template Defaults
// ============================================================================

/// Directory holding the `.pptx` templates.
pub const DEFAULT_TEMPLATES_DIR: &str = "pptx_templates";

/// Template used when a request does not name one.
pub const DEFAULT_TEMPLATE_NAME: &str = "Basic";

/// Built-in template registry: (name, file, caption).
pub const DEFAULT_TEMPLATES: &[(&str, &str, &str)] = &[
    ("Basic", "Blank.pptx", "A good start (uses photos)"),
    ("Ion Boardroom", "Ion_Boardroom.pptx", "Make some bold decisions"),
    ("Minimalist Sales Pitch", "Minimalist_sales_pitch.pptx", "In high contrast"),
    ("Urban Monochrome", "Urban_monochrome.pptx", "Marvel in a monochrome dream"),
];

// ============================================================================
// Planning Defaults
// ============================================================================

/// Fewest sections an LLM recommendation may produce.
pub const DEFAULT_MIN_SECTIONS: usize = 4;

/// Most sections an LLM recommendation may produce.
pub const DEFAULT_MAX_SECTIONS: usize = 15;

/// Bounds used when the section count falls back to the aspect count.
pub const FALLBACK_MIN_SECTIONS: usize = 6;
pub const FALLBACK_MAX_SECTIONS: usize = 10;

/// Attempts at LLM layout matching before falling back to the matcher.
pub const DEFAULT_LAYOUT_MATCH_ATTEMPTS: usize = 3;

/// Attempts at generating a unique subtitle heading.
pub const DEFAULT_SUBTITLE_ATTEMPTS: usize = 5;

/// Characters of uploaded content passed to the analysis prompt.
pub const ANALYSIS_CONTENT_CHARS: usize = 2000;

/// Characters of uploaded content passed to the topic prompt.
pub const TOPIC_CONTENT_CHARS: usize = 3000;

/// Default search mode recorded on plans.
pub const DEFAULT_SEARCH_MODE: &str = "normal";

// ============================================================================
// Execution Defaults
// ============================================================================

/// Concurrent simulated web searches.
pub const DEFAULT_SEARCH_CONCURRENCY: usize = 5;

/// Concurrent per-placeholder content generations.
pub const DEFAULT_CONTENT_CONCURRENCY: usize = 4;

/// Facts kept per search.
pub const MAX_FACTS_PER_SEARCH: usize = 5;

/// Directory for generated decks.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Subtitle written on the opening slide.
pub const TITLE_SLIDE_SUBTITLE: &str = "Generated by SlideDeck AI";

/// Title of the closing slide.
pub const CLOSING_SLIDE_TITLE: &str = "Thank You!";

/// Messages kept in a revision session before it must be reset.
pub const MAX_CHAT_HISTORY: usize = 16;

/// Characters of a file passed to the chart-structuring prompt.
pub const CHART_CONTENT_CHARS: usize = 5000;

// ============================================================================
// Storage Defaults
// ============================================================================

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = ".slidedeck";

/// Plans subdirectory.
pub const DEFAULT_PLANS_DIR: &str = "plans";

/// Reports subdirectory.
pub const DEFAULT_REPORTS_DIR: &str = "reports";
