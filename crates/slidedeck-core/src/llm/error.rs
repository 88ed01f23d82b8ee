use thiserror::Error;

/// Errors from model calls and from reading their answers.
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("Missing API key. Pass api_key or set OPENAI_API_KEY, ANTHROPIC_API_KEY or OPENROUTER_API_KEY.")]
    MissingApiKey,

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Model request failed: {0}")]
    RequestFailed(String),

    #[error("Model API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The model answered but the text was not what the caller asked for.
    #[error("Could not read model response: {0}")]
    ParseError(String),

    #[error("Rate limited by the model provider. Try again later.")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unknown provider: {0} (expected openai, anthropic, ollama or openrouter)")]
    UnknownProvider(String),

    #[error("Model client does not support {0}")]
    Unsupported(String),
}

impl LLMError {
    /// Failures worth a second attempt with the same prompt.
    pub fn is_transient(&self) -> bool {
        matches!(self, LLMError::RateLimited | LLMError::Network(_))
            || matches!(self, LLMError::ApiError { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        LLMError::Network(err.to_string())
    }
}
