mod claude;
mod error;
pub mod json;
mod openai;
mod provider;

pub use claude::ClaudeClient;
pub use error::LLMError;
pub use openai::OpenAIClient;
pub use provider::Provider;

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use tokio::sync::mpsc;

/// A chunk of streamed response from an LLM.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    /// The text content of this chunk.
    pub text: String,
    /// Whether this is the final chunk.
    pub is_final: bool,
}

impl StreamChunk {
    /// Create a new text chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// Create a final (end of stream) chunk.
    pub fn done() -> Self {
        Self {
            text: String::new(),
            is_final: true,
        }
    }
}

/// Per-request sampling options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature; provider default when unset.
    pub temperature: Option<f32>,
    /// Response token cap; client default when unset.
    pub max_tokens: Option<u32>,
    /// Ask the provider for a JSON object response where supported.
    pub json: bool,
}

impl CompletionOptions {
    /// Options with only a temperature.
    pub fn temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }

    /// Request JSON mode.
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Caps the response length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// An image attached to a vision request.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 payload (no data-URL prefix).
    pub data: String,
}

impl ImageInput {
    /// Encodes raw image bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// The image as a `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Trait for Large Language Model providers.
///
/// This abstraction allows swapping between different LLM providers
/// without changing the rest of the code. Every agent in the pipeline
/// (planner, search, content, role validation) talks to the model only
/// through this trait, so tests can substitute a scripted implementation.
///
/// # Supported Providers
///
/// - **OpenAI-compatible** (default): Works with OpenAI, Azure, Ollama, vLLM, OpenRouter, etc.
/// - **Anthropic**: Claude models via Anthropic API
/// - **Ollama**: Local models via Ollama
///
/// # Example
///
/// ```ignore
/// use slidedeck_core::llm::{CompletionOptions, Provider, LLM};
///
/// let llm = Provider::from_env()?;
/// let json = llm
///     .complete_with_options("Return JSON.", "List three colors", &CompletionOptions::temperature(0.2).json())
///     .await?;
/// ```
#[async_trait]
pub trait LLM: Send + Sync {
    /// Complete a prompt and return the response.
    async fn complete(&self, prompt: &str) -> Result<String, LLMError>;

    /// Complete a prompt with a system message.
    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError>;

    /// Complete with explicit sampling options.
    ///
    /// Default implementation ignores the options.
    async fn complete_with_options(
        &self,
        system: &str,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, LLMError> {
        self.complete_with_system(system, prompt).await
    }

    /// Complete a prompt that refers to an attached image.
    async fn complete_with_image(
        &self,
        _system: &str,
        _prompt: &str,
        _image: &ImageInput,
    ) -> Result<String, LLMError> {
        Err(LLMError::Unsupported("image input".to_string()))
    }

    /// Stream a completion with a system message.
    ///
    /// Sends chunks through the provided channel as they arrive.
    /// The final chunk will have `is_final: true`.
    ///
    /// Default implementation falls back to non-streaming and sends
    /// the entire response as a single chunk.
    async fn stream_complete(
        &self,
        system: &str,
        prompt: &str,
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        let response = self.complete_with_system(system, prompt).await?;
        let _ = tx.send(StreamChunk::text(response));
        let _ = tx.send(StreamChunk::done());
        Ok(())
    }

    /// Returns true if this provider supports streaming.
    fn supports_streaming(&self) -> bool {
        false
    }
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl LLM for Box<dyn LLM> {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        (**self).complete(prompt).await
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError> {
        (**self).complete_with_system(system, prompt).await
    }

    async fn complete_with_options(
        &self,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LLMError> {
        (**self).complete_with_options(system, prompt, options).await
    }

    async fn complete_with_image(
        &self,
        system: &str,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, LLMError> {
        (**self).complete_with_image(system, prompt, image).await
    }

    async fn stream_complete(
        &self,
        system: &str,
        prompt: &str,
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        (**self).stream_complete(system, prompt, tx).await
    }

    fn supports_streaming(&self) -> bool {
        (**self).supports_streaming()
    }
}

/// Shared handles, so one client can back several agents.
#[async_trait]
impl<T: LLM + ?Sized> LLM for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        (**self).complete(prompt).await
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError> {
        (**self).complete_with_system(system, prompt).await
    }

    async fn complete_with_options(
        &self,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LLMError> {
        (**self).complete_with_options(system, prompt, options).await
    }

    async fn complete_with_image(
        &self,
        system: &str,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, LLMError> {
        (**self).complete_with_image(system, prompt, image).await
    }

    async fn stream_complete(
        &self,
        system: &str,
        prompt: &str,
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        (**self).stream_complete(system, prompt, tx).await
    }

    fn supports_streaming(&self) -> bool {
        (**self).supports_streaming()
    }
}

/// A reference-counted LLM client.
pub type SharedLLM = Arc<dyn LLM>;

/// Runs a streaming completion and collects the text.
///
/// `on_chunk` sees each non-empty chunk as it arrives.
pub async fn collect_stream<L: LLM + ?Sized>(
    llm: &L,
    system: &str,
    prompt: &str,
    mut on_chunk: impl FnMut(&str) + Send,
) -> Result<String, LLMError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let request = llm.stream_complete(system, prompt, tx);
    let consume = async {
        let mut response = String::new();
        while let Some(chunk) = rx.recv().await {
            if chunk.is_final {
                break;
            }
            if !chunk.text.is_empty() {
                on_chunk(&chunk.text);
                response.push_str(&chunk.text);
            }
        }
        response
    };
    let (result, response) = tokio::join!(request, consume);
    result?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LLM for Echo {
        async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
            Ok(prompt.to_string())
        }

        async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError> {
            Ok(format!("{system}|{prompt}"))
        }
    }

    #[tokio::test]
    async fn test_default_stream_sends_single_chunk() {
        let mut seen = Vec::new();
        let text = collect_stream(&Echo, "sys", "hi", |c| seen.push(c.to_string()))
            .await
            .unwrap();
        assert_eq!(text, "sys|hi");
        assert_eq!(seen, vec!["sys|hi".to_string()]);
    }

    #[tokio::test]
    async fn test_default_image_is_unsupported() {
        let image = ImageInput::from_bytes("image/png", &[1, 2, 3]);
        let err = Echo.complete_with_image("s", "p", &image).await.unwrap_err();
        assert!(matches!(err, LLMError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_arc_forwards_options_default() {
        let shared: SharedLLM = Arc::new(Echo);
        let out = shared
            .complete_with_options("a", "b", &CompletionOptions::temperature(0.3).json())
            .await
            .unwrap();
        assert_eq!(out, "a|b");
    }

    #[test]
    fn test_image_data_url() {
        let image = ImageInput::from_bytes("image/png", b"abc");
        assert_eq!(image.data_url(), "data:image/png;base64,YWJj");
    }
}
