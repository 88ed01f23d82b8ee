use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{CompletionOptions, ImageInput, LLMError, StreamChunk, LLM};
use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_URL, DEFAULT_OPENROUTER_URL};

/// OpenAI-compatible API client.
///
/// Works with any provider that implements the OpenAI chat completions API:
/// - OpenAI
/// - Azure OpenAI
/// - Ollama (http://localhost:11434/v1)
/// - vLLM
/// - llama.cpp
/// - OpenRouter
/// - Groq
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    client: Client,
}

impl OpenAIClient {
    /// Creates a new OpenAI-compatible client.
    ///
    /// # Arguments
    /// * `base_url` - The API base URL (e.g., "https://api.openai.com/v1")
    /// * `api_key` - The API key (can be empty for local providers like Ollama)
    /// * `model` - The model name (e.g., "gpt-4o-mini", "llama3")
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: Client::new(),
        }
    }

    /// Creates a client for OpenAI.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OPENAI_URL, api_key, model)
    }

    /// Creates a client for Ollama (local).
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OLLAMA_URL, "", model)
    }

    /// Creates a client for OpenRouter.
    pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OPENROUTER_URL, api_key, model)
    }

    /// Sets the maximum tokens for responses.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The model this client sends requests to.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        system: Option<&str>,
        user: MessageContent,
        options: &CompletionOptions,
        stream: bool,
    ) -> ChatRequest {
        let mut messages = Vec::new();

        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: MessageContent::Text(sys.to_string()),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user,
        });

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(options.max_tokens.unwrap_or(self.max_tokens)),
            temperature: options.temperature,
            response_format: options.json.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
            stream: stream.then_some(true),
        }
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json");

        // Only add authorization if api_key is not empty
        if !self.api_key.is_empty() {
            req = req.header("authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.json(request).send().await?;
        let status = response.status();

        if status == 429 {
            return Err(LLMError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<String, LLMError> {
        let response = self.post(request).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content)
    }

    async fn send_streaming_request(
        &self,
        request: &ChatRequest,
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        let response = self.post(request).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| LLMError::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer = buffer[pos + 1..].to_string();

                match parse_openai_sse_line(&line) {
                    SseLine::Text(text) => {
                        let _ = tx.send(StreamChunk::text(text));
                    }
                    SseLine::Done => {
                        let _ = tx.send(StreamChunk::done());
                        return Ok(());
                    }
                    SseLine::Skip => {}
                }
            }
        }

        let _ = tx.send(StreamChunk::done());
        Ok(())
    }
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        let request = self.build_request(
            None,
            MessageContent::Text(prompt.to_string()),
            &CompletionOptions::default(),
            false,
        );
        self.send_request(&request).await
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError> {
        self.complete_with_options(system, prompt, &CompletionOptions::default())
            .await
    }

    async fn complete_with_options(
        &self,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LLMError> {
        let request = self.build_request(
            Some(system),
            MessageContent::Text(prompt.to_string()),
            options,
            false,
        );
        self.send_request(&request).await
    }

    async fn complete_with_image(
        &self,
        system: &str,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, LLMError> {
        let parts = vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            },
        ];
        let request = self.build_request(
            Some(system),
            MessageContent::Parts(parts),
            &CompletionOptions::default(),
            false,
        );
        self.send_request(&request).await
    }

    async fn stream_complete(
        &self,
        system: &str,
        prompt: &str,
        tx: mpsc::UnboundedSender<StreamChunk>,
    ) -> Result<(), LLMError> {
        let request = self.build_request(
            Some(system),
            MessageContent::Text(prompt.to_string()),
            &CompletionOptions::default(),
            true,
        );
        self.send_streaming_request(&request, tx).await
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, PartialEq)]
enum SseLine {
    Text(String),
    Done,
    Skip,
}

/// Parse one line of an OpenAI-style SSE stream.
///
/// ```text
/// data: {"choices":[{"delta":{"content":"Hel"}}]}
/// data: [DONE]
/// ```
fn parse_openai_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }

    #[derive(Deserialize)]
    struct StreamEvent {
        #[serde(default)]
        choices: Vec<StreamChoice>,
    }

    #[derive(Deserialize)]
    struct StreamChoice {
        #[serde(default)]
        delta: Delta,
    }

    #[derive(Default, Deserialize)]
    struct Delta {
        #[serde(default)]
        content: Option<String>,
    }

    let Ok(event) = serde_json::from_str::<StreamEvent>(data) else {
        return SseLine::Skip;
    };
    let text: String = event
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();

    if text.is_empty() {
        SseLine::Skip
    } else {
        SseLine::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAIClient::new("https://api.example.com/v1", "test-key", "gpt-4");
        assert_eq!(client.base_url, "https://api.example.com/v1");
        assert_eq!(client.model, "gpt-4");
    }

    #[test]
    fn test_ollama_client() {
        let client = OpenAIClient::ollama("llama3");
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert!(client.api_key.is_empty());
    }

    #[test]
    fn test_url_trailing_slash_removed() {
        let client = OpenAIClient::new("https://api.example.com/v1/", "key", "model");
        assert_eq!(client.base_url, "https://api.example.com/v1");
    }

    #[test]
    fn test_request_carries_options() {
        let client = OpenAIClient::openai("k", "gpt-4o-mini").with_max_tokens(100);
        let options = CompletionOptions::temperature(0.9).json();
        let request = client.build_request(
            Some("sys"),
            MessageContent::Text("hi".into()),
            &options,
            false,
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["response_format"]["type"], "json_object");
        assert!((value["temperature"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert!(value.get("stream").is_none());
        assert_eq!(value["messages"][0]["role"], "system");
    }

    #[test]
    fn test_image_parts_serialize() {
        let client = OpenAIClient::openai("k", "gpt-4o");
        let parts = vec![
            ContentPart::Text { text: "read".into() },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,AA==".into(),
                },
            },
        ];
        let request = client.build_request(None, MessageContent::Parts(parts), &CompletionOptions::default(), false);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["content"][0]["type"], "text");
        assert_eq!(value["messages"][0]["content"][1]["type"], "image_url");
    }

    #[test]
    fn test_parse_sse_lines() {
        assert_eq!(
            parse_openai_sse_line(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#),
            SseLine::Text("Hel".into())
        );
        assert_eq!(parse_openai_sse_line("data: [DONE]"), SseLine::Done);
        assert_eq!(parse_openai_sse_line(": keep-alive"), SseLine::Skip);
        assert_eq!(
            parse_openai_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Skip
        );
    }
}
