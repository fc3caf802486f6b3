// OpenAI-compatible API provider implementation
//
// Sends the conversation verbatim as role-tagged turns, including the
// system role. Works against any backend exposing the /v1/chat/completions
// and /v1/embeddings shapes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::ChatRequest;
use super::{ModelProvider, ProviderError};

const REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI-compatible chat/embedding provider.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    default_max_tokens: u32,
    default_temperature: f32,
}

impl OpenAiProvider {
    /// Create a new provider with the given API key.
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_max_tokens: 1024,
            default_temperature: 0.7,
        })
    }

    /// Set a custom model for this provider.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Override the base URL (used by tests to point at a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set process-wide generation defaults applied when a request omits
    /// its own options.
    pub fn with_generation_defaults(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }

    /// Convert a ChatRequest to the OpenAI wire format.
    fn to_wire_request(&self, request: &ChatRequest) -> WireRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        WireRequest {
            model: self.default_model.clone(),
            messages,
            max_tokens: request.options.max_tokens.unwrap_or(self.default_max_tokens),
            temperature: request
                .options
                .temperature
                .unwrap_or(self.default_temperature),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let wire_request = self.to_wire_request(request);
        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!(model = %wire_request.model, turns = wire_request.messages.len(),
            "Sending chat request to OpenAI-compatible API");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&wire_request)
            .send()
            .await
            .context("Failed to send request to OpenAI-compatible API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                provider: "openai",
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let completion: WireResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI-compatible API response")?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse { provider: "openai" })?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&EmbeddingRequest {
                model: EMBEDDING_MODEL.to_string(),
                input: text.to_string(),
            })
            .send()
            .await
            .context("Failed to send embedding request to OpenAI-compatible API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                provider: "openai",
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let embedding: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        let entry = embedding
            .data
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse { provider: "openai" })?;

        Ok(entry.embedding)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// Wire types

#[derive(Debug, Clone, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::types::{ChatMessage, ChatOptions};

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("test-key".to_string());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_provider_name_and_model() {
        let provider = OpenAiProvider::new("test-key".to_string())
            .unwrap()
            .with_model("gpt-4o");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4o");
    }

    #[test]
    fn test_system_role_sent_verbatim() {
        let provider = OpenAiProvider::new("key".to_string()).unwrap();
        let request = ChatRequest::new(vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("hi"),
        ]);
        let wire = provider.to_wire_request(&request);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[1].role, "user");
    }

    #[test]
    fn test_options_override_generation_defaults() {
        let provider = OpenAiProvider::new("key".to_string())
            .unwrap()
            .with_generation_defaults(2048, 0.5);
        let request = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_options(ChatOptions::default().with_max_tokens(64));
        let wire = provider.to_wire_request(&request);
        assert_eq!(wire.max_tokens, 64);
        assert_eq!(wire.temperature, 0.5); // falls back to default
    }

    #[tokio::test]
    async fn test_chat_success_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"hello back"}}]}"#,
            )
            .create_async()
            .await;

        let provider = OpenAiProvider::new("key".to_string())
            .unwrap()
            .with_base_url(server.url());
        let request = ChatRequest::new(vec![ChatMessage::user("hello")]);
        let text = provider.chat(&request).await.unwrap();

        assert_eq!(text, "hello back");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_non_2xx_surfaces_upstream_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let provider = OpenAiProvider::new("key".to_string())
            .unwrap()
            .with_base_url(server.url());
        let request = ChatRequest::new(vec![ChatMessage::user("hello")]);
        let err = provider.chat(&request).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("429"), "missing status in: {msg}");
        assert!(msg.contains("rate limited"), "missing body in: {msg}");
    }

    #[tokio::test]
    async fn test_embed_success_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#)
            .create_async()
            .await;

        let provider = OpenAiProvider::new("key".to_string())
            .unwrap()
            .with_base_url(server.url());
        let vector = provider.embed("some text").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }
}
