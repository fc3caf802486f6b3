// Google Gemini API provider implementation
//
// Gemini has no system role and labels assistant turns "model", so
// conversations are adapted through `folding::fold_messages` before hitting
// the wire. Failure behavior matches the OpenAI-compatible provider: any
// non-2xx surfaces the upstream status and body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::folding::fold_messages;
use super::types::ChatRequest;
use super::{ModelProvider, ProviderError};

const REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const EMBEDDING_MODEL: &str = "text-embedding-004";

/// Google Gemini chat/embedding provider.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    default_max_tokens: u32,
    default_temperature: f32,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
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

    /// Create with custom default model.
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

    /// Convert a ChatRequest to the Gemini wire format.
    fn to_wire_request(&self, request: &ChatRequest) -> WireRequest {
        let contents = fold_messages(&request.messages)
            .into_iter()
            .map(|turn| WireContent {
                role: turn.role.to_string(),
                parts: vec![WirePart { text: turn.content }],
            })
            .collect();

        WireRequest {
            contents,
            generation_config: WireGenerationConfig {
                max_output_tokens: request.options.max_tokens.unwrap_or(self.default_max_tokens),
                temperature: request
                    .options
                    .temperature
                    .unwrap_or(self.default_temperature),
            },
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let wire_request = self.to_wire_request(request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.default_model, self.api_key
        );

        tracing::debug!(model = %self.default_model, turns = wire_request.contents.len(),
            "Sending chat request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&wire_request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                provider: "gemini",
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let completion: WireResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        let candidate = completion
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse { provider: "gemini" })?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(text)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/v1beta/models/{}:embedContent?key={}",
            self.base_url, EMBEDDING_MODEL, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&EmbedRequest {
                content: WireContent {
                    role: "user".to_string(),
                    parts: vec![WirePart {
                        text: text.to_string(),
                    }],
                },
            })
            .send()
            .await
            .context("Failed to send embedding request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                provider: "gemini",
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let embedding: EmbedResponse = response
            .json()
            .await
            .context("Failed to parse Gemini embedding response")?;

        Ok(embedding.embedding.values)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// Gemini wire types

#[derive(Debug, Clone, Serialize)]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(rename = "generationConfig")]
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireContent {
    role: String, // "user" or "model"
    parts: Vec<WirePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WirePart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct WireGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct WireResponse {
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireCandidate {
    content: WireContent,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest {
    content: WireContent,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embedding: EmbedValues,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}
