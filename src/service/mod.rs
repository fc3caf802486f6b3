// AI service facade
//
// Wraps the provider singleton selected at startup behind the operations
// feature modules actually use. Built once and passed by Arc into every
// feature module; it carries no mutable state, so concurrent invocations
// are safe by construction.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Settings;
use crate::providers::{self, ChatMessage, ChatOptions, ChatRequest, ModelProvider};

pub mod recovery;

/// Facade over the active model provider.
pub struct AiService {
    provider: Arc<dyn ModelProvider>,
}

impl AiService {
    /// Wrap an already-constructed provider (tests inject mocks this way).
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Build the facade from settings: resolves the provider variant once.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = providers::create_provider(settings)?;
        Ok(Self::new(provider))
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One-shot exchange: a system prompt plus a single user message.
    pub async fn chat(
        &self,
        system_prompt: &str,
        user_message: &str,
        options: ChatOptions,
    ) -> Result<String> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_message),
        ])
        .with_options(options);
        self.provider.chat(&request).await
    }

    /// Multi-turn exchange with an explicit, ordered conversation.
    pub async fn conversation(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<String> {
        let request = ChatRequest::new(messages).with_options(options);
        self.provider.chat(&request).await
    }

    /// Embed a piece of text with the active provider.
    pub async fn embedding(&self, text: &str) -> Result<Vec<f32>> {
        self.provider.embed(text).await
    }

    /// Recover structured data from raw model text. `None` means recovery
    /// failed and the caller must fall back.
    pub fn parse_json(&self, raw: &str) -> Option<Value> {
        recovery::parse_json(raw)
    }
}
