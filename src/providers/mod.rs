// Multi-provider model support
//
// This module provides an abstraction layer over the text-generation
// backends (OpenAI-compatible, Gemini, offline mock) so feature code works
// against a single interface regardless of which backend is configured.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

pub mod types;

// Provider implementations
pub mod gemini;
pub mod mock;
pub mod openai;

// Role folding for backends without a system role
pub mod folding;

// Provider factory
pub mod factory;

pub use factory::create_provider;
pub use types::{ChatMessage, ChatOptions, ChatRequest, Role};

/// Transport-level failure raised inside a provider client.
///
/// Feature modules never see this directly; the degrade-safe wrapper catches
/// it (via `anyhow`) and switches to the deterministic fallback.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed with status {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: &'static str },
}

/// Trait for text-generation backends.
///
/// All providers implement this, providing a unified interface for chat
/// completion and embedding. Implementations are stateless after
/// construction, so a single instance is shared across concurrent
/// invocations without locking.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send an ordered conversation and get the raw response text.
    ///
    /// The returned text is untyped: it may contain prose, markdown fences,
    /// or malformed JSON. Structure is recovered downstream.
    async fn chat(&self, request: &ChatRequest) -> Result<String>;

    /// Generate an embedding vector for a piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Provider name (e.g. "openai", "gemini", "mock").
    fn name(&self) -> &str;

    /// Default model identifier for this provider.
    fn default_model(&self) -> &str;
}
