// Provider factory
//
// Selects the active provider variant from settings, exactly once per
// process lifetime. Configuration problems never fail the process: a remote
// selector without credentials degrades to the mock with a warning.

use anyhow::Result;
use std::sync::Arc;

use super::gemini::GeminiProvider;
use super::mock::MockProvider;
use super::openai::OpenAiProvider;
use super::ModelProvider;
use crate::config::{ProviderKind, Settings};

/// Create the provider selected by the settings snapshot.
pub fn create_provider(settings: &Settings) -> Result<Arc<dyn ModelProvider>> {
    let provider = &settings.provider;

    match provider.kind {
        ProviderKind::OpenAi => match &provider.api_key {
            Some(key) if !key.is_empty() => {
                let mut p = OpenAiProvider::new(key.clone())?
                    .with_generation_defaults(provider.max_tokens, provider.temperature);
                if let Some(model) = &provider.model {
                    p = p.with_model(model.clone());
                }
                tracing::info!(model = p.default_model(), "Using OpenAI-compatible provider");
                Ok(Arc::new(p))
            }
            _ => {
                tracing::warn!("OpenAI provider selected but no API key configured, using mock");
                Ok(Arc::new(MockProvider::new()))
            }
        },

        ProviderKind::Gemini => match &provider.api_key {
            Some(key) if !key.is_empty() => {
                let mut p = GeminiProvider::new(key.clone())?
                    .with_generation_defaults(provider.max_tokens, provider.temperature);
                if let Some(model) = &provider.model {
                    p = p.with_model(model.clone());
                }
                tracing::info!(model = p.default_model(), "Using Gemini provider");
                Ok(Arc::new(p))
            }
            _ => {
                tracing::warn!("Gemini provider selected but no API key configured, using mock");
                Ok(Arc::new(MockProvider::new()))
            }
        },

        ProviderKind::Mock => Ok(Arc::new(MockProvider::new())),
    }
}
