// Configuration structs
//
// Settings are resolved once at process start and never mutated afterward.
// Feature flags are read per invocation but come from this immutable
// snapshot, so concurrent reads need no synchronization.

use serde::{Deserialize, Serialize};

/// Which provider backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Mock,
}

impl ProviderKind {
    /// Resolve a selector value. Unrecognized or empty selectors map to the
    /// mock so a misconfigured process still serves every capability.
    pub fn from_selector(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "openai" => ProviderKind::OpenAi,
            "gemini" => ProviderKind::Gemini,
            "mock" | "local" | "offline" => ProviderKind::Mock,
            other => {
                if !other.is_empty() {
                    tracing::warn!(selector = other, "Unknown provider selector, using mock");
                }
                ProviderKind::Mock
            }
        }
    }
}

/// Provider connection and generation defaults. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_kind")]
    pub kind: ProviderKind,

    /// Credential for the active remote provider; unused by the mock.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model override; each provider has its own default.
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Mock,
            api_key: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_kind() -> ProviderKind {
    ProviderKind::Mock
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

/// One AI-generating capability per feature module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Recommendations,
    Search,
    Quiz,
    Chatbot,
    Analytics,
    Summary,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Recommendations => "recommendations",
            Capability::Search => "search",
            Capability::Quiz => "quiz",
            Capability::Chatbot => "chatbot",
            Capability::Analytics => "analytics",
            Capability::Summary => "summary",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-capability enable flags. Everything defaults to enabled; disabling a
/// capability skips the provider call entirely, which makes these an
/// availability and cost control rather than a cosmetic toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub recommendations: bool,
    #[serde(default = "default_true")]
    pub search: bool,
    #[serde(default = "default_true")]
    pub quiz: bool,
    #[serde(default = "default_true")]
    pub chatbot: bool,
    #[serde(default = "default_true")]
    pub analytics: bool,
    #[serde(default = "default_true")]
    pub summary: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            recommendations: true,
            search: true,
            quiz: true,
            chatbot: true,
            analytics: true,
            summary: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl FeatureFlags {
    pub fn is_enabled(&self, capability: Capability) -> bool {
        match capability {
            Capability::Recommendations => self.recommendations,
            Capability::Search => self.search,
            Capability::Quiz => self.quiz,
            Capability::Chatbot => self.chatbot,
            Capability::Analytics => self.analytics,
            Capability::Summary => self.summary,
        }
    }

    /// All capabilities disabled; handy in tests.
    pub fn none() -> Self {
        Self {
            recommendations: false,
            search: false,
            quiz: false,
            chatbot: false,
            analytics: false,
            summary: false,
        }
    }
}

/// Process-wide settings snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub features: FeatureFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_known_values() {
        assert_eq!(ProviderKind::from_selector("openai"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::from_selector("Gemini"), ProviderKind::Gemini);
        assert_eq!(ProviderKind::from_selector("mock"), ProviderKind::Mock);
        assert_eq!(ProviderKind::from_selector("local"), ProviderKind::Mock);
    }

    #[test]
    fn test_selector_unknown_degrades_to_mock() {
        assert_eq!(
            ProviderKind::from_selector("some-future-backend"),
            ProviderKind::Mock
        );
        assert_eq!(ProviderKind::from_selector(""), ProviderKind::Mock);
        assert_eq!(ProviderKind::from_selector("  "), ProviderKind::Mock);
    }

    #[test]
    fn test_flags_default_enabled() {
        let flags = FeatureFlags::default();
        assert!(flags.is_enabled(Capability::Recommendations));
        assert!(flags.is_enabled(Capability::Quiz));
        assert!(flags.is_enabled(Capability::Summary));
    }

    #[test]
    fn test_flags_individual_disable() {
        let flags = FeatureFlags {
            quiz: false,
            ..Default::default()
        };
        assert!(!flags.is_enabled(Capability::Quiz));
        assert!(flags.is_enabled(Capability::Chatbot));
    }

    #[test]
    fn test_settings_toml_partial_fields_use_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [provider]
            kind = "gemini"
            api_key = "g-key"

            [features]
            chatbot = false
            "#,
        )
        .unwrap();
        assert_eq!(settings.provider.kind, ProviderKind::Gemini);
        assert_eq!(settings.provider.max_tokens, 1024);
        assert!(!settings.features.chatbot);
        assert!(settings.features.search);
    }
}
