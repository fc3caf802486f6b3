// Configuration loader
// Reads ~/.eduforge/config.toml when present, then applies environment
// overrides. A missing or unparseable selector never fails the process; it
// degrades to the mock provider instead.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use super::settings::{ProviderKind, Settings};

const PROVIDER_VAR: &str = "EDUFORGE_AI_PROVIDER";
const MAX_TOKENS_VAR: &str = "EDUFORGE_AI_MAX_TOKENS";
const TEMPERATURE_VAR: &str = "EDUFORGE_AI_TEMPERATURE";

/// Load process-wide settings: config file first, env overrides second.
pub fn load_settings() -> Result<Settings> {
    let mut settings = match config_path() {
        Some(path) if path.exists() => match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Settings>(&contents) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e,
                        "Could not parse config file, falling back to defaults");
                    Settings::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e,
                    "Could not read config file, falling back to defaults");
                Settings::default()
            }
        },
        _ => Settings::default(),
    };

    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("EDUFORGE_CONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::home_dir().map(|home| home.join(".eduforge/config.toml"))
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(selector) = std::env::var(PROVIDER_VAR) {
        settings.provider.kind = ProviderKind::from_selector(&selector);
    }

    // One credential/model pair per remote provider; the pair matching the
    // active selector wins.
    match settings.provider.kind {
        ProviderKind::OpenAi => {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                if !key.is_empty() {
                    settings.provider.api_key = Some(key);
                }
            }
            if let Ok(model) = std::env::var("OPENAI_MODEL") {
                if !model.is_empty() {
                    settings.provider.model = Some(model);
                }
            }
        }
        ProviderKind::Gemini => {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                if !key.is_empty() {
                    settings.provider.api_key = Some(key);
                }
            }
            if let Ok(model) = std::env::var("GEMINI_MODEL") {
                if !model.is_empty() {
                    settings.provider.model = Some(model);
                }
            }
        }
        ProviderKind::Mock => {}
    }

    if let Some(max_tokens) = env_parse::<u32>(MAX_TOKENS_VAR) {
        settings.provider.max_tokens = max_tokens;
    }
    if let Some(temperature) = env_parse::<f32>(TEMPERATURE_VAR) {
        settings.provider.temperature = temperature;
    }

    // Capability flags: absence means enabled
    apply_flag("EDUFORGE_FEATURE_RECOMMENDATIONS", &mut settings.features.recommendations);
    apply_flag("EDUFORGE_FEATURE_SEARCH", &mut settings.features.search);
    apply_flag("EDUFORGE_FEATURE_QUIZ", &mut settings.features.quiz);
    apply_flag("EDUFORGE_FEATURE_CHATBOT", &mut settings.features.chatbot);
    apply_flag("EDUFORGE_FEATURE_ANALYTICS", &mut settings.features.analytics);
    apply_flag("EDUFORGE_FEATURE_SUMMARY", &mut settings.features.summary);
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}

fn apply_flag(var: &str, flag: &mut bool) {
    if let Ok(value) = std::env::var(var) {
        *flag = !matches!(
            value.trim().to_lowercase().as_str(),
            "false" | "0" | "off" | "no" | "disabled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_flag_recognizes_disable_values() {
        for disable in ["false", "0", "off", "NO", "Disabled"] {
            let mut flag = true;
            std::env::set_var("EDUFORGE_TEST_FLAG", disable);
            apply_flag("EDUFORGE_TEST_FLAG", &mut flag);
            assert!(!flag, "{disable} should disable");
        }
        std::env::remove_var("EDUFORGE_TEST_FLAG");
    }

    #[test]
    fn test_apply_flag_absent_leaves_enabled() {
        let mut flag = true;
        apply_flag("EDUFORGE_TEST_FLAG_ABSENT", &mut flag);
        assert!(flag);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("EDUFORGE_TEST_NUM", "not-a-number");
        assert_eq!(env_parse::<u32>("EDUFORGE_TEST_NUM"), None);
        std::env::set_var("EDUFORGE_TEST_NUM", "2048");
        assert_eq!(env_parse::<u32>("EDUFORGE_TEST_NUM"), Some(2048));
        std::env::remove_var("EDUFORGE_TEST_NUM");
    }
}
