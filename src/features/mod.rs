// Feature modules
//
// Each module composes prompt construction, a facade call, response
// recovery, and a deterministic fallback into one degrade-safe operation.
// Every operation returns an envelope; no AI-path failure ever escapes as
// an error.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::config::{Capability, FeatureFlags};

pub mod chatbot;
pub mod insights;
pub mod quiz;
pub mod recommendations;
pub mod search;
pub mod summary;

pub use chatbot::{ChatbotEnvelope, Tutor};
pub use insights::{InsightsEnvelope, ProgressInsights};
pub use quiz::{QuizEnvelope, QuizGenerator};
pub use recommendations::{RecommendationEnvelope, Recommender};
pub use search::{SearchEnvelope, SmartSearch};
pub use summary::{CourseSummarizer, SummaryEnvelope};

/// Course catalog entry, shared input shape for several features. Supplied
/// read-only by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub field: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub student_count: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

/// The one degrade-safe transition shared by all six features.
///
/// The AI path runs only when the capability flag is enabled; a disabled
/// flag goes straight to the fallback with no provider call. Any error from
/// the AI path (transport failure, unrecoverable response, missing required
/// key) also lands in the fallback. Never retries. The returned bool is the
/// envelope's `aiGenerated` value.
pub(crate) async fn degrade_safe<T, A, Fut, F>(
    flags: &FeatureFlags,
    capability: Capability,
    ai_path: A,
    fallback: F,
) -> (T, bool)
where
    A: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
    F: FnOnce() -> T,
{
    if !flags.is_enabled(capability) {
        tracing::debug!(%capability, "Capability disabled, using fallback");
        return (fallback(), false);
    }

    match ai_path().await {
        Ok(value) => (value, true),
        Err(e) => {
            tracing::warn!(%capability, error = %e, "AI path failed, using fallback");
            (fallback(), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[tokio::test]
    async fn test_degrade_safe_uses_ai_result() {
        let flags = FeatureFlags::default();
        let (value, ai) =
            degrade_safe(&flags, Capability::Quiz, || async { Ok(1) }, || 2).await;
        assert_eq!(value, 1);
        assert!(ai);
    }

    #[tokio::test]
    async fn test_degrade_safe_error_falls_back() {
        let flags = FeatureFlags::default();
        let (value, ai) = degrade_safe(
            &flags,
            Capability::Quiz,
            || async { bail!("upstream broke") },
            || 2,
        )
        .await;
        assert_eq!(value, 2);
        assert!(!ai);
    }

    #[tokio::test]
    async fn test_degrade_safe_disabled_skips_ai_path() {
        let flags = FeatureFlags::none();
        let (value, ai) = degrade_safe(
            &flags,
            Capability::Quiz,
            || async { panic!("AI path must not run when disabled") },
            || 2,
        )
        .await;
        assert_eq!(value, 2);
        assert!(!ai);
    }
}
