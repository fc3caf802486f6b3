// Progress analytics
//
// The metrics engine runs first in every path; its numbers go into the
// envelope untouched and into the prompt verbatim. The model only adds a
// narrative on top and is never allowed to re-derive the numbers, so the
// figures a learner sees cannot contradict the prompt context.

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::degrade_safe;
use crate::analytics::{LearnerActivity, LearningMetrics};
use crate::config::{Capability, FeatureFlags};
use crate::providers::ChatOptions;
use crate::service::AiService;

const SYSTEM_PROMPT: &str = "You are a learning coach. You receive precomputed study metrics; \
    never recalculate or contradict them, only interpret them. Respond with JSON only: \
    {\"insights\": {\"summary\", \"strengths\": [..], \"focusAreas\": [..]}}.";

/// Narrative laid over the computed metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightNarrative {
    pub summary: String,
    pub strengths: Vec<String>,
    pub focus_areas: Vec<String>,
}

/// Envelope returned by every analytics call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsEnvelope {
    pub success: bool,
    pub ai_generated: bool,
    pub metrics: LearningMetrics,
    pub insights: InsightNarrative,
}

/// Progress analytics feature module.
pub struct ProgressInsights {
    service: Arc<AiService>,
    flags: FeatureFlags,
}

impl ProgressInsights {
    pub fn new(service: Arc<AiService>, flags: FeatureFlags) -> Self {
        Self { service, flags }
    }

    /// Compute metrics and, when enabled, overlay a narrative insight.
    pub async fn analyze(&self, activity: &LearnerActivity) -> InsightsEnvelope {
        let metrics = LearningMetrics::compute(activity, Utc::now().date_naive());

        let (insights, ai_generated) = degrade_safe(
            &self.flags,
            Capability::Analytics,
            || self.ai_narrative(&metrics),
            || fallback_narrative(&metrics),
        )
        .await;

        InsightsEnvelope {
            success: true,
            ai_generated,
            metrics,
            insights,
        }
    }

    async fn ai_narrative(&self, metrics: &LearningMetrics) -> Result<InsightNarrative> {
        // Computed numbers go in verbatim; the model must not re-derive them
        let user_message = format!(
            "Study progress metrics (already computed, interpret only):\n\
             - quiz average: {:.1}\n\
             - total study hours: {}\n\
             - study streak: {} days\n\
             - peak study time: {}\n\
             - completion rate: {:.1}%\n\
             - cohort percentile: {:.0}",
            metrics.quiz_average,
            metrics.total_study_hours,
            metrics.study_streak_days,
            metrics.peak_study_time,
            metrics.completion_rate,
            metrics.percentile,
        );

        let raw = self
            .service
            .chat(SYSTEM_PROMPT, &user_message, ChatOptions::default())
            .await?;

        let Some(payload) = self.service.parse_json(&raw) else {
            bail!("Response was not recoverable JSON");
        };
        let Some(insights) = payload.get("insights") else {
            bail!("Payload missing 'insights' key");
        };

        let Some(summary) = insights.get("summary").and_then(|v| v.as_str()) else {
            bail!("Insight payload missing a summary");
        };

        Ok(InsightNarrative {
            summary: summary.to_string(),
            strengths: string_list(insights, "strengths"),
            focus_areas: string_list(insights, "focusAreas"),
        })
    }
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Deterministic narrative derived from the metrics alone.
fn fallback_narrative(metrics: &LearningMetrics) -> InsightNarrative {
    let mut strengths = Vec::new();
    let mut focus_areas = Vec::new();

    if metrics.study_streak_days >= 3 {
        strengths.push(format!(
            "You have studied {} days in a row - consistency is working for you",
            metrics.study_streak_days
        ));
    } else {
        focus_areas.push("Build a daily study habit, even short sessions count".to_string());
    }

    if metrics.quiz_average >= 75.0 {
        strengths.push(format!(
            "Quiz average of {:.0} shows solid understanding",
            metrics.quiz_average
        ));
    } else {
        focus_areas.push("Revisit quizzes with lower scores before moving on".to_string());
    }

    if metrics.completion_rate < 50.0 {
        focus_areas.push("Finishing started courses beats starting new ones".to_string());
    }

    InsightNarrative {
        summary: format!(
            "You have logged {} study hours with a completion rate of {:.0}% and a quiz \
             average of {:.0}.",
            metrics.total_study_hours, metrics.completion_rate, metrics.quiz_average
        ),
        strengths,
        focus_areas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{LoginEvent, ScoreRecord};
    use crate::providers::mock::MockProvider;
    use chrono::Duration;

    fn insights(flags: FeatureFlags) -> ProgressInsights {
        ProgressInsights::new(Arc::new(AiService::new(Arc::new(MockProvider::new()))), flags)
    }

    fn sample_activity() -> LearnerActivity {
        let today = Utc::now().date_naive();
        LearnerActivity {
            scores: vec![
                ScoreRecord {
                    quiz_id: "q1".to_string(),
                    score: 80.0,
                },
                ScoreRecord {
                    quiz_id: "q2".to_string(),
                    score: 90.0,
                },
            ],
            logins: vec![
                LoginEvent { date: today },
                LoginEvent {
                    date: today - Duration::days(1),
                },
            ],
            cohort_mean_score: 85.0,
            cohort_std_dev: 10.0,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_always_present() {
        let env = insights(FeatureFlags::none()).analyze(&sample_activity()).await;
        assert!(env.success);
        assert!(!env.ai_generated);
        assert_eq!(env.metrics.quiz_average, 85.0);
        assert_eq!(env.metrics.study_streak_days, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_narrative_overlays_computed_metrics() {
        let env = insights(FeatureFlags::default()).analyze(&sample_activity()).await;
        assert!(env.ai_generated);
        // Metrics identical to what the engine computes; the AI path never
        // touches them
        assert_eq!(env.metrics.quiz_average, 85.0);
        assert!(!env.insights.summary.is_empty());
        assert!(!env.insights.strengths.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_narrative_is_deterministic() {
        let module = insights(FeatureFlags::none());
        let a = module.analyze(&sample_activity()).await;
        let b = module.analyze(&sample_activity()).await;
        assert_eq!(a.insights.summary, b.insights.summary);
        assert_eq!(a.insights.strengths, b.insights.strengths);
    }

    #[test]
    fn test_fallback_flags_weak_metrics() {
        let metrics = LearningMetrics {
            quiz_average: 40.0,
            total_study_hours: 1,
            study_streak_days: 0,
            peak_study_time: crate::analytics::PeakStudyTime::NotEnoughData,
            completion_rate: 10.0,
            percentile: 20.0,
        };
        let narrative = fallback_narrative(&metrics);
        assert!(narrative.strengths.is_empty());
        assert_eq!(narrative.focus_areas.len(), 3);
    }
}
