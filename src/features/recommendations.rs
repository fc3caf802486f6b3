// Course recommendations
//
// AI path: the model picks from the supplied candidates and explains each
// pick; fallback: candidates ranked by rating with synthetic confidence.
// The fallback never fabricates a narrative reason or a learning path.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{degrade_safe, CourseRecord};
use crate::config::{Capability, FeatureFlags};
use crate::providers::ChatOptions;
use crate::service::AiService;

const SYSTEM_PROMPT: &str = "You are a course advisor for an online learning platform. \
    Pick the best matches for the learner from the candidate list only. \
    Respond with JSON: {\"recommendations\": [{\"courseId\", \"reason\", \"confidence\"}], \
    \"learningPath\": \"...\"}.";

// Fallback confidence is 0.7 - 0.1*rank; at most 5 entries keeps it in
// (0.2, 0.7] without a clamp.
const MAX_FALLBACK_RESULTS: usize = 5;

/// One recommended course.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecommendation {
    pub course_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub confidence: f64,
}

/// Envelope returned by every recommendation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationEnvelope {
    pub success: bool,
    pub ai_generated: bool,
    pub recommendations: Vec<CourseRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecommendationEnvelope {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ai_generated: false,
            recommendations: Vec::new(),
            learning_path: None,
            message: Some(message.into()),
        }
    }
}

/// Recommendation feature module.
pub struct Recommender {
    service: Arc<AiService>,
    flags: FeatureFlags,
}

impl Recommender {
    pub fn new(service: Arc<AiService>, flags: FeatureFlags) -> Self {
        Self { service, flags }
    }

    /// Recommend courses for a learner described by `profile`.
    pub async fn recommend(
        &self,
        profile: &str,
        candidates: &[CourseRecord],
    ) -> RecommendationEnvelope {
        if candidates.is_empty() {
            return RecommendationEnvelope::invalid("No candidate courses supplied");
        }

        let ((recommendations, learning_path), ai_generated) = degrade_safe(
            &self.flags,
            Capability::Recommendations,
            || self.ai_recommend(profile, candidates),
            || (fallback_ranking(candidates), None),
        )
        .await;

        RecommendationEnvelope {
            success: true,
            ai_generated,
            recommendations,
            learning_path,
            message: None,
        }
    }

    async fn ai_recommend(
        &self,
        profile: &str,
        candidates: &[CourseRecord],
    ) -> Result<(Vec<CourseRecommendation>, Option<String>)> {
        let catalog = candidates
            .iter()
            .map(|c| {
                format!(
                    "- id={} | {} | {} | rating {:.1}",
                    c.id, c.title, c.field, c.rating
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let user_message = format!(
            "Recommend courses for this learner.\n\nLearner profile:\n{profile}\n\nCandidate courses:\n{catalog}"
        );

        let raw = self
            .service
            .chat(SYSTEM_PROMPT, &user_message, ChatOptions::default())
            .await?;

        let Some(payload) = self.service.parse_json(&raw) else {
            bail!("Response was not recoverable JSON");
        };
        let Some(entries) = payload.get("recommendations").and_then(|v| v.as_array()) else {
            bail!("Payload missing 'recommendations' key");
        };

        let mut recommendations = Vec::new();
        for entry in entries {
            let Some(course_id) = entry.get("courseId").and_then(|v| v.as_str()) else {
                continue;
            };
            // Drop hallucinated ids that are not in the candidate set
            let Some(course) = candidates.iter().find(|c| c.id == course_id) else {
                continue;
            };
            recommendations.push(CourseRecommendation {
                course_id: course.id.clone(),
                title: course.title.clone(),
                reason: entry
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                confidence: entry
                    .get("confidence")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.5),
            });
        }

        if recommendations.is_empty() {
            bail!("No recommendation matched a known course id");
        }

        let learning_path = payload
            .get("learningPath")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok((recommendations, learning_path))
    }
}

/// Deterministic fallback: rating-descending with decaying confidence.
fn fallback_ranking(candidates: &[CourseRecord]) -> Vec<CourseRecommendation> {
    let mut sorted: Vec<&CourseRecord> = candidates.iter().collect();
    sorted.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    sorted
        .into_iter()
        .take(MAX_FALLBACK_RESULTS)
        .enumerate()
        .map(|(rank, course)| CourseRecommendation {
            course_id: course.id.clone(),
            title: course.title.clone(),
            reason: None,
            confidence: 0.7 - 0.1 * rank as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;

    fn course(id: &str, title: &str, rating: f64) -> CourseRecord {
        CourseRecord {
            id: id.to_string(),
            title: title.to_string(),
            description: format!("{title} description"),
            field: "programming".to_string(),
            rating,
            student_count: 250,
            difficulty: None,
            duration: None,
        }
    }

    fn recommender(flags: FeatureFlags) -> Recommender {
        Recommender::new(Arc::new(AiService::new(Arc::new(MockProvider::new()))), flags)
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_candidates_is_validation_error() {
        let env = recommender(FeatureFlags::default())
            .recommend("likes rust", &[])
            .await;
        assert!(!env.success);
        assert!(env.message.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_flag_uses_fallback() {
        let candidates = [
            course("c1", "Rust Basics", 4.2),
            course("c2", "Advanced Rust", 4.8),
            course("c3", "Web APIs", 3.9),
        ];
        let env = recommender(FeatureFlags::none())
            .recommend("likes rust", &candidates)
            .await;
        assert!(env.success);
        assert!(!env.ai_generated);
        // Rating-descending ordering
        assert_eq!(env.recommendations[0].course_id, "c2");
        assert!(env.learning_path.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_confidence_strictly_decreases() {
        let candidates = [
            course("c1", "A", 4.9),
            course("c2", "B", 4.5),
            course("c3", "C", 4.1),
            course("c4", "D", 3.8),
        ];
        let ranked = fallback_ranking(&candidates);
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].confidence, 0.7);
        for pair in ranked.windows(2) {
            assert!(pair[0].confidence > pair[1].confidence);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_path_matches_known_course_ids() {
        // Mock returns courseIds c1 and c2
        let candidates = [course("c1", "Rust Basics", 4.2), course("c2", "Advanced Rust", 4.8)];
        let env = recommender(FeatureFlags::default())
            .recommend("likes rust", &candidates)
            .await;
        assert!(env.success);
        assert!(env.ai_generated);
        assert_eq!(env.recommendations.len(), 2);
        assert!(env.recommendations[0].reason.is_some());
        assert!(env.learning_path.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_payload_with_unknown_ids_falls_back() {
        // Mock recommends c1/c2; catalog has neither, so the AI result is
        // discarded and the deterministic ranking takes over.
        let candidates = [
            course("x1", "Databases", 4.0),
            course("x2", "Networking", 4.6),
            course("x3", "Security", 4.3),
        ];
        let env = recommender(FeatureFlags::default())
            .recommend("likes infrastructure", &candidates)
            .await;
        assert!(env.success);
        assert!(!env.ai_generated);
        assert_eq!(env.recommendations[0].course_id, "x2");
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let env = RecommendationEnvelope {
            success: true,
            ai_generated: false,
            recommendations: vec![],
            learning_path: None,
            message: None,
        };
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["aiGenerated"], false);
        assert!(json.get("learningPath").is_none());
    }
}
