// Quiz generation
//
// Both paths enforce exactly four options labeled A-D per question. AI
// questions that fail that shape are dropped; if none survive, the whole
// payload counts as unrecoverable and the templated fallback runs with a
// uniformly random correct label.

use anyhow::{bail, Result};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::degrade_safe;
use crate::config::{Capability, FeatureFlags};
use crate::providers::ChatOptions;
use crate::service::AiService;

const SYSTEM_PROMPT: &str = "You write multiple-choice quiz questions for an online course. \
    Every question has exactly four options labeled A-D and one correct label. \
    Respond with JSON only: {\"questions\": [{\"question\", \"options\": \
    {\"A\", \"B\", \"C\", \"D\"}, \"correct\", \"explanation\"}]}.";

const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// One quiz option with its label.
#[derive(Debug, Clone, Serialize)]
pub struct QuizOption {
    pub label: String,
    pub text: String,
}

/// A validated multiple-choice question: always exactly four options, A-D.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<QuizOption>,
    pub correct: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Envelope returned by every quiz call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizEnvelope {
    pub success: bool,
    pub ai_generated: bool,
    /// Mirrors `ai_generated` inside the payload; the quiz renderer keys
    /// off this field.
    pub generated: bool,
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Quiz generation feature module.
pub struct QuizGenerator {
    service: Arc<AiService>,
    flags: FeatureFlags,
}

impl QuizGenerator {
    pub fn new(service: Arc<AiService>, flags: FeatureFlags) -> Self {
        Self { service, flags }
    }

    /// Generate `count` questions about `topic`.
    pub async fn generate(&self, topic: &str, count: usize) -> QuizEnvelope {
        if topic.trim().is_empty() || count == 0 {
            return QuizEnvelope {
                success: false,
                ai_generated: false,
                generated: false,
                topic: topic.to_string(),
                questions: Vec::new(),
                message: Some("A topic and a question count are required".to_string()),
            };
        }

        let (questions, ai_generated) = degrade_safe(
            &self.flags,
            Capability::Quiz,
            || self.ai_generate(topic, count),
            || fallback_questions(topic, count),
        )
        .await;

        QuizEnvelope {
            success: true,
            ai_generated,
            generated: ai_generated,
            topic: topic.to_string(),
            questions,
            message: None,
        }
    }

    async fn ai_generate(&self, topic: &str, count: usize) -> Result<Vec<QuizQuestion>> {
        let user_message = format!("Generate {count} quiz questions about: {topic}");

        let raw = self
            .service
            .chat(SYSTEM_PROMPT, &user_message, ChatOptions::default())
            .await?;

        let Some(payload) = self.service.parse_json(&raw) else {
            bail!("Response was not recoverable JSON");
        };
        let Some(entries) = payload.get("questions").and_then(|v| v.as_array()) else {
            bail!("Payload missing 'questions' key");
        };

        let questions: Vec<QuizQuestion> = entries
            .iter()
            .filter_map(normalize_question)
            .take(count)
            .collect();

        if questions.is_empty() {
            bail!("No question in the payload had four A-D options");
        }

        Ok(questions)
    }
}

/// Validate and normalize one raw question entry. Returns `None` when the
/// entry cannot be coerced to four A-D options with a valid correct label.
fn normalize_question(entry: &Value) -> Option<QuizQuestion> {
    let question = entry.get("question")?.as_str()?.to_string();

    let options: Vec<QuizOption> = if let Some(map) = entry.get("options")?.as_object() {
        OPTION_LABELS
            .iter()
            .filter_map(|label| {
                map.get(*label)
                    .or_else(|| map.get(&label.to_lowercase()))
                    .and_then(|v| v.as_str())
                    .map(|text| QuizOption {
                        label: label.to_string(),
                        text: text.to_string(),
                    })
            })
            .collect()
    } else if let Some(list) = entry.get("options")?.as_array() {
        // Exactly four string entries; anything else is a shape failure, not
        // a truncation. A filtered zip would shift texts onto wrong labels.
        if list.len() != 4 {
            return None;
        }
        let texts: Vec<&str> = list.iter().filter_map(|v| v.as_str()).collect();
        if texts.len() != 4 {
            return None;
        }
        texts
            .into_iter()
            .zip(OPTION_LABELS.iter())
            .map(|(text, label)| QuizOption {
                label: label.to_string(),
                text: text.to_string(),
            })
            .collect()
    } else {
        return None;
    };

    if options.len() != 4 {
        return None;
    }

    let correct = entry.get("correct")?.as_str()?.trim().to_uppercase();
    if !OPTION_LABELS.contains(&correct.as_str()) {
        return None;
    }

    Some(QuizQuestion {
        question,
        options,
        correct,
        explanation: entry
            .get("explanation")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

/// Templated fallback questions with a random correct label.
fn fallback_questions(topic: &str, count: usize) -> Vec<QuizQuestion> {
    let mut rng = rand::thread_rng();

    (0..count)
        .map(|i| {
            let correct_idx = rng.gen_range(0..4);
            let options = OPTION_LABELS
                .iter()
                .enumerate()
                .map(|(idx, label)| QuizOption {
                    label: label.to_string(),
                    text: if idx == correct_idx {
                        format!("A statement that correctly describes {topic}")
                    } else {
                        format!("A plausible but incorrect statement about {topic} ({})", idx + 1)
                    },
                })
                .collect();

            QuizQuestion {
                question: format!("Question {}: which statement about {topic} is correct?", i + 1),
                options,
                correct: OPTION_LABELS[correct_idx].to_string(),
                explanation: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use serde_json::json;

    fn generator(flags: FeatureFlags) -> QuizGenerator {
        QuizGenerator::new(Arc::new(AiService::new(Arc::new(MockProvider::new()))), flags)
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_topic_is_validation_error() {
        let env = generator(FeatureFlags::default()).generate("", 3).await;
        assert!(!env.success);
        assert!(env.message.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_count_is_validation_error() {
        let env = generator(FeatureFlags::default()).generate("rust", 0).await;
        assert!(!env.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_has_four_labeled_options() {
        let env = generator(FeatureFlags::none()).generate("ownership", 3).await;
        assert!(env.success);
        assert!(!env.ai_generated);
        assert!(!env.generated);
        assert_eq!(env.questions.len(), 3);
        for q in &env.questions {
            assert_eq!(q.options.len(), 4);
            let labels: Vec<&str> = q.options.iter().map(|o| o.label.as_str()).collect();
            assert_eq!(labels, ["A", "B", "C", "D"]);
            assert!(OPTION_LABELS.contains(&q.correct.as_str()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_path_parses_fenced_payload() {
        // Mock wraps its quiz payload in a ```json fence
        let env = generator(FeatureFlags::default()).generate("rust quiz", 1).await;
        assert!(env.success);
        assert!(env.ai_generated);
        assert_eq!(env.questions.len(), 1);
        assert_eq!(env.questions[0].correct, "A");
        assert_eq!(env.questions[0].options.len(), 4);
    }

    #[test]
    fn test_normalize_accepts_array_options() {
        let entry = json!({
            "question": "pick one",
            "options": ["first", "second", "third", "fourth"],
            "correct": "c"
        });
        let q = normalize_question(&entry).unwrap();
        assert_eq!(q.options[2].label, "C");
        assert_eq!(q.correct, "C");
    }

    #[test]
    fn test_normalize_rejects_three_options() {
        let entry = json!({
            "question": "pick one",
            "options": ["a", "b", "c"],
            "correct": "A"
        });
        assert!(normalize_question(&entry).is_none());
    }

    #[test]
    fn test_normalize_rejects_five_options() {
        // Oversized arrays are dropped, never truncated to four
        let entry = json!({
            "question": "pick one",
            "options": ["a", "b", "c", "d", "e"],
            "correct": "B"
        });
        assert!(normalize_question(&entry).is_none());
    }

    #[test]
    fn test_normalize_rejects_non_string_array_entries() {
        // A non-string entry must fail the whole question; skipping it
        // would move the remaining texts onto the wrong labels
        let entry = json!({
            "question": "pick one",
            "options": ["first", 2, "third", "fourth"],
            "correct": "B"
        });
        assert!(normalize_question(&entry).is_none());
    }

    #[test]
    fn test_normalize_rejects_bad_correct_label() {
        let entry = json!({
            "question": "pick one",
            "options": {"A": "1", "B": "2", "C": "3", "D": "4"},
            "correct": "E"
        });
        assert!(normalize_question(&entry).is_none());
    }

    #[test]
    fn test_normalize_lowercase_option_keys() {
        let entry = json!({
            "question": "pick one",
            "options": {"a": "1", "b": "2", "c": "3", "d": "4"},
            "correct": "b"
        });
        let q = normalize_question(&entry).unwrap();
        assert_eq!(q.options.len(), 4);
        assert_eq!(q.correct, "B");
    }
}
