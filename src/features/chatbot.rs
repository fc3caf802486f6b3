// Conversational tutoring
//
// The window sent upstream is a hard contract: the course-context system
// turn plus at most the 10 most recent conversation turns (counting the new
// message). Exceeding it would silently change the model's perceived
// context, so the window builder is a standalone, tested function.

use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Arc;

use super::degrade_safe;
use crate::config::{Capability, FeatureFlags};
use crate::providers::{ChatMessage, ChatOptions};
use crate::service::AiService;

const WINDOW_TURNS: usize = 10;

/// Envelope returned by every tutoring exchange.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotEnvelope {
    pub success: bool,
    pub ai_generated: bool,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Conversational tutoring feature module.
pub struct Tutor {
    service: Arc<AiService>,
    flags: FeatureFlags,
}

impl Tutor {
    pub fn new(service: Arc<AiService>, flags: FeatureFlags) -> Self {
        Self { service, flags }
    }

    /// Answer a learner message in the context of a course.
    pub async fn respond(
        &self,
        course_title: &str,
        course_context: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> ChatbotEnvelope {
        if message.trim().is_empty() {
            return ChatbotEnvelope {
                success: false,
                ai_generated: false,
                response: String::new(),
                message: Some("Message must not be empty".to_string()),
            };
        }

        let (response, ai_generated) = degrade_safe(
            &self.flags,
            Capability::Chatbot,
            || self.ai_respond(course_title, course_context, history, message),
            || fallback_reply(course_title),
        )
        .await;

        ChatbotEnvelope {
            success: true,
            ai_generated,
            response,
            message: None,
        }
    }

    async fn ai_respond(
        &self,
        course_title: &str,
        course_context: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String> {
        let window = build_window(course_title, course_context, history, message);
        let text = self
            .service
            .conversation(window, ChatOptions::default())
            .await?;

        if text.trim().is_empty() {
            bail!("Model returned an empty reply");
        }
        Ok(text)
    }
}

/// Build the capped conversation window: one system turn plus at most the
/// `WINDOW_TURNS` most recent turns, the new message included.
pub(crate) fn build_window(
    course_title: &str,
    course_context: &str,
    history: &[ChatMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let system = ChatMessage::system(format!(
        "You are a patient tutor for the course \"{course_title}\". \
         Course context: {course_context}. Answer with short, concrete explanations \
         and encourage the learner to keep going."
    ));

    let mut turns: Vec<ChatMessage> = history.to_vec();
    turns.push(ChatMessage::user(message));

    let start = turns.len().saturating_sub(WINDOW_TURNS);
    let mut window = Vec::with_capacity(WINDOW_TURNS + 1);
    window.push(system);
    window.extend(turns.drain(..).skip(start));
    window
}

/// Deterministic fallback reply; no model involved.
fn fallback_reply(course_title: &str) -> String {
    format!(
        "I can't reach the tutoring assistant right now. In the meantime, revisiting the most \
         recent lecture of \"{course_title}\" and retrying its practice exercises is usually the \
         fastest way to get unstuck. Your question will get a full answer once the assistant is \
         back."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use crate::providers::Role;

    fn tutor(flags: FeatureFlags) -> Tutor {
        Tutor::new(Arc::new(AiService::new(Arc::new(MockProvider::new()))), flags)
    }

    fn long_history(len: usize) -> Vec<ChatMessage> {
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("question {i}"))
                } else {
                    ChatMessage::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn test_window_caps_at_ten_turns_plus_system() {
        let history = long_history(30);
        let window = build_window("Rust 101", "ownership and borrowing", &history, "why borrow?");
        assert_eq!(window.len(), WINDOW_TURNS + 1);
        assert_eq!(window[0].role, Role::System);
        // Newest turn is always last
        assert_eq!(window.last().unwrap().content, "why borrow?");
    }

    #[test]
    fn test_window_keeps_most_recent_history() {
        let history = long_history(30);
        let window = build_window("Rust 101", "ctx", &history, "new question");
        // 9 history turns + the new message fill the window, so the oldest
        // retained history turn is index 21 of 30
        assert_eq!(window[1].content, history[21].content);
    }

    #[test]
    fn test_short_history_not_padded() {
        let history = long_history(3);
        let window = build_window("Rust 101", "ctx", &history, "q");
        assert_eq!(window.len(), 5); // system + 3 history + new message
    }

    #[test]
    fn test_window_preserves_order() {
        let history = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("second"),
        ];
        let window = build_window("Rust 101", "ctx", &history, "third");
        assert_eq!(window[1].content, "first");
        assert_eq!(window[2].content, "second");
        assert_eq!(window[3].content, "third");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_message_is_validation_error() {
        let env = tutor(FeatureFlags::default())
            .respond("Rust 101", "ctx", &[], "  ")
            .await;
        assert!(!env.success);
        assert!(env.message.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_reply_passes_through() {
        let env = tutor(FeatureFlags::default())
            .respond("Rust 101", "ctx", &[], "what should I do next?")
            .await;
        assert!(env.success);
        assert!(env.ai_generated);
        assert!(!env.response.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_flag_gets_deterministic_reply() {
        let t = tutor(FeatureFlags::none());
        let a = t.respond("Rust 101", "ctx", &[], "help").await;
        let b = t.respond("Rust 101", "ctx", &[], "help").await;
        assert!(!a.ai_generated);
        assert_eq!(a.response, b.response);
        assert!(a.response.contains("Rust 101"));
    }
}
