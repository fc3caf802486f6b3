// Role folding for backends without a system role
//
// Gemini's API accepts only "user" and "model" turns. Conversations built
// elsewhere in the crate carry system turns and "assistant" labels, so they
// must be adapted before hitting the wire. Kept as a standalone function so
// the adaptation is testable without any network machinery.

use super::types::{ChatMessage, Role};

/// A folded turn ready for a backend that only knows `user` and `model`.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedTurn {
    /// "user" or "model"
    pub role: &'static str,
    pub content: String,
}

/// Fold a conversation for a backend with no system role.
///
/// All system turns are merged (in order) into the content of the first user
/// turn, separated by blank lines; assistant turns are relabeled `model`.
/// If the conversation has system turns but no user turn, the merged system
/// text becomes a synthetic leading user turn so the instructions are not
/// dropped.
pub fn fold_messages(messages: &[ChatMessage]) -> Vec<FoldedTurn> {
    let system_text: String = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut folded = Vec::new();
    let mut system_pending = !system_text.is_empty();

    for msg in messages {
        match msg.role {
            Role::System => continue,
            Role::User => {
                let content = if system_pending {
                    system_pending = false;
                    format!("{}\n\n{}", system_text, msg.content)
                } else {
                    msg.content.clone()
                };
                folded.push(FoldedTurn {
                    role: "user",
                    content,
                });
            }
            Role::Assistant => {
                folded.push(FoldedTurn {
                    role: "model",
                    content: msg.content.clone(),
                });
            }
        }
    }

    // System turns but no user turn to carry them
    if system_pending {
        folded.insert(
            0,
            FoldedTurn {
                role: "user",
                content: system_text,
            },
        );
    }

    folded
}
