//! Chat prompt assembly for the completion call.
//!
//! The retrieved context is appended to the system instruction; the
//! visitor's question goes in a separate user message, unmodified.

use serde::{Deserialize, Serialize};

/// Default system instruction for the portfolio assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant speaking to a recruiter or hiring manager. \
Answer all questions in a professional and concise way, highlighting relevant skills and experience. \
Use context from the user's profile and projects to give informed answers:";

/// Fallback answer when the completion collaborator returns no content.
pub const NO_ANSWER: &str = "No answer returned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Build the `[system, user]` message pair for a completion request.
///
/// An empty `context` still produces the instruction; the model simply
/// has nothing extra to draw on.
pub fn build_messages(system_prompt: &str, context: &str, user_prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: Role::System,
            content: format!("{}\n{}", system_prompt, context),
        },
        ChatMessage {
            role: Role::User,
            content: user_prompt.to_string(),
        },
    ]
}
