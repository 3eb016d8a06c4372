//! Chat message types for the conversation pane.

use crate::gateway::{Role, WireMessage};

/// Role of a rendered message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    User,
    Assistant,
    /// Locally rendered failure notice, shown in place of a reply
    Error,
}

/// A single message in the conversation view.
///
/// Transient display state only: the authoritative history lives
/// behind the gateway and is re-fetched when a thread is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Error,
            content: content.into(),
        }
    }
}

impl From<WireMessage> for ChatMessage {
    fn from(message: WireMessage) -> Self {
        match message.role {
            Role::User => ChatMessage::user(message.content),
            Role::Assistant => ChatMessage::assistant(message.content),
        }
    }
}
