//! Wire types shared by the gateway client and server.

use serde::{Deserialize, Serialize};

/// Role of a message on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message as the gateway sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A thread id plus its full history, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadHistory {
    pub thread_id: String,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

impl ThreadHistory {
    /// Content of the first user message, used as a title hint when
    /// indexing a thread observed through a history fetch.
    pub fn first_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThreadResponse {
    pub thread_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchThreadRequest {
    pub thread_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub messages: Vec<WireMessage>,
}

/// Send result: exactly one of `reply` and `error` is set. Failures
/// the assistant reports travel in-band so the conversation view can
/// show them inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
    }

    #[test]
    fn history_uses_camel_case_thread_id() {
        let history: ThreadHistory = serde_json::from_str(
            r#"{"threadId": "t1", "messages": [{"role": "user", "content": "hi"}]}"#,
        )
        .unwrap();
        assert_eq!(history.thread_id, "t1");
        assert_eq!(history.first_user_message(), Some("hi"));
    }

    #[test]
    fn history_messages_default_when_absent() {
        let history: ThreadHistory = serde_json::from_str(r#"{"threadId": "t1"}"#).unwrap();
        assert!(history.messages.is_empty());
        assert!(history.first_user_message().is_none());
    }
}
