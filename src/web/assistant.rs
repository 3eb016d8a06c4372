//! Upstream assistant API client.
//!
//! The gateway is deliberately thin: it creates threads, appends
//! messages, starts a run and polls it to a terminal status, then
//! reads the newest assistant message back as the reply. Only the
//! fields the gateway touches are modeled.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ServeConfig;
use crate::gateway::{Role, WireMessage};

/// Error talking to the upstream assistant API
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant API unreachable: {0}")]
    Transport(String),
    #[error("unknown thread: {0}")]
    UnknownThread(String),
    #[error("assistant API error: {0}")]
    Api(String),
    #[error("run did not complete in time")]
    Timeout,
    #[error("run failed: {0}")]
    RunFailed(String),
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<MessageObject>,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: String,
    #[serde(default)]
    last_error: Option<String>,
}

/// Client for the upstream assistant API
#[derive(Clone)]
pub struct AssistantClient {
    base_url: String,
    assistant_id: String,
    api_key: Option<String>,
    poll_interval: Duration,
    poll_max_attempts: u32,
    client: Client,
}

impl AssistantClient {
    pub fn new(config: &ServeConfig) -> Self {
        Self {
            base_url: config.assistant_url.trim_end_matches('/').to_string(),
            assistant_id: config.assistant_id.clone(),
            api_key: config.assistant_key.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_max_attempts: config.poll_max_attempts,
            client: Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn check(
        response: reqwest::Response,
        thread_id: Option<&str>,
    ) -> Result<reqwest::Response, AssistantError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = thread_id {
                return Err(AssistantError::UnknownThread(id.to_string()));
            }
        }
        Err(AssistantError::Api(format!("{} - {}", status, body)))
    }

    /// Create a fresh thread upstream
    pub async fn create_thread(&self) -> Result<String, AssistantError> {
        let response = self
            .request(reqwest::Method::POST, "/threads")
            .send()
            .await?;
        let response = Self::check(response, None).await?;
        Ok(response.json::<ThreadObject>().await?.id)
    }

    /// Fetch a thread's messages, oldest first. Roles other than
    /// user/assistant are dropped; the gateway contract has no others.
    pub async fn fetch_messages(&self, thread_id: &str) -> Result<Vec<WireMessage>, AssistantError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/threads/{}/messages", thread_id),
            )
            .send()
            .await?;
        let response = Self::check(response, Some(thread_id)).await?;
        let list = response.json::<MessageList>().await?;

        Ok(list
            .data
            .into_iter()
            .filter_map(|m| match m.role.as_str() {
                "user" => Some(WireMessage {
                    role: Role::User,
                    content: m.content,
                }),
                "assistant" => Some(WireMessage {
                    role: Role::Assistant,
                    content: m.content,
                }),
                _ => None,
            })
            .collect())
    }

    /// Append a user message to a thread
    pub async fn post_user_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<(), AssistantError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/threads/{}/messages", thread_id),
            )
            .json(&CreateMessageRequest {
                role: "user",
                content,
            })
            .send()
            .await?;
        Self::check(response, Some(thread_id)).await?;
        Ok(())
    }

    /// Start a run and poll it until it reaches a terminal status
    pub async fn run_to_completion(&self, thread_id: &str) -> Result<(), AssistantError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/threads/{}/runs", thread_id))
            .json(&CreateRunRequest {
                assistant_id: &self.assistant_id,
            })
            .send()
            .await?;
        let response = Self::check(response, Some(thread_id)).await?;
        let run = response.json::<RunObject>().await?;
        let run_id = run.id;

        let mut status = run.status;
        let mut last_error = None;
        for _ in 0..self.poll_max_attempts {
            match status.as_str() {
                "completed" => return Ok(()),
                "failed" | "cancelled" | "expired" => {
                    return Err(AssistantError::RunFailed(
                        last_error.unwrap_or_else(|| status.clone()),
                    ));
                }
                _ => {}
            }

            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .request(
                    reqwest::Method::GET,
                    &format!("/threads/{}/runs/{}", thread_id, run_id),
                )
                .send()
                .await?;
            let response = Self::check(response, Some(thread_id)).await?;
            let run = response.json::<RunObject>().await?;
            status = run.status;
            last_error = run.last_error;
        }

        Err(AssistantError::Timeout)
    }

    /// Delete a thread upstream
    pub async fn delete_thread(&self, thread_id: &str) -> Result<(), AssistantError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/threads/{}", thread_id))
            .send()
            .await?;
        Self::check(response, Some(thread_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_list_filters_foreign_roles() {
        let list: MessageList = serde_json::from_str(
            r#"{"data": [
                {"role": "user", "content": "hi"},
                {"role": "system", "content": "setup"},
                {"role": "assistant", "content": "hello"}
            ]}"#,
        )
        .unwrap();
        let messages: Vec<WireMessage> = list
            .data
            .into_iter()
            .filter_map(|m| match m.role.as_str() {
                "user" => Some(WireMessage::user(m.content)),
                "assistant" => Some(WireMessage::assistant(m.content)),
                _ => None,
            })
            .collect();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn run_object_tolerates_missing_error() {
        let run: RunObject =
            serde_json::from_str(r#"{"id": "run_1", "status": "queued"}"#).unwrap();
        assert_eq!(run.status, "queued");
        assert!(run.last_error.is_none());
    }
}
