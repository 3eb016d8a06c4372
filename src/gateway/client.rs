//! Collaborator gateway client.
//!
//! The gateway is a black box reached over HTTP: it owns every thread
//! and the "current thread" pointer, and it answers the five calls in
//! the `Gateway` trait. The client never caches history; the local
//! organizer only indexes thread ids.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::types::{
    AckResponse, NewThreadResponse, SendRequest, SendResponse, SwitchThreadRequest, ThreadHistory,
    WireMessage,
};

/// Error talking to the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached or the response was unreadable
    #[error("gateway unreachable: {0}")]
    Transport(String),
    /// The gateway does not know the given thread id
    #[error("unknown thread: {0}")]
    UnknownThread(String),
    /// The gateway answered, but with a failure
    #[error("gateway error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// The collaborator gateway contract consumed by the session bridge
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch history for a thread. Omitting the id asks the gateway
    /// for whatever it currently considers current, creating a thread
    /// if none exists. Also establishes the returned thread as
    /// current.
    async fn history(&self, thread_id: Option<&str>) -> Result<ThreadHistory, GatewayError>;

    /// Create a fresh thread and return its id
    async fn new_thread(&self) -> Result<String, GatewayError>;

    /// Point the gateway's current-thread pointer at an existing
    /// thread. Unknown ids are rejected.
    async fn switch_thread(&self, thread_id: &str) -> Result<(), GatewayError>;

    /// Send messages to a thread and return the assistant's reply
    async fn send(&self, thread_id: &str, messages: &[WireMessage])
        -> Result<String, GatewayError>;

    /// Delete a remote thread. Optional cleanup parity for a local
    /// delete; callers treat failures as non-fatal.
    async fn delete_thread(&self, thread_id: &str) -> Result<(), GatewayError>;
}

/// HTTP implementation of [`Gateway`]
#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response into a gateway error, reading the
    /// body for context. 404 means the thread id is unknown.
    async fn error_for(response: reqwest::Response, thread_id: &str) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            GatewayError::UnknownThread(thread_id.to_string())
        } else {
            GatewayError::Api(format!("{} - {}", status, body))
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn history(&self, thread_id: Option<&str>) -> Result<ThreadHistory, GatewayError> {
        let mut request = self.client.get(self.url("/api/history"));
        if let Some(id) = thread_id {
            request = request.query(&[("thread_id", id)]);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, thread_id.unwrap_or("<current>")).await);
        }
        Ok(response.json::<ThreadHistory>().await?)
    }

    async fn new_thread(&self) -> Result<String, GatewayError> {
        let response = self.client.post(self.url("/api/threads")).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, "<new>").await);
        }
        Ok(response.json::<NewThreadResponse>().await?.thread_id)
    }

    async fn switch_thread(&self, thread_id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url("/api/threads/current"))
            .json(&SwitchThreadRequest {
                thread_id: thread_id.to_string(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, thread_id).await);
        }
        let ack = response.json::<AckResponse>().await?;
        if !ack.ok {
            return Err(GatewayError::Api("switch rejected".to_string()));
        }
        Ok(())
    }

    async fn send(
        &self,
        thread_id: &str,
        messages: &[WireMessage],
    ) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.url(&format!("/api/threads/{}/messages", thread_id)))
            .json(&SendRequest {
                messages: messages.to_vec(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, thread_id).await);
        }

        let body = response.json::<SendResponse>().await?;
        match (body.reply, body.error) {
            (Some(reply), _) => Ok(reply),
            (None, Some(error)) => Err(GatewayError::Api(error)),
            (None, None) => Err(GatewayError::Api("empty send response".to_string())),
        }
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/threads/{}", thread_id)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, thread_id).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = HttpGateway::new("http://localhost:8787/");
        assert_eq!(gateway.url("/api/history"), "http://localhost:8787/api/history");
    }
}
