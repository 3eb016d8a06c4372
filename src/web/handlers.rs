//! Request handlers for the gateway API.
//!
//! The gateway owns one piece of state of its own: the "current
//! thread" pointer. Everything else is forwarded to the upstream
//! assistant API.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::gateway::{
    AckResponse, NewThreadResponse, Role, SendRequest, SendResponse, SwitchThreadRequest,
    ThreadHistory,
};

use super::assistant::{AssistantClient, AssistantError};
use super::error::WebError;

/// Shared state for the gateway server
pub struct GatewayState {
    pub assistant: AssistantClient,
    /// The thread the gateway considers current
    pub current_thread: RwLock<Option<String>>,
}

impl GatewayState {
    pub fn new(assistant: AssistantClient) -> Self {
        Self {
            assistant,
            current_thread: RwLock::new(None),
        }
    }
}

impl From<AssistantError> for WebError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::UnknownThread(id) => WebError::NotFound(format!("thread {}", id)),
            AssistantError::Transport(msg) => WebError::Upstream(msg),
            AssistantError::Api(msg) => WebError::Upstream(msg),
            AssistantError::Timeout => WebError::Upstream("run timed out".to_string()),
            AssistantError::RunFailed(msg) => WebError::Upstream(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub thread_id: Option<String>,
}

/// GET /api/history — fetch a thread's history. Without an id the
/// current thread is resolved, creating one when none exists. The
/// returned thread becomes current either way.
pub async fn history(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ThreadHistory>, WebError> {
    if let Some(id) = params.thread_id {
        // Validate before moving the pointer
        let messages = state.assistant.fetch_messages(&id).await?;
        *state.current_thread.write().await = Some(id.clone());
        return Ok(Json(ThreadHistory {
            thread_id: id,
            messages,
        }));
    }

    // No id given: resolve the current thread, creating one when the
    // pointer is empty or points at a thread the upstream dropped
    let current = state.current_thread.read().await.clone();
    if let Some(id) = current {
        match state.assistant.fetch_messages(&id).await {
            Ok(messages) => {
                return Ok(Json(ThreadHistory {
                    thread_id: id,
                    messages,
                }));
            }
            Err(AssistantError::UnknownThread(_)) => {
                tracing::warn!(thread_id = %id, "Current thread vanished upstream, creating a fresh one");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let thread_id = state.assistant.create_thread().await?;
    tracing::info!(thread_id = %thread_id, "Created thread for empty current pointer");
    *state.current_thread.write().await = Some(thread_id.clone());
    Ok(Json(ThreadHistory {
        thread_id,
        messages: Vec::new(),
    }))
}

/// POST /api/threads — create a fresh thread and make it current
pub async fn new_thread(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<NewThreadResponse>, WebError> {
    let thread_id = state.assistant.create_thread().await?;
    *state.current_thread.write().await = Some(thread_id.clone());
    tracing::info!(thread_id = %thread_id, "Created thread");
    Ok(Json(NewThreadResponse { thread_id }))
}

/// POST /api/threads/current — switch the current-thread pointer.
/// Unknown ids are rejected with 404 and the pointer stays put.
pub async fn switch_thread(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<SwitchThreadRequest>,
) -> Result<Json<AckResponse>, WebError> {
    if request.thread_id.trim().is_empty() {
        return Err(WebError::BadRequest("thread_id must not be empty".into()));
    }

    // Existence check against the upstream; the gateway keeps no
    // thread list of its own
    state.assistant.fetch_messages(&request.thread_id).await?;

    *state.current_thread.write().await = Some(request.thread_id);
    Ok(Json(AckResponse { ok: true }))
}

/// POST /api/threads/{id}/messages — forward user messages, run the
/// assistant, and reply with the newest assistant message. Assistant
/// failures travel in-band as `{ "error": ... }` so the client can
/// render them inline.
pub async fn send(
    State(state): State<Arc<GatewayState>>,
    Path(thread_id): Path<String>,
    Json(request): Json<SendRequest>,
) -> Result<Json<SendResponse>, WebError> {
    let user_messages: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    if user_messages.is_empty() {
        return Err(WebError::BadRequest("no user message to send".into()));
    }

    for content in &user_messages {
        state.assistant.post_user_message(&thread_id, content).await?;
    }

    match state.assistant.run_to_completion(&thread_id).await {
        Ok(()) => {}
        Err(AssistantError::RunFailed(msg)) | Err(AssistantError::Api(msg)) => {
            return Ok(Json(SendResponse {
                reply: None,
                error: Some(msg),
            }));
        }
        Err(AssistantError::Timeout) => {
            return Ok(Json(SendResponse {
                reply: None,
                error: Some("The assistant took too long to reply".to_string()),
            }));
        }
        Err(e) => return Err(e.into()),
    }

    let messages = state.assistant.fetch_messages(&thread_id).await?;
    let reply = messages
        .into_iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.content);

    match reply {
        Some(reply) => Ok(Json(SendResponse {
            reply: Some(reply),
            error: None,
        })),
        None => Ok(Json(SendResponse {
            reply: None,
            error: Some("The assistant returned no reply".to_string()),
        })),
    }
}

/// DELETE /api/threads/{id} — remove a thread upstream. Clears the
/// current pointer when it pointed at the deleted thread.
pub async fn delete_thread(
    State(state): State<Arc<GatewayState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<AckResponse>, WebError> {
    state.assistant.delete_thread(&thread_id).await?;

    let mut current = state.current_thread.write().await;
    if current.as_deref() == Some(thread_id.as_str()) {
        *current = None;
    }
    Ok(Json(AckResponse { ok: true }))
}
