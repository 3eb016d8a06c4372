//! Mock gateway for deterministic testing.
//!
//! Implements the [`Gateway`] trait against an in-memory thread map,
//! with scripted replies, failure injection and an optional per-send
//! delay for exercising in-flight behavior. No network involved.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::client::{Gateway, GatewayError};
use super::types::{ThreadHistory, WireMessage};

/// A scripted outcome for one send call
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Succeed with this assistant reply
    Reply(String),
    /// Fail in-band, as the gateway does when the assistant errors
    Error(String),
    /// Fail at the transport layer
    Unreachable,
}

#[derive(Default)]
struct MockState {
    threads: HashMap<String, Vec<WireMessage>>,
    current: Option<String>,
    next_id: u32,
    replies: VecDeque<MockReply>,
    fail_new_thread: bool,
    fail_history: bool,
    calls: Vec<String>,
}

/// In-memory [`Gateway`] for tests
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
    send_delay: Option<Duration>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every send, simulating a slow assistant
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    /// Queue an outcome for the next unscripted send. Without a
    /// script, sends echo the last user message.
    pub fn push_reply(&self, reply: MockReply) {
        self.state.lock().replies.push_back(reply);
    }

    /// Make the next new_thread call fail at the transport layer
    pub fn fail_next_new_thread(&self) {
        self.state.lock().fail_new_thread = true;
    }

    /// Make the next history call fail at the transport layer
    pub fn fail_next_history(&self) {
        self.state.lock().fail_history = true;
    }

    /// Pre-seed a thread with history
    pub fn seed_thread(&self, thread_id: &str, messages: Vec<WireMessage>) {
        self.state
            .lock()
            .threads
            .insert(thread_id.to_string(), messages);
    }

    /// The gateway-side current thread pointer
    pub fn current_thread(&self) -> Option<String> {
        self.state.lock().current.clone()
    }

    /// Recorded call log, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Messages the gateway holds for a thread
    pub fn thread_messages(&self, thread_id: &str) -> Vec<WireMessage> {
        self.state
            .lock()
            .threads
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn allocate_thread(state: &mut MockState) -> String {
        state.next_id += 1;
        let id = format!("thread-{}", state.next_id);
        state.threads.insert(id.clone(), Vec::new());
        id
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn history(&self, thread_id: Option<&str>) -> Result<ThreadHistory, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(format!("history({:?})", thread_id));

        if state.fail_history {
            state.fail_history = false;
            return Err(GatewayError::Transport("connection refused".into()));
        }

        let id = match thread_id {
            Some(id) => {
                if !state.threads.contains_key(id) {
                    return Err(GatewayError::UnknownThread(id.to_string()));
                }
                id.to_string()
            }
            None => match state.current.clone() {
                Some(current) => current,
                None => Self::allocate_thread(&mut state),
            },
        };

        state.current = Some(id.clone());
        Ok(ThreadHistory {
            messages: state.threads[&id].clone(),
            thread_id: id,
        })
    }

    async fn new_thread(&self) -> Result<String, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push("new_thread".to_string());

        if state.fail_new_thread {
            state.fail_new_thread = false;
            return Err(GatewayError::Transport("connection refused".into()));
        }

        let id = Self::allocate_thread(&mut state);
        state.current = Some(id.clone());
        Ok(id)
    }

    async fn switch_thread(&self, thread_id: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(format!("switch_thread({})", thread_id));

        if !state.threads.contains_key(thread_id) {
            return Err(GatewayError::UnknownThread(thread_id.to_string()));
        }
        state.current = Some(thread_id.to_string());
        Ok(())
    }

    async fn send(
        &self,
        thread_id: &str,
        messages: &[WireMessage],
    ) -> Result<String, GatewayError> {
        // Scripted outcome is claimed up front; the delay runs without
        // the lock held so concurrent sends stay concurrent.
        let scripted = {
            let mut state = self.state.lock();
            state.calls.push(format!("send({})", thread_id));
            if !state.threads.contains_key(thread_id) {
                return Err(GatewayError::UnknownThread(thread_id.to_string()));
            }
            state.replies.pop_front()
        };

        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }

        let reply = match scripted {
            Some(MockReply::Reply(reply)) => reply,
            Some(MockReply::Error(error)) => return Err(GatewayError::Api(error)),
            Some(MockReply::Unreachable) => {
                return Err(GatewayError::Transport("connection refused".into()))
            }
            None => {
                let last_user = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == super::types::Role::User)
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                format!("echo: {}", last_user)
            }
        };

        let mut state = self.state.lock();
        let thread = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| GatewayError::UnknownThread(thread_id.to_string()))?;
        thread.extend(messages.to_vec());
        thread.push(WireMessage::assistant(reply.clone()));
        Ok(reply)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(format!("delete_thread({})", thread_id));

        if state.threads.remove(thread_id).is_none() {
            return Err(GatewayError::UnknownThread(thread_id.to_string()));
        }
        if state.current.as_deref() == Some(thread_id) {
            state.current = None;
        }
        Ok(())
    }
}
