//! Session bridge: reconciles the local organizer with the remote
//! current-thread concept behind the gateway.
//!
//! Ordering rules: gateway calls always come first, organizer
//! mutations only happen on success, so a failed call leaves the
//! local tree untouched. Sends on one thread are serialized through a
//! per-thread async lock; sends on different threads are independent.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::data::Organizer;
use crate::gateway::{Gateway, GatewayError, WireMessage};

/// Shared handle to the organizer. Lock scope stays short and is
/// never held across an await.
pub type SharedOrganizer = Arc<parking_lot::Mutex<Organizer>>;

/// Error from a bridge operation
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Gateway unreachable; nothing was changed locally
    #[error("gateway unreachable: {0}")]
    Transport(String),
    /// The gateway does not know the thread id
    #[error("unknown thread: {0}")]
    UnknownThread(String),
    /// The assistant (or the gateway on its behalf) reported a failure
    #[error("assistant error: {0}")]
    Assistant(String),
}

impl From<GatewayError> for BridgeError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(msg) => BridgeError::Transport(msg),
            GatewayError::UnknownThread(id) => BridgeError::UnknownThread(id),
            GatewayError::Api(msg) => BridgeError::Assistant(msg),
        }
    }
}

impl BridgeError {
    /// Text for the inline notice rendered in place of a reply
    pub fn notice(&self) -> String {
        match self {
            BridgeError::Transport(_) => {
                "Could not reach the assistant. Your message was not delivered; try sending again."
                    .to_string()
            }
            BridgeError::UnknownThread(id) => format!("This conversation no longer exists ({})", id),
            BridgeError::Assistant(msg) => format!("The assistant reported an error: {}", msg),
        }
    }
}

/// A resolved thread plus its history, oldest first
#[derive(Debug, Clone)]
pub struct OpenedThread {
    pub thread_id: String,
    pub messages: Vec<WireMessage>,
}

/// Bridge between the organizer and the gateway
pub struct SessionBridge {
    gateway: Arc<dyn Gateway>,
    organizer: SharedOrganizer,
    /// Per-thread send locks; sends on one thread queue behind each
    /// other so remote message order matches issuance order
    send_locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionBridge {
    pub fn new(gateway: Arc<dyn Gateway>, organizer: SharedOrganizer) -> Self {
        Self {
            gateway,
            organizer,
            send_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn organizer(&self) -> SharedOrganizer {
        Arc::clone(&self.organizer)
    }

    fn send_lock(&self, thread_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.send_locks.lock();
        Arc::clone(
            locks
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Open a thread: fetch its history (establishing it as the
    /// remote current thread), lazily index it locally, and make it
    /// the active chat. With no id, the gateway resolves or creates
    /// its current thread.
    pub async fn open_thread(&self, thread_id: Option<&str>) -> Result<OpenedThread, BridgeError> {
        let history = self.gateway.history(thread_id).await?;

        {
            let mut organizer = self.organizer.lock();
            let hint = history.first_user_message().unwrap_or("").to_string();
            // Unknown container ids cannot occur with None, so this
            // cannot fail; seen threads keep their filing.
            let _ = organizer.register_or_update_chat(&history.thread_id, &hint, None);
            organizer.set_active(Some(&history.thread_id));
        }

        Ok(OpenedThread {
            thread_id: history.thread_id,
            messages: history.messages,
        })
    }

    /// Create a thread remotely, then register it under the currently
    /// active container (or uncategorized) and make it active. The
    /// gateway call comes first: when it fails nothing changes
    /// locally, so the previous thread stays visible.
    pub async fn new_thread(&self) -> Result<String, BridgeError> {
        let thread_id = self.gateway.new_thread().await?;

        {
            let mut organizer = self.organizer.lock();
            let container = organizer.active_container();
            let _ = organizer.register_or_update_chat(&thread_id, "", container);
            organizer.set_active(Some(&thread_id));
        }

        tracing::debug!(thread_id = %thread_id, "Created new thread");
        Ok(thread_id)
    }

    /// Make an existing thread current on the gateway, then hydrate
    /// it. A rejected id surfaces the error with the active pointer
    /// unchanged.
    pub async fn switch_thread(&self, thread_id: &str) -> Result<OpenedThread, BridgeError> {
        self.gateway.switch_thread(thread_id).await?;
        self.open_thread(Some(thread_id)).await
    }

    /// Send one user message to a thread and return the reply.
    ///
    /// Serialized per thread: a second send on the same thread awaits
    /// the first's resolution (success or failure) before it reaches
    /// the gateway. The chat title is fixed here, before transmission,
    /// so the first attempted send names the chat even when it fails.
    pub async fn send(&self, thread_id: &str, text: &str) -> Result<String, BridgeError> {
        let lock = self.send_lock(thread_id);
        let _guard = lock.lock().await;

        {
            let mut organizer = self.organizer.lock();
            let _ = organizer.register_or_update_chat(thread_id, text, None);
        }

        let reply = self
            .gateway
            .send(thread_id, &[WireMessage::user(text)])
            .await?;
        Ok(reply)
    }

    /// Drop a thread locally, attempting remote deletion first.
    /// Remote failure is logged and ignored: the local record is only
    /// an index entry.
    pub async fn delete_thread(&self, thread_id: &str) {
        if let Err(e) = self.gateway.delete_thread(thread_id).await {
            tracing::warn!(thread_id = %thread_id, error = %e, "Remote thread delete failed");
        }
        self.organizer.lock().delete_chat_ref(thread_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{OrganizerState, StateStore, PLACEHOLDER_TITLE};
    use crate::gateway::{MockGateway, MockReply};
    use std::time::Duration;
    use tempfile::tempdir;

    fn bridge_with(gateway: Arc<MockGateway>) -> (tempfile::TempDir, SessionBridge) {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("organizer.json"));
        store.save(&OrganizerState::default()).unwrap();
        let organizer = Arc::new(parking_lot::Mutex::new(Organizer::load(store)));
        (dir, SessionBridge::new(gateway, organizer))
    }

    #[tokio::test]
    async fn open_thread_indexes_and_activates() {
        let gateway = Arc::new(MockGateway::new());
        gateway.seed_thread(
            "thread-a",
            vec![
                WireMessage::user("Pricing question"),
                WireMessage::assistant("Sure."),
            ],
        );
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));

        let opened = bridge.open_thread(Some("thread-a")).await.unwrap();
        assert_eq!(opened.thread_id, "thread-a");
        assert_eq!(opened.messages.len(), 2);

        let organizer = bridge.organizer();
        let organizer = organizer.lock();
        assert_eq!(organizer.chat("thread-a").unwrap().title, "Pricing question");
        assert_eq!(organizer.active_thread_id(), Some("thread-a"));
        assert_eq!(organizer.state().uncategorized, vec!["thread-a"]);
    }

    #[tokio::test]
    async fn open_thread_without_id_resolves_current() {
        let gateway = Arc::new(MockGateway::new());
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));

        let opened = bridge.open_thread(None).await.unwrap();
        assert_eq!(opened.thread_id, "thread-1");
        assert!(opened.messages.is_empty());
        assert_eq!(gateway.current_thread().as_deref(), Some("thread-1"));
    }

    #[tokio::test]
    async fn open_thread_transport_failure_touches_nothing() {
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_next_history();
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));

        let err = bridge.open_thread(None).await.unwrap_err();
        assert!(matches!(err, BridgeError::Transport(_)));

        let organizer = bridge.organizer();
        let organizer = organizer.lock();
        assert!(organizer.state().threads.is_empty());
        assert!(organizer.active_thread_id().is_none());
    }

    #[tokio::test]
    async fn new_thread_files_under_active_container() {
        let gateway = Arc::new(MockGateway::new());
        gateway.seed_thread("thread-a", Vec::new());
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));

        // Put the active chat inside a folder first
        let (folder, _) = {
            let organizer = bridge.organizer();
            let mut organizer = organizer.lock();
            let project = organizer.create_project("Acme").unwrap();
            let folder = organizer.create_folder(project, "Leads").unwrap();
            organizer
                .register_or_update_chat("thread-a", "Existing", Some(folder))
                .unwrap();
            organizer.set_active(Some("thread-a"));
            (folder, project)
        };

        let new_id = bridge.new_thread().await.unwrap();

        let organizer = bridge.organizer();
        let organizer = organizer.lock();
        assert_eq!(organizer.container_of(&new_id), Some(folder));
        assert_eq!(organizer.active_thread_id(), Some(new_id.as_str()));
        assert_eq!(organizer.chat(&new_id).unwrap().title, PLACEHOLDER_TITLE);
    }

    #[tokio::test]
    async fn failed_new_thread_leaves_previous_state() {
        let gateway = Arc::new(MockGateway::new());
        gateway.seed_thread("thread-a", Vec::new());
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));
        bridge.open_thread(Some("thread-a")).await.unwrap();

        gateway.fail_next_new_thread();
        let err = bridge.new_thread().await.unwrap_err();
        assert!(matches!(err, BridgeError::Transport(_)));

        let organizer = bridge.organizer();
        let organizer = organizer.lock();
        assert_eq!(organizer.active_thread_id(), Some("thread-a"));
        assert_eq!(organizer.state().threads.len(), 1);
    }

    #[tokio::test]
    async fn switch_unknown_thread_keeps_active_pointer() {
        let gateway = Arc::new(MockGateway::new());
        gateway.seed_thread("thread-a", Vec::new());
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));
        bridge.open_thread(Some("thread-a")).await.unwrap();

        let err = bridge.switch_thread("ghost").await.unwrap_err();
        assert!(matches!(err, BridgeError::UnknownThread(_)));

        let organizer = bridge.organizer();
        let organizer = organizer.lock();
        assert_eq!(organizer.active_thread_id(), Some("thread-a"));
    }

    #[tokio::test]
    async fn send_fixes_title_once() {
        let gateway = Arc::new(MockGateway::new());
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));
        let id = bridge.new_thread().await.unwrap();

        bridge.send(&id, "Hello").await.unwrap();
        {
            let organizer = bridge.organizer();
            let organizer = organizer.lock();
            assert_eq!(organizer.chat(&id).unwrap().title, "Hello");
        }

        bridge.send(&id, "Different subject").await.unwrap();
        let organizer = bridge.organizer();
        let organizer = organizer.lock();
        assert_eq!(organizer.chat(&id).unwrap().title, "Hello");
    }

    #[tokio::test]
    async fn send_failure_fixes_title_and_releases_lock() {
        let gateway = Arc::new(MockGateway::new());
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));
        let id = bridge.new_thread().await.unwrap();

        gateway.push_reply(MockReply::Unreachable);
        let err = bridge.send(&id, "First try").await.unwrap_err();
        assert!(matches!(err, BridgeError::Transport(_)));

        // Title was still derived from the attempted send
        {
            let organizer = bridge.organizer();
            let organizer = organizer.lock();
            assert_eq!(organizer.chat(&id).unwrap().title, "First try");
        }

        // And the thread is not wedged: the next send goes through
        let reply = bridge.send(&id, "Second try").await.unwrap();
        assert_eq!(reply, "echo: Second try");
    }

    #[tokio::test]
    async fn sends_on_one_thread_are_serialized_in_order() {
        let gateway = Arc::new(MockGateway::new().with_send_delay(Duration::from_millis(30)));
        let (_dir, bridge) = bridge_with(Arc::clone(&gateway));
        let bridge = Arc::new(bridge);
        let id = bridge.new_thread().await.unwrap();

        let first = {
            let bridge = Arc::clone(&bridge);
            let id = id.clone();
            tokio::spawn(async move { bridge.send(&id, "first").await })
        };
        // Let the first send take the lock before issuing the second
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = {
            let bridge = Arc::clone(&bridge);
            let id = id.clone();
            tokio::spawn(async move { bridge.send(&id, "second").await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let contents: Vec<String> = gateway
            .thread_messages(&id)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(
            contents,
            vec!["first", "echo: first", "second", "echo: second"]
        );
    }
}
