//! Application events and input modes.

use crate::gateway::WireMessage;

/// Events delivered to the main loop from spawned gateway tasks.
/// Each carries the thread id it belongs to so results arriving after
/// the user moved on can be discarded instead of misapplied.
#[derive(Debug)]
pub enum AppEvent {
    /// A thread was opened (startup, switch, or new-thread hydrate)
    ThreadOpened {
        thread_id: String,
        messages: Vec<WireMessage>,
    },
    /// Opening a thread failed; the previous view stays
    OpenFailed { notice: String },
    /// The gateway rejected a switch; active pointer unchanged
    SwitchRejected { thread_id: String, notice: String },
    /// A send resolved, with a reply or an inline error notice
    SendResolved {
        thread_id: String,
        outcome: Result<String, String>,
    },
    /// A thread was deleted locally (and best-effort remotely)
    ThreadDeleted { thread_id: String },
}

/// Where keystrokes are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Composer focused
    Chat,
    /// Sidebar tree focused
    Sidebar,
    /// Editing the sidebar search query
    Search,
    /// A dialog overlay is open
    Dialog,
}
