//! Reusable UI components

pub mod chat_message;
pub mod chat_view;
pub mod dialog;
pub mod input_box;
pub mod sidebar;
pub mod tree_view;

pub use chat_message::{ChatMessage, MessageRole};
pub use chat_view::{ChatView, ChatViewState};
pub use dialog::{Dialog, DialogKind, PendingAction};
pub use input_box::InputBox;
pub use sidebar::Sidebar;
pub use tree_view::{flatten, RowKind, TreeRow, TreeView, TreeViewState};
