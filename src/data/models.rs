//! Data models for the organizer tree
//!
//! Projects and folders are owned locally and carry generated ids.
//! Chats are weak references: the id is the remote thread identifier,
//! the message history lives behind the gateway, and only the display
//! title and timestamp are kept here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title shown for a chat until its first message fixes a real one
pub const PLACEHOLDER_TITLE: &str = "New chat";

/// A project groups folders of chats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Folders owned by this project, in display order
    #[serde(default)]
    pub folders: Vec<Folder>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            folders: Vec::new(),
        }
    }
}

/// A folder holds an ordered list of chat thread ids
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Whether the folder is expanded in the sidebar
    #[serde(default = "default_open")]
    pub open: bool,
    /// Thread ids filed in this folder, in display order
    #[serde(default)]
    pub chats: Vec<String>,
}

fn default_open() -> bool {
    true
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            open: true,
            chats: Vec::new(),
        }
    }
}

/// Local index entry for a remote thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRef {
    /// Remote thread identifier (opaque, owned by the gateway)
    #[serde(default)]
    pub id: String,
    /// Display title, independent of the thread's actual content
    #[serde(default)]
    pub title: String,
    /// When this entry was first registered locally
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ChatRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether the title is still the unset placeholder
    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }
}

/// The whole persisted organizer tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerState {
    /// Projects in display order
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Thread ids not filed in any folder, in display order
    #[serde(default)]
    pub uncategorized: Vec<String>,
    /// Thread metadata by thread id
    #[serde(default)]
    pub threads: HashMap<String, ChatRef>,
    /// Last active thread id, restored on startup
    #[serde(default)]
    pub last_active_thread_id: Option<String>,
}

impl OrganizerState {
    /// The state seeded on first run or after a corrupt load:
    /// one project with one empty folder.
    pub fn seeded() -> Self {
        let mut project = Project::new("My project");
        project.folders.push(Folder::new("General"));
        Self {
            projects: vec![project],
            uncategorized: Vec::new(),
            threads: HashMap::new(),
            last_active_thread_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_state_shape() {
        let state = OrganizerState::seeded();
        assert_eq!(state.projects.len(), 1);
        assert_eq!(state.projects[0].folders.len(), 1);
        assert!(state.projects[0].folders[0].chats.is_empty());
        assert!(state.uncategorized.is_empty());
        assert!(state.last_active_thread_id.is_none());
    }

    #[test]
    fn state_tolerates_missing_fields() {
        // Older files may lack whole sections; load must default them
        let state: OrganizerState = serde_json::from_str(r#"{"projects": []}"#).unwrap();
        assert!(state.uncategorized.is_empty());
        assert!(state.threads.is_empty());
        assert!(state.last_active_thread_id.is_none());
    }

    #[test]
    fn state_tolerates_unknown_fields() {
        let state: OrganizerState =
            serde_json::from_str(r#"{"projects": [], "futureField": 42}"#).unwrap();
        assert!(state.projects.is_empty());
    }

    #[test]
    fn folder_defaults_to_open() {
        let folder: Folder = serde_json::from_str(r#"{"name": "Leads"}"#).unwrap();
        assert!(folder.open);
    }
}
