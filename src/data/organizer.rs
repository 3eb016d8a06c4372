//! The organizer model: an owned tree of projects, folders and chat
//! references plus the active-thread pointer.
//!
//! All operations are synchronous in-memory mutations followed by a
//! persist. Validation happens before any mutation, so a returned
//! error means the tree is unchanged. A thread id lives in exactly
//! one container (a folder or the uncategorized bucket); folder and
//! project deletion reassign their chats to uncategorized rather
//! than dropping them.

use thiserror::Error;
use uuid::Uuid;

use super::models::{ChatRef, Folder, OrganizerState, Project};
use super::store::StateStore;
use crate::session::title::derive_title;

/// Error from an organizer operation. The tree is never left
/// partially mutated when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrganizerError {
    /// Rejected before mutation (empty name and the like)
    #[error("invalid input: {0}")]
    Validation(String),
    /// Operation referenced an unknown project or folder id
    #[error("not found: {0}")]
    NotFound(String),
}

/// Read-only projection of the tree after a search filter
#[derive(Debug, Clone)]
pub struct OrganizerView {
    pub projects: Vec<ProjectView>,
    pub uncategorized: Vec<ChatRef>,
}

#[derive(Debug, Clone)]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    pub folders: Vec<FolderView>,
}

#[derive(Debug, Clone)]
pub struct FolderView {
    pub id: Uuid,
    pub name: String,
    pub open: bool,
    pub chats: Vec<ChatRef>,
}

/// Owned organizer state bound to its store. Initialized from the
/// store at startup; every mutating call persists before returning.
pub struct Organizer {
    state: OrganizerState,
    store: StateStore,
}

impl Organizer {
    /// Load the organizer from its store
    pub fn load(store: StateStore) -> Self {
        let state = store.load();
        Self { state, store }
    }

    pub fn state(&self) -> &OrganizerState {
        &self.state
    }

    /// Persist the current tree. Failures are logged, not propagated:
    /// the in-memory mutation already happened and the next successful
    /// save catches the file up.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            tracing::warn!(error = %e, "Failed to persist organizer state");
        }
    }

    fn validated_name(name: &str) -> Result<String, OrganizerError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(OrganizerError::Validation("name must not be empty".into()));
        }
        Ok(trimmed.to_string())
    }

    // ----- projects -----

    pub fn create_project(&mut self, name: &str) -> Result<Uuid, OrganizerError> {
        let name = Self::validated_name(name)?;
        let project = Project::new(name);
        let id = project.id;
        self.state.projects.push(project);
        self.persist();
        Ok(id)
    }

    pub fn rename_project(&mut self, id: Uuid, name: &str) -> Result<(), OrganizerError> {
        let name = Self::validated_name(name)?;
        let project = self
            .state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| OrganizerError::NotFound(format!("project {}", id)))?;
        project.name = name;
        self.persist();
        Ok(())
    }

    /// Delete a project. All chats in all of its folders move to
    /// uncategorized (in tree order) before the project is dropped.
    pub fn delete_project(&mut self, id: Uuid) -> Result<(), OrganizerError> {
        let idx = self
            .state
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| OrganizerError::NotFound(format!("project {}", id)))?;

        let project = self.state.projects.remove(idx);
        for folder in project.folders {
            self.state.uncategorized.extend(folder.chats);
        }
        self.persist();
        Ok(())
    }

    // ----- folders -----

    pub fn create_folder(&mut self, project_id: Uuid, name: &str) -> Result<Uuid, OrganizerError> {
        let name = Self::validated_name(name)?;
        let project = self
            .state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| OrganizerError::NotFound(format!("project {}", project_id)))?;
        let folder = Folder::new(name);
        let id = folder.id;
        project.folders.push(folder);
        self.persist();
        Ok(id)
    }

    pub fn rename_folder(&mut self, id: Uuid, name: &str) -> Result<(), OrganizerError> {
        let name = Self::validated_name(name)?;
        let folder = self
            .folder_mut(id)
            .ok_or_else(|| OrganizerError::NotFound(format!("folder {}", id)))?;
        folder.name = name;
        self.persist();
        Ok(())
    }

    /// Delete a folder, reassigning its chats to uncategorized.
    pub fn delete_folder(&mut self, id: Uuid) -> Result<(), OrganizerError> {
        for project in &mut self.state.projects {
            if let Some(idx) = project.folders.iter().position(|f| f.id == id) {
                let folder = project.folders.remove(idx);
                self.state.uncategorized.extend(folder.chats);
                self.persist();
                return Ok(());
            }
        }
        Err(OrganizerError::NotFound(format!("folder {}", id)))
    }

    /// Record the sidebar expand state for a folder
    pub fn set_folder_open(&mut self, id: Uuid, open: bool) -> Result<(), OrganizerError> {
        let folder = self
            .folder_mut(id)
            .ok_or_else(|| OrganizerError::NotFound(format!("folder {}", id)))?;
        folder.open = open;
        self.persist();
        Ok(())
    }

    fn folder_mut(&mut self, id: Uuid) -> Option<&mut Folder> {
        self.state
            .projects
            .iter_mut()
            .flat_map(|p| p.folders.iter_mut())
            .find(|f| f.id == id)
    }

    fn folder(&self, id: Uuid) -> Option<&Folder> {
        self.state
            .projects
            .iter()
            .flat_map(|p| p.folders.iter())
            .find(|f| f.id == id)
    }

    // ----- chats -----

    /// Idempotent upsert of a chat reference.
    ///
    /// An unseen thread id is indexed into `container` (None =
    /// uncategorized) with a title derived from `title_hint`. A seen
    /// id only has its title upgraded while it still carries the
    /// placeholder; it is never moved between containers here.
    pub fn register_or_update_chat(
        &mut self,
        thread_id: &str,
        title_hint: &str,
        container: Option<Uuid>,
    ) -> Result<(), OrganizerError> {
        let title = derive_title(title_hint);

        if let Some(existing) = self.state.threads.get_mut(thread_id) {
            if existing.has_placeholder_title() && existing.title != title {
                existing.title = title;
                self.persist();
            }
            return Ok(());
        }

        // Resolve the container before touching anything so an
        // unknown folder id leaves the tree untouched.
        if let Some(folder_id) = container {
            if self.folder(folder_id).is_none() {
                return Err(OrganizerError::NotFound(format!("folder {}", folder_id)));
            }
        }

        self.state
            .threads
            .insert(thread_id.to_string(), ChatRef::new(thread_id, title));
        self.attach_chat(thread_id, container);
        self.persist();
        Ok(())
    }

    /// Explicitly rename a chat, overriding the derived title
    pub fn rename_chat(&mut self, thread_id: &str, title: &str) -> Result<(), OrganizerError> {
        let title = Self::validated_name(title)?;
        let chat = self
            .state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| OrganizerError::NotFound(format!("thread {}", thread_id)))?;
        chat.title = title;
        self.persist();
        Ok(())
    }

    /// Move a chat to the target folder (None = uncategorized).
    /// Unknown thread ids are a no-op; an unknown target folder is an
    /// error and leaves the tree unchanged.
    pub fn move_chat(
        &mut self,
        thread_id: &str,
        target: Option<Uuid>,
    ) -> Result<(), OrganizerError> {
        if !self.state.threads.contains_key(thread_id) {
            return Ok(());
        }
        if let Some(folder_id) = target {
            if self.folder(folder_id).is_none() {
                return Err(OrganizerError::NotFound(format!("folder {}", folder_id)));
            }
        }

        self.detach_chat(thread_id);
        self.attach_chat(thread_id, target);
        self.persist();
        Ok(())
    }

    /// Drop the local index entry for a thread. The remote thread is
    /// not touched.
    pub fn delete_chat_ref(&mut self, thread_id: &str) {
        self.detach_chat(thread_id);
        self.state.threads.remove(thread_id);
        if self.state.last_active_thread_id.as_deref() == Some(thread_id) {
            self.state.last_active_thread_id = None;
        }
        self.persist();
    }

    /// Insert a thread id into the target container. Callers verify
    /// the folder exists first; an id that cannot be placed lands in
    /// uncategorized so it is never dropped.
    fn attach_chat(&mut self, thread_id: &str, target: Option<Uuid>) {
        if let Some(folder_id) = target {
            if let Some(folder) = self.folder_mut(folder_id) {
                folder.chats.push(thread_id.to_string());
                return;
            }
        }
        self.state.uncategorized.push(thread_id.to_string());
    }

    /// Remove a thread id from whichever container currently holds it
    fn detach_chat(&mut self, thread_id: &str) {
        self.state.uncategorized.retain(|id| id != thread_id);
        for project in &mut self.state.projects {
            for folder in &mut project.folders {
                folder.chats.retain(|id| id != thread_id);
            }
        }
    }

    // ----- queries -----

    pub fn chat(&self, thread_id: &str) -> Option<&ChatRef> {
        self.state.threads.get(thread_id)
    }

    /// The folder currently holding a chat, or None when it sits in
    /// uncategorized (or is unknown).
    pub fn container_of(&self, thread_id: &str) -> Option<Uuid> {
        self.state
            .projects
            .iter()
            .flat_map(|p| p.folders.iter())
            .find(|f| f.chats.iter().any(|id| id == thread_id))
            .map(|f| f.id)
    }

    pub fn active_thread_id(&self) -> Option<&str> {
        self.state.last_active_thread_id.as_deref()
    }

    /// The folder the active chat lives in, used to file new chats
    /// next to the one the user is looking at.
    pub fn active_container(&self) -> Option<Uuid> {
        self.active_thread_id()
            .map(|id| id.to_string())
            .and_then(|id| self.container_of(&id))
    }

    /// Update the active pointer. Remote existence is not validated
    /// here; that is the session bridge's job.
    pub fn set_active(&mut self, thread_id: Option<&str>) {
        self.state.last_active_thread_id = thread_id.map(|s| s.to_string());
        self.persist();
    }

    /// Project the tree through a case-insensitive title filter.
    /// Chats that do not match are pruned from their container's
    /// list; projects and folders always stay visible so navigation
    /// never dead-ends. An empty query returns the full tree.
    pub fn filter(&self, query: &str) -> OrganizerView {
        let needle = query.trim().to_lowercase();
        let matches = |id: &str| -> Option<ChatRef> {
            let chat = self.state.threads.get(id)?;
            if needle.is_empty() || chat.title.to_lowercase().contains(&needle) {
                Some(chat.clone())
            } else {
                None
            }
        };

        OrganizerView {
            projects: self
                .state
                .projects
                .iter()
                .map(|p| ProjectView {
                    id: p.id,
                    name: p.name.clone(),
                    folders: p
                        .folders
                        .iter()
                        .map(|f| FolderView {
                            id: f.id,
                            name: f.name.clone(),
                            open: f.open,
                            chats: f.chats.iter().filter_map(|id| matches(id)).collect(),
                        })
                        .collect(),
                })
                .collect(),
            uncategorized: self
                .state
                .uncategorized
                .iter()
                .filter_map(|id| matches(id))
                .collect(),
        }
    }
}
