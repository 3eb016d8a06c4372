//! Local data layer: organizer entities, the organizer model and its
//! JSON persistence.

pub mod models;
pub mod organizer;
pub mod store;

pub use models::{ChatRef, Folder, OrganizerState, Project, PLACEHOLDER_TITLE};
pub use organizer::{FolderView, Organizer, OrganizerError, OrganizerView, ProjectView};
pub use store::StateStore;
