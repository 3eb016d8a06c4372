//! Organizer state persistence
//!
//! The whole tree is one JSON document on disk. A missing or
//! unreadable file yields the seeded default instead of an error:
//! losing the local index is acceptable, refusing to start is not.

use std::fs;
use std::path::PathBuf;

use super::models::OrganizerState;

/// Loads and saves the organizer tree at a fixed path
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location (~/.threadbook/organizer.json)
    pub fn at_default_path() -> Self {
        Self::new(crate::util::paths::organizer_state_path())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the last persisted state, falling back to the seeded
    /// default when the file is missing or unparseable.
    pub fn load(&self) -> OrganizerState {
        if !self.path.exists() {
            return OrganizerState::seeded();
        }

        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Organizer state unparseable, starting from seeded default"
                    );
                    OrganizerState::seeded()
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Organizer state unreadable, starting from seeded default"
                );
                OrganizerState::seeded()
            }
        }
    }

    /// Save state to disk
    pub fn save(&self, state: &OrganizerState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
