//! Shared test utilities for Threadbook
//!
//! Provides tempdir-backed organizer fixtures and a scripted gateway
//! wired into a session bridge.

use std::sync::Arc;

use tempfile::TempDir;
use threadbook::{MockGateway, Organizer, SessionBridge, SharedOrganizer, StateStore};

/// An organizer persisted into a temp directory, starting empty
pub fn empty_organizer() -> (TempDir, SharedOrganizer) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path().join("organizer.json"));
    store
        .save(&threadbook::OrganizerState::default())
        .expect("Failed to seed state file");
    let organizer = Arc::new(parking_lot::Mutex::new(Organizer::load(store)));
    (dir, organizer)
}

/// A session bridge over a mock gateway and a fresh organizer
pub fn mock_bridge() -> (TempDir, Arc<MockGateway>, SessionBridge) {
    let (dir, organizer) = empty_organizer();
    let gateway = Arc::new(MockGateway::new());
    let bridge = SessionBridge::new(Arc::clone(&gateway) as Arc<dyn threadbook::Gateway>, organizer);
    (dir, gateway, bridge)
}
