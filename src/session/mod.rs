//! Session layer: the bridge between the organizer and the remote
//! gateway, plus title derivation.

pub mod bridge;
pub mod title;

pub use bridge::{BridgeError, OpenedThread, SessionBridge, SharedOrganizer};
pub use title::derive_title;
