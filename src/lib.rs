pub mod config;
pub mod data;
pub mod gateway;
pub mod session;
pub mod ui;
pub mod util;
pub mod web;

pub use config::Config;
pub use data::{ChatRef, Folder, Organizer, OrganizerError, OrganizerState, Project, StateStore};
pub use gateway::{Gateway, GatewayError, HttpGateway, MockGateway, ThreadHistory, WireMessage};
pub use session::{BridgeError, OpenedThread, SessionBridge, SharedOrganizer};
pub use ui::App;
