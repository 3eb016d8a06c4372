//! Collaborator gateway boundary: the trait the session bridge talks
//! through, its HTTP implementation, the shared wire types, and a
//! scripted mock for tests.

pub mod client;
pub mod mock;
pub mod types;

pub use client::{Gateway, GatewayError, HttpGateway};
pub use mock::{MockGateway, MockReply};
pub use types::{
    AckResponse, NewThreadResponse, Role, SendRequest, SendResponse, SwitchThreadRequest,
    ThreadHistory, WireMessage,
};
