//! The thin HTTP gateway fronting the upstream assistant API.

pub mod assistant;
pub mod error;
pub mod handlers;
pub mod server;

pub use assistant::{AssistantClient, AssistantError};
pub use error::WebError;
pub use handlers::GatewayState;
pub use server::{router, serve};
