//! Gateway HTTP server assembly.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ServeConfig;

use super::assistant::AssistantClient;
use super::handlers::{self, GatewayState};

/// Build the gateway router over the given upstream client
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api/history", get(handlers::history))
        .route("/api/threads", post(handlers::new_thread))
        .route("/api/threads/current", post(handlers::switch_thread))
        .route("/api/threads/{id}/messages", post(handlers::send))
        .route("/api/threads/{id}", delete(handlers::delete_thread))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the gateway until the process is stopped
pub async fn serve(listen: SocketAddr, config: &ServeConfig) -> anyhow::Result<()> {
    if config.assistant_key.is_none() {
        tracing::warn!("THREADBOOK_ASSISTANT_KEY is not set; upstream calls may be rejected");
    }

    let assistant = AssistantClient::new(config);
    let state = Arc::new(GatewayState::new(assistant));

    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(addr = %listen, "Gateway listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
