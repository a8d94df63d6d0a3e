//! HTTP transport: JSON-RPC over POST plus a container health check

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::server::McpServer;

const SESSION_HEADER: &str = "mcp-session-id";

pub async fn serve(server: McpServer, port: u16) -> Result<()> {
    let state = Arc::new(server);

    let app = Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    tracing::info!("MCP HTTP server ready at http://{addr}/mcp");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn handle_mcp(State(server): State<Arc<McpServer>>, body: String) -> Response {
    let session_id = Uuid::new_v4().to_string();

    match server.handle_message(&body).await {
        Some(response) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (header::HeaderName::from_static(SESSION_HEADER), session_id),
            ],
            response,
        )
            .into_response(),
        // Notifications are accepted without a body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Lightweight ping endpoint for container health checks.
async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {}", e);
        return;
    }
    tracing::info!("shutdown signal received, stopping HTTP transport");
}
