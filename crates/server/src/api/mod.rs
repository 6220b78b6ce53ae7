use crate::config::AppState;
use anyhow::Result;
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod mcp;
pub mod sse;

/// Start the HTTP server
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("MCP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the transport router.
///
/// Both transports share one session manager; CORS is wide open and
/// OPTIONS preflights never reach the handlers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Streamable HTTP transport
        .route("/mcp", post(mcp::post_message).delete(mcp::delete_session))
        // Legacy SSE transport
        .route("/sse", get(sse::open_stream))
        .route("/messages", post(sse::post_message))
        // Diagnostics
        .route("/health", get(health))
        .route("/", get(capabilities))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.sessions.count(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Static capability description: endpoint map and tool names.
async fn capabilities(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": railmcp_mcp::SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "mcp": "POST /mcp (DELETE to end the session)",
            "sse": "GET /sse",
            "messages": "POST /messages?sessionId=<id>",
            "health": "GET /health",
        },
        "tools": state.registry.names(),
    }))
}
