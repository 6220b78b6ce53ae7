// Streamable HTTP transport: request/response JSON-RPC on POST /mcp,
// session teardown on DELETE /mcp. The session id travels in the
// `Mcp-Session-Id` header both ways.

use crate::config::AppState;
use crate::session::TransportKind;
use anyhow::Context;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use railmcp_mcp::protocol::{JsonRpcError, JsonRpcResponse};
use serde_json::Value;

pub const SESSION_HEADER: &str = "mcp-session-id";

pub async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    // Last line of defense: any unexpected failure becomes a protocol
    // error response instead of taking the connection down.
    match handle_post(state, headers, body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "unhandled failure in /mcp handler");
            envelope_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                JsonRpcResponse::error(Value::Null, JsonRpcError::internal_error(e.to_string())),
                None,
            )
        }
    }
}

async fn handle_post(state: AppState, headers: HeaderMap, body: String) -> anyhow::Result<Response> {
    let value: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            return Ok(envelope_response(
                StatusCode::OK,
                JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e.to_string())),
                None,
            ));
        }
    };

    // An initialize request opens a new session; everything else must
    // name an existing one.
    if value.get("method").and_then(Value::as_str) == Some("initialize") {
        // Notification-form initialize gets no reply, so the client
        // would never learn the session id. Accept and move on instead
        // of stranding an unaddressable entry in the map.
        if value.get("id").is_none_or(Value::is_null) {
            return Ok(StatusCode::ACCEPTED.into_response());
        }

        let id = state.sessions.create(TransportKind::Streamable, None);
        let handle = state
            .sessions
            .lookup(&id)
            .context("freshly created session disappeared")?;

        let (response, version) = {
            let mut engine = handle.engine.lock().await;
            let response = engine.handle_raw(&body).await;
            (response, engine.protocol_version().map(str::to_string))
        };
        tracing::info!(
            session = %id,
            version = version.as_deref().unwrap_or("unnegotiated"),
            "session initialized"
        );

        return Ok(match response {
            Some(reply) => envelope_response(StatusCode::OK, reply, Some(&id)),
            None => StatusCode::ACCEPTED.into_response(),
        });
    }

    let Some(sid) = header_str(&headers, SESSION_HEADER) else {
        return Ok(invalid_session("missing Mcp-Session-Id header"));
    };

    let Some(handle) = state.sessions.lookup(sid) else {
        return Ok(invalid_session("unknown or expired session"));
    };
    if handle.kind != TransportKind::Streamable {
        return Ok(invalid_session("session does not belong to this transport"));
    }

    let response = {
        let mut engine = handle.engine.lock().await;
        engine.handle_raw(&body).await
    };

    Ok(match response {
        Some(reply) => envelope_response(StatusCode::OK, reply, Some(sid)),
        // Notifications get no reply body.
        None => StatusCode::ACCEPTED.into_response(),
    })
}

pub async fn delete_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(sid) = header_str(&headers, SESSION_HEADER) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if state.sessions.destroy(sid) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn invalid_session(message: &str) -> Response {
    envelope_response(
        StatusCode::BAD_REQUEST,
        JsonRpcResponse::error(Value::Null, JsonRpcError::invalid_session(message)),
        None,
    )
}

fn envelope_response(
    status: StatusCode,
    reply: JsonRpcResponse,
    session_id: Option<&str>,
) -> Response {
    let mut response = (status, axum::Json(reply)).into_response();
    if let Some(sid) = session_id {
        if let Ok(value) = HeaderValue::from_str(sid) {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}
