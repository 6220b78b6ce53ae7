// Legacy SSE transport: a long-lived event stream opened with GET /sse,
// with client messages arriving separately on POST /messages.
//
// The handshake event tells the client where to post; replies flow back
// as `message` events. Closing the stream destroys the session.

use crate::config::AppState;
use crate::session::{SessionManager, TransportKind};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::Stream;
use railmcp_mcp::protocol::{JsonRpcError, JsonRpcResponse};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Replies buffered per session before the engine blocks on a slow client.
const OUTBOUND_BUFFER: usize = 32;

/// Destroys the session when the response stream is dropped, which is
/// the only disconnect signal axum gives us.
struct StreamGuard {
    sessions: Arc<SessionManager>,
    id: String,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if self.sessions.destroy(&self.id) {
            tracing::info!(session = %self.id, "sse client disconnected");
        }
    }
}

pub async fn open_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::channel::<JsonRpcResponse>(OUTBOUND_BUFFER);
    let id = state.sessions.create(TransportKind::Sse, Some(tx));
    let guard = StreamGuard {
        sessions: state.sessions.clone(),
        id: id.clone(),
    };

    let stream = async_stream::stream! {
        let _guard = guard;

        // Handshake: the session id reaches the client as the message
        // endpoint it should post to.
        yield Ok(Event::default()
            .event("endpoint")
            .data(format!("/messages?sessionId={}", id)));

        while let Some(reply) = rx.recv().await {
            match serde_json::to_string(&reply) {
                Ok(json) => yield Ok(Event::default().event("message").data(json)),
                // The stream has started; nothing to do but log and drop.
                Err(e) => tracing::warn!(error = %e, "dropping unserializable reply"),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

pub async fn post_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(sid) = query.session_id.filter(|s| !s.is_empty()) else {
        return error_status(StatusCode::BAD_REQUEST, "missing sessionId query parameter");
    };

    let Some(handle) = state.sessions.lookup(&sid) else {
        return error_status(StatusCode::NOT_FOUND, "unknown or expired session");
    };
    let (TransportKind::Sse, Some(sender)) = (handle.kind, handle.outbound.clone()) else {
        return error_status(StatusCode::NOT_FOUND, "session does not belong to this transport");
    };

    let reply = {
        let mut engine = handle.engine.lock().await;
        engine.handle_raw(&body).await
    };

    if let Some(reply) = reply {
        if sender.send(reply).await.is_err() {
            // Receiver gone: the stream closed while we were processing.
            tracing::warn!(session = %sid, "sse stream closed, destroying session");
            state.sessions.destroy(&sid);
            return error_status(StatusCode::NOT_FOUND, "session stream closed");
        }
    }

    StatusCode::ACCEPTED.into_response()
}

fn error_status(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(JsonRpcResponse::error(
            serde_json::Value::Null,
            JsonRpcError::invalid_session(message),
        )),
    )
        .into_response()
}
