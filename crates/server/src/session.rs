// Session manager: owns the map from session id to live session state.
//
// Map mutations happen under a short synchronous lock; engine work runs
// under the per-session mutex after the map lock is released, so
// messages for one session are serialized while different sessions
// interleave freely.

use railmcp_mcp::protocol::JsonRpcResponse;
use railmcp_mcp::{CommandRegistry, McpEngine};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Which HTTP transport a session arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Request/response streaming transport (`POST /mcp`).
    Streamable,
    /// Server-push event stream (`GET /sse` + `POST /messages`).
    Sse,
}

struct SessionEntry {
    kind: TransportKind,
    engine: Arc<tokio::sync::Mutex<McpEngine>>,
    outbound: Option<mpsc::Sender<JsonRpcResponse>>,
}

/// Everything a transport handler needs to serve one request,
/// cloned out of the map so the map lock is not held across awaits.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: String,
    pub kind: TransportKind,
    pub engine: Arc<tokio::sync::Mutex<McpEngine>>,
    pub outbound: Option<mpsc::Sender<JsonRpcResponse>>,
}

pub struct SessionManager {
    registry: Arc<CommandRegistry>,
    inner: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionManager {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Create a session with a freshly generated id and a new engine
    /// bound to the shared registry. Ids are never reused.
    pub fn create(
        &self,
        kind: TransportKind,
        outbound: Option<mpsc::Sender<JsonRpcResponse>>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let entry = SessionEntry {
            kind,
            engine: Arc::new(tokio::sync::Mutex::new(McpEngine::new(
                self.registry.clone(),
            ))),
            outbound,
        };

        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(id.clone(), entry);
        tracing::info!(session = %id, kind = ?kind, total = map.len(), "session created");
        id
    }

    pub fn lookup(&self, id: &str) -> Option<SessionHandle> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.get(id).map(|entry| SessionHandle {
            id: id.to_string(),
            kind: entry.kind,
            engine: entry.engine.clone(),
            outbound: entry.outbound.clone(),
        })
    }

    /// Remove a session. Dropping the outbound sender ends the event
    /// stream; any error there is swallowed. Idempotent: returns whether
    /// an entry actually existed.
    pub fn destroy(&self, id: &str) -> bool {
        let removed = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.remove(id)
        };
        match removed {
            Some(_) => {
                tracing::info!(session = %id, "session destroyed");
                true
            }
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railmcp_api::ApiClient;
    use railmcp_core::ApiConfig;
    use std::collections::HashSet;

    fn manager() -> SessionManager {
        let cfg = ApiConfig::new("token", "http://127.0.0.1:1/graphql");
        let registry = Arc::new(CommandRegistry::new(Arc::new(ApiClient::new(&cfg).unwrap())));
        SessionManager::new(registry)
    }

    #[test]
    fn create_lookup_destroy_lifecycle() {
        let mgr = manager();
        let id = mgr.create(TransportKind::Streamable, None);

        let handle = mgr.lookup(&id).expect("session must exist after create");
        assert_eq!(handle.kind, TransportKind::Streamable);
        assert!(handle.outbound.is_none());

        assert!(mgr.destroy(&id));
        assert!(mgr.lookup(&id).is_none());
    }

    #[test]
    fn destroy_is_idempotent() {
        let mgr = manager();
        let id = mgr.create(TransportKind::Sse, None);
        assert!(mgr.destroy(&id));
        assert!(!mgr.destroy(&id));
        assert!(!mgr.destroy("never-existed"));
    }

    #[test]
    fn ids_are_never_reused() {
        let mgr = manager();
        let mut seen = HashSet::new();
        for _ in 0..25 {
            let id = mgr.create(TransportKind::Streamable, None);
            assert!(seen.insert(id.clone()), "duplicate session id");
            mgr.destroy(&id);
        }
    }

    #[test]
    fn count_tracks_random_create_destroy_sequences() {
        let mgr = manager();
        let mut live: Vec<String> = Vec::new();

        // Deterministic but irregular create/destroy interleaving.
        for step in 0..30 {
            if step % 3 == 0 && !live.is_empty() {
                let id = live.remove(step % live.len());
                assert!(mgr.destroy(&id));
            } else {
                live.push(mgr.create(TransportKind::Streamable, None));
            }
            assert_eq!(mgr.count(), live.len());
        }
    }
}
