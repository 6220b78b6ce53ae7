use anyhow::{Context, Result};
use railmcp_api::ApiClient;
use railmcp_core::ApiConfig;
use railmcp_mcp::CommandRegistry;
use std::sync::Arc;

use crate::session::SessionManager;

/// Application state shared across handlers.
///
/// The registry is built once; every session's engine sees the same
/// command table. The session manager is the single source of truth
/// for which sessions are alive.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub registry: Arc<CommandRegistry>,
}

impl AppState {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api = Arc::new(ApiClient::new(config).context("Failed to create backend client")?);
        let registry = Arc::new(CommandRegistry::new(api));
        let sessions = Arc::new(SessionManager::new(registry.clone()));

        Ok(Self { sessions, registry })
    }
}
