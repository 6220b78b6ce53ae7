// MCP (Model Context Protocol) engine and command registry.
// One engine instance exists per client session; all instances share
// the same immutable command registry.

pub mod commands;
pub mod engine;
pub mod protocol;
pub mod registry;

pub use engine::McpEngine;
pub use registry::{CommandDef, CommandRegistry, ParamKind, ParamSpec};

/// Protocol revision that introduced the streamable HTTP transport.
pub const PROTOCOL_VERSION_LATEST: &str = "2025-03-26";

/// Older revision still spoken by SSE-transport clients.
pub const PROTOCOL_VERSION_SSE: &str = "2024-11-05";

/// Server name advertised during the initialize handshake.
pub const SERVER_NAME: &str = "railmcp";
