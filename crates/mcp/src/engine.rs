// Per-session MCP protocol engine.
//
// One instance exists per client session. It owns the lifecycle state
// machine (initialize handshake, initialized notification, ready) and
// routes requests into the shared command registry. Transport concerns
// live in the server crate; the engine only sees decoded payloads.

use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::registry::{CommandRegistry, DispatchError};
use crate::{PROTOCOL_VERSION_LATEST, PROTOCOL_VERSION_SSE, SERVER_NAME};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    New,
    InitResponded,
    Ready,
}

pub struct McpEngine {
    registry: Arc<CommandRegistry>,
    state: EngineState,
    protocol_version: Option<String>,
}

impl McpEngine {
    /// Factory entry point: every session gets a fresh engine bound to
    /// the one shared registry.
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            state: EngineState::New,
            protocol_version: None,
        }
    }

    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Decode and handle one raw transport payload.
    ///
    /// Returns `None` for notifications; malformed payloads produce an
    /// error response rather than failing the transport.
    pub async fn handle_raw(&mut self, body: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        if value.is_array() {
            return Some(JsonRpcResponse::error(
                Value::Null,
                JsonRpcError::invalid_request("batching not supported"),
            ));
        }

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::invalid_request(format!("invalid request: {}", e)),
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Handle one decoded JSON-RPC message.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            let id = request.id.unwrap_or(Value::Null);
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("invalid jsonrpc version"),
            ));
        }

        if request.is_notification() {
            self.handle_notification(&request.method);
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);
        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            // Ping is allowed in any state.
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => {
                if self.state != EngineState::Ready {
                    JsonRpcResponse::error(id, JsonRpcError::not_initialized())
                } else {
                    JsonRpcResponse::success(
                        id,
                        ListToolsResult {
                            tools: self.registry.schemas(),
                        },
                    )
                }
            }
            "tools/call" => {
                if self.state != EngineState::Ready {
                    JsonRpcResponse::error(id, JsonRpcError::not_initialized())
                } else {
                    self.call_tool(id, request.params).await
                }
            }
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        };

        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        if method == "notifications/initialized" && self.state == EngineState::InitResponded {
            self.state = EngineState::Ready;
        }
    }

    fn initialize(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        if self.state != EngineState::New {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("already initialized"),
            );
        }

        let Some(params) = params else {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("missing params"));
        };

        let init: InitializeParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string()));
            }
        };

        let negotiated = Self::negotiate_protocol(&init.protocol_version);
        self.protocol_version = Some(negotiated.to_string());
        self.state = EngineState::InitResponded;

        if let Some(client) = &init.client_info {
            tracing::debug!(client = %client.name, version = %client.version, "client initialized");
        }

        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: negotiated.to_string(),
                capabilities: ServerCapabilities {
                    tools: ToolsCapability {
                        list_changed: false,
                    },
                },
                server_info: ServerInfo {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
        )
    }

    fn negotiate_protocol(requested: &str) -> &'static str {
        if requested == PROTOCOL_VERSION_SSE {
            PROTOCOL_VERSION_SSE
        } else {
            PROTOCOL_VERSION_LATEST
        }
    }

    async fn call_tool(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("missing params"));
        };

        let call: CallToolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string()));
            }
        };

        match self.registry.dispatch(&call.name, call.arguments).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e @ DispatchError::UnknownCommand(_)) | Err(e @ DispatchError::InvalidParams(_)) => {
                JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railmcp_api::ApiClient;
    use railmcp_core::ApiConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_for(api_url: &str) -> McpEngine {
        let cfg = ApiConfig::new("token", api_url);
        let registry = CommandRegistry::new(Arc::new(ApiClient::new(&cfg).unwrap()));
        McpEngine::new(Arc::new(registry))
    }

    fn offline_engine() -> McpEngine {
        engine_for("http://127.0.0.1:1/graphql")
    }

    async fn initialize(engine: &mut McpEngine) {
        let resp = engine
            .handle_request(JsonRpcRequest::new(
                1,
                "initialize",
                serde_json::json!({ "protocolVersion": PROTOCOL_VERSION_LATEST }),
            ))
            .await
            .unwrap();
        assert!(resp.error.is_none());
        engine
            .handle_request(JsonRpcRequest::notification("notifications/initialized"))
            .await;
    }

    #[tokio::test]
    async fn lifecycle_gates_tool_methods() {
        let mut engine = offline_engine();

        let resp = engine
            .handle_request(JsonRpcRequest::new(1, "tools/list", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32002));

        // ping works in any state
        let resp = engine
            .handle_request(JsonRpcRequest::new(2, "ping", serde_json::json!({})))
            .await
            .unwrap();
        assert!(resp.error.is_none());

        initialize(&mut engine).await;

        let resp = engine
            .handle_request(JsonRpcRequest::new(3, "tools/list", serde_json::json!({})))
            .await
            .unwrap();
        assert!(resp.error.is_none());
        let tools = &resp.result.unwrap()["tools"];
        assert!(tools.as_array().unwrap().len() >= 10);
    }

    #[tokio::test]
    async fn double_initialize_is_rejected() {
        let mut engine = offline_engine();
        initialize(&mut engine).await;

        let resp = engine
            .handle_request(JsonRpcRequest::new(
                9,
                "initialize",
                serde_json::json!({ "protocolVersion": PROTOCOL_VERSION_LATEST }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32600));
    }

    #[tokio::test]
    async fn unknown_method_and_unknown_tool() {
        let mut engine = offline_engine();
        initialize(&mut engine).await;

        let resp = engine
            .handle_request(JsonRpcRequest::new(4, "resources/list", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32601));

        let resp = engine
            .handle_request(JsonRpcRequest::new(
                5,
                "tools/call",
                serde_json::json!({ "name": "nope", "arguments": {} }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32602));
    }

    #[tokio::test]
    async fn malformed_payloads_become_error_responses() {
        let mut engine = offline_engine();

        let resp = engine.handle_raw("{not json").await.unwrap();
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32700));

        let resp = engine.handle_raw("[{\"jsonrpc\":\"2.0\"}]").await.unwrap();
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32600));
    }

    #[tokio::test]
    async fn sse_era_protocol_version_is_preserved() {
        let mut engine = offline_engine();
        let resp = engine
            .handle_request(JsonRpcRequest::new(
                1,
                "initialize",
                serde_json::json!({ "protocolVersion": PROTOCOL_VERSION_SSE }),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION_SSE);
    }

    #[tokio::test]
    async fn tools_call_reaches_the_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "projects": { "edges": [
                    { "node": { "id": "p1", "name": "demo" } }
                ] } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut engine = engine_for(&format!("{}/graphql", server.uri()));
        initialize(&mut engine).await;

        let resp = engine
            .handle_request(JsonRpcRequest::new(
                7,
                "tools/call",
                serde_json::json!({ "name": "project_list" }),
            ))
            .await
            .unwrap();
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_ne!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("demo"));
    }

    #[tokio::test]
    async fn backend_failure_flows_through_the_result_channel() {
        let mut engine = offline_engine();
        initialize(&mut engine).await;

        // Unreachable backend: a command failure, not a protocol error.
        let resp = engine
            .handle_request(JsonRpcRequest::new(
                8,
                "tools/call",
                serde_json::json!({ "name": "project_list" }),
            ))
            .await
            .unwrap();
        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap()["isError"], true);
    }
}
