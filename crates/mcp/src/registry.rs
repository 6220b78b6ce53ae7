// Declarative command registry.
//
// Commands are data: a name, a parameter schema, and a pointer to the
// function mapping validated arguments onto backend calls. One generic
// dispatcher validates and executes; nothing is registered at runtime.

use crate::protocol::{CallToolResult, ToolSchema};
use futures::future::BoxFuture;
use railmcp_api::ApiClient;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Validated `tools/call` arguments.
pub type CommandArgs = Map<String, Value>;

pub type CommandFuture = BoxFuture<'static, anyhow::Result<CallToolResult>>;

/// Maps validated arguments to backend calls and renders the result.
pub type CommandFn = fn(Arc<ApiClient>, CommandArgs) -> CommandFuture;

/// Wire type of a single command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    /// Open string-keyed map of strings (bulk variable input).
    StringMap,
}

/// One named parameter in a command's input schema.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }

    fn json_schema(&self) -> Value {
        match self.kind {
            ParamKind::String => json!({
                "type": "string",
                "description": self.description,
            }),
            ParamKind::Number => json!({
                "type": "number",
                "description": self.description,
            }),
            ParamKind::StringMap => json!({
                "type": "object",
                "additionalProperties": { "type": "string" },
                "description": self.description,
            }),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self.kind {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::StringMap => value
                .as_object()
                .is_some_and(|m| m.values().all(Value::is_string)),
        }
    }
}

/// Static definition of one callable command.
pub struct CommandDef {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub run: CommandFn,
}

impl CommandDef {
    /// Render the MCP tool schema for `tools/list`.
    pub fn schema(&self) -> ToolSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for p in self.params {
            properties.insert(p.name.to_string(), p.json_schema());
            if p.required {
                required.push(p.name);
            }
        }

        ToolSchema {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    /// Check arguments against the parameter schema before any backend call.
    pub fn validate(&self, arguments: Option<Value>) -> Result<CommandArgs, String> {
        let args = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err("arguments must be an object".to_string()),
        };

        for key in args.keys() {
            if !self.params.iter().any(|p| p.name == key) {
                return Err(format!("unknown parameter `{}`", key));
            }
        }

        for p in self.params {
            match args.get(p.name) {
                Some(value) => {
                    if !p.matches(value) {
                        return Err(format!(
                            "parameter `{}` has the wrong type (expected {:?})",
                            p.name, p.kind
                        ));
                    }
                }
                None if p.required => {
                    return Err(format!("missing required parameter `{}`", p.name));
                }
                None => {}
            }
        }

        Ok(args)
    }
}

/// Why a dispatch was rejected before reaching the backend.
#[derive(Debug)]
pub enum DispatchError {
    UnknownCommand(String),
    InvalidParams(String),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(name) => write!(f, "unknown tool: {}", name),
            Self::InvalidParams(msg) => write!(f, "invalid arguments: {}", msg),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Immutable table of commands plus the shared backend client.
///
/// Built once at startup; every session's engine sees the same table.
pub struct CommandRegistry {
    commands: HashMap<&'static str, &'static CommandDef>,
    api: Arc<ApiClient>,
}

impl CommandRegistry {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let mut commands = HashMap::new();
        for def in crate::commands::all() {
            // Duplicate names would shadow silently; the table is small
            // enough to check on every startup.
            debug_assert!(!commands.contains_key(def.name), "duplicate command name");
            commands.insert(def.name, def);
        }
        Self { commands, api }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sorted command names, for the capability description endpoint.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Tool schemas in name order, for `tools/list`.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut defs: Vec<_> = self.commands.values().collect();
        defs.sort_unstable_by_key(|d| d.name);
        defs.iter().map(|d| d.schema()).collect()
    }

    /// Validate and execute one command.
    ///
    /// Backend failures are rendered into an error-flagged tool result;
    /// only unknown names and schema violations are rejected outright.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<CallToolResult, DispatchError> {
        let def = self
            .commands
            .get(name)
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_string()))?;

        let args = def.validate(arguments).map_err(DispatchError::InvalidParams)?;

        tracing::debug!(command = name, "dispatching command");
        match (def.run)(self.api.clone(), args).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(command = name, error = %e, "command failed");
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }
}
