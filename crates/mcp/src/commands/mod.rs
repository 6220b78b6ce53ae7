// Command table: every operation the server exposes as an MCP tool.
// Definitions are static data interpreted by the registry dispatcher.

mod deployments;
mod projects;
mod services;
mod variables;

use crate::registry::{CommandArgs, CommandDef};
use anyhow::Context;
use railmcp_core::VariableMap;
use serde_json::Value;

/// All command definitions, in table order.
pub fn all() -> impl Iterator<Item = &'static CommandDef> {
    projects::DEFS
        .iter()
        .chain(services::DEFS)
        .chain(deployments::DEFS)
        .chain(variables::DEFS)
}

// Argument extractors. Schema validation has already run; these only
// unwrap the shapes it guaranteed, propagating instead of panicking if
// a command's params table and its extractor drift apart.

fn str_arg<'a>(args: &'a CommandArgs, name: &str) -> anyhow::Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .with_context(|| format!("missing string parameter `{name}`"))
}

fn opt_str_arg<'a>(args: &'a CommandArgs, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

fn opt_u32_arg(args: &CommandArgs, name: &str) -> anyhow::Result<Option<u32>> {
    let Some(value) = args.get(name) else {
        return Ok(None);
    };
    // Schema validation only guarantees "number"; fractional and
    // out-of-range values are rejected here rather than truncated.
    let n = value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .with_context(|| {
            format!("parameter `{name}` must be an integer between 0 and {}", u32::MAX)
        })?;
    Ok(Some(n))
}

fn map_arg(args: &CommandArgs, name: &str) -> anyhow::Result<VariableMap> {
    let object = args
        .get(name)
        .and_then(Value::as_object)
        .with_context(|| format!("missing map parameter `{name}`"))?;

    Ok(object
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect())
}
