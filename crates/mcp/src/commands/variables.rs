// Environment variable commands.
//
// `variable_bulk_set` applies keys independently in sorted order and has
// no atomicity: the first failure stops the loop, already-applied keys
// stay applied, and the result names everything that was never attempted.

use super::{map_arg, opt_str_arg, str_arg};
use crate::protocol::CallToolResult;
use crate::registry::{CommandArgs, CommandDef, CommandFuture, ParamKind, ParamSpec};
use railmcp_api::ApiClient;
use std::fmt::Write as _;
use std::sync::Arc;

pub(super) static DEFS: &[CommandDef] = &[
    CommandDef {
        name: "variable_list",
        description: "List environment variables for an environment or service",
        params: &[
            ParamSpec::required("projectId", ParamKind::String, "ID of the project"),
            ParamSpec::required("environmentId", ParamKind::String, "ID of the environment"),
            ParamSpec::optional(
                "serviceId",
                ParamKind::String,
                "Restrict to one service (omit for shared variables)",
            ),
        ],
        run: variable_list,
    },
    CommandDef {
        name: "variable_set",
        description: "Create or update one environment variable",
        params: &[
            ParamSpec::required("projectId", ParamKind::String, "ID of the project"),
            ParamSpec::required("environmentId", ParamKind::String, "ID of the environment"),
            ParamSpec::required("name", ParamKind::String, "Variable name"),
            ParamSpec::required("value", ParamKind::String, "Variable value"),
            ParamSpec::optional("serviceId", ParamKind::String, "Restrict to one service"),
        ],
        run: variable_set,
    },
    CommandDef {
        name: "variable_delete",
        description: "Delete one environment variable",
        params: &[
            ParamSpec::required("projectId", ParamKind::String, "ID of the project"),
            ParamSpec::required("environmentId", ParamKind::String, "ID of the environment"),
            ParamSpec::required("name", ParamKind::String, "Variable name"),
            ParamSpec::optional("serviceId", ParamKind::String, "Restrict to one service"),
        ],
        run: variable_delete,
    },
    CommandDef {
        name: "variable_bulk_set",
        description: "Set many environment variables in one call (no rollback on failure)",
        params: &[
            ParamSpec::required("projectId", ParamKind::String, "ID of the project"),
            ParamSpec::required("environmentId", ParamKind::String, "ID of the environment"),
            ParamSpec::required(
                "variables",
                ParamKind::StringMap,
                "Variables to set, keyed by name",
            ),
            ParamSpec::optional("serviceId", ParamKind::String, "Restrict to one service"),
        ],
        run: variable_bulk_set,
    },
];

fn variable_list(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let vars = api
            .list_variables(
                str_arg(&args, "projectId")?,
                str_arg(&args, "environmentId")?,
                opt_str_arg(&args, "serviceId"),
            )
            .await?;

        let mut out = format!("Found {} variable(s):\n", vars.len());
        for (name, value) in &vars {
            let _ = writeln!(out, "  {}={}", name, value);
        }
        Ok(CallToolResult::text(out))
    })
}

fn variable_set(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let name = str_arg(&args, "name")?;
        api.upsert_variable(
            str_arg(&args, "projectId")?,
            str_arg(&args, "environmentId")?,
            opt_str_arg(&args, "serviceId"),
            name,
            str_arg(&args, "value")?,
        )
        .await?;
        Ok(CallToolResult::text(format!("Set variable `{}`", name)))
    })
}

fn variable_delete(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let name = str_arg(&args, "name")?;
        api.delete_variable(
            str_arg(&args, "projectId")?,
            str_arg(&args, "environmentId")?,
            opt_str_arg(&args, "serviceId"),
            name,
        )
        .await?;
        Ok(CallToolResult::text(format!("Deleted variable `{}`", name)))
    })
}

fn variable_bulk_set(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let project_id = str_arg(&args, "projectId")?.to_string();
        let environment_id = str_arg(&args, "environmentId")?.to_string();
        let service_id = opt_str_arg(&args, "serviceId").map(str::to_string);
        let vars = map_arg(&args, "variables")?;

        let mut applied: Vec<&str> = Vec::new();
        let mut failed: Option<(&str, String)> = None;
        let mut skipped: Vec<&str> = Vec::new();

        // BTreeMap iteration gives a deterministic application order.
        for (name, value) in &vars {
            if failed.is_some() {
                skipped.push(name);
                continue;
            }
            match api
                .upsert_variable(
                    &project_id,
                    &environment_id,
                    service_id.as_deref(),
                    name,
                    value,
                )
                .await
            {
                Ok(()) => applied.push(name),
                Err(e) => failed = Some((name, e.to_string())),
            }
        }

        let mut out = format!("Applied {} of {} variable(s):\n", applied.len(), vars.len());
        for name in &applied {
            let _ = writeln!(out, "  ok      {}", name);
        }
        if let Some((name, reason)) = &failed {
            let _ = writeln!(out, "  failed  {}: {}", name, reason);
        }
        if !skipped.is_empty() {
            let _ = writeln!(out, "Not attempted: {}", skipped.join(", "));
        }

        Ok(if failed.is_some() {
            CallToolResult {
                content: vec![crate::protocol::ToolContent::text(out)],
                is_error: Some(true),
            }
        } else {
            CallToolResult::text(out)
        })
    })
}

#[cfg(test)]
mod tests {
    use crate::registry::CommandRegistry;
    use railmcp_api::ApiClient;
    use railmcp_core::ApiConfig;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn registry_against(server: &MockServer) -> CommandRegistry {
        let cfg = ApiConfig::new("token", format!("{}/graphql", server.uri()));
        CommandRegistry::new(Arc::new(ApiClient::new(&cfg).unwrap()))
    }

    #[tokio::test]
    async fn bulk_set_stops_at_first_failure_and_skips_the_rest() {
        let server = MockServer::start().await;

        let upsert = |name: &str| {
            body_partial_json(serde_json::json!({
                "variables": { "input": { "name": name } }
            }))
        };

        Mock::given(method("POST"))
            .and(upsert("A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "variableUpsert": true }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(upsert("B"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "errors": [{ "message": "value rejected" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        // C must never reach the backend once B has failed.
        Mock::given(method("POST"))
            .and(upsert("C"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let registry = registry_against(&server).await;
        let result = registry
            .dispatch(
                "variable_bulk_set",
                Some(serde_json::json!({
                    "projectId": "p1",
                    "environmentId": "e1",
                    "variables": { "A": "1", "B": "2", "C": "3" },
                })),
            )
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("ok      A"));
        assert!(text.contains("failed  B"));
        assert!(text.contains("Not attempted: C"));
    }

    #[tokio::test]
    async fn bulk_set_all_success_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "variableUpsert": true }
            })))
            .expect(2)
            .mount(&server)
            .await;

        let registry = registry_against(&server).await;
        let result = registry
            .dispatch(
                "variable_bulk_set",
                Some(serde_json::json!({
                    "projectId": "p1",
                    "environmentId": "e1",
                    "variables": { "A": "1", "B": "2" },
                })),
            )
            .await
            .unwrap();

        assert!(result.is_error.is_none());
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("Applied 2 of 2"));
    }
}
