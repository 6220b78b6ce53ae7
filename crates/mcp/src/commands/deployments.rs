// Deployment commands

use super::{opt_str_arg, opt_u32_arg, str_arg};
use crate::protocol::CallToolResult;
use crate::registry::{CommandArgs, CommandDef, CommandFuture, ParamKind, ParamSpec};
use railmcp_api::ApiClient;
use std::sync::Arc;

pub(super) static DEFS: &[CommandDef] = &[
    CommandDef {
        name: "deployment_list",
        description: "List recent deployments of a service in an environment",
        params: &[
            ParamSpec::required("projectId", ParamKind::String, "ID of the project"),
            ParamSpec::required("serviceId", ParamKind::String, "ID of the service"),
            ParamSpec::required("environmentId", ParamKind::String, "ID of the environment"),
            ParamSpec::optional("limit", ParamKind::Number, "Max deployments to return (default 10)"),
        ],
        run: deployment_list,
    },
    CommandDef {
        name: "deployment_trigger",
        description: "Trigger a new deployment of a service",
        params: &[
            ParamSpec::required("serviceId", ParamKind::String, "ID of the service"),
            ParamSpec::required("environmentId", ParamKind::String, "ID of the environment"),
            ParamSpec::optional("commitSha", ParamKind::String, "Specific commit to deploy"),
        ],
        run: deployment_trigger,
    },
    CommandDef {
        name: "deployment_status",
        description: "Get the current status of a deployment",
        params: &[ParamSpec::required(
            "deploymentId",
            ParamKind::String,
            "ID of the deployment",
        )],
        run: deployment_status,
    },
    CommandDef {
        name: "deployment_logs",
        description: "Fetch build and runtime logs for a deployment",
        params: &[
            ParamSpec::required("deploymentId", ParamKind::String, "ID of the deployment"),
            ParamSpec::optional("limit", ParamKind::Number, "Max log lines to return (default 100)"),
        ],
        run: deployment_logs,
    },
];

fn deployment_list(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let deployments = api
            .list_deployments(
                str_arg(&args, "projectId")?,
                str_arg(&args, "serviceId")?,
                str_arg(&args, "environmentId")?,
                opt_u32_arg(&args, "limit")?,
            )
            .await?;
        let json = serde_json::to_string_pretty(&deployments)?;
        Ok(CallToolResult::text(format!(
            "Found {} deployment(s):\n\n{}",
            deployments.len(),
            json
        )))
    })
}

fn deployment_trigger(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let service_id = str_arg(&args, "serviceId")?;
        api.trigger_deployment(
            service_id,
            str_arg(&args, "environmentId")?,
            opt_str_arg(&args, "commitSha"),
        )
        .await?;
        Ok(CallToolResult::text(format!(
            "Deployment triggered for service {}",
            service_id
        )))
    })
}

fn deployment_status(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let deployment = api.get_deployment(str_arg(&args, "deploymentId")?).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(
            &deployment,
        )?))
    })
}

fn deployment_logs(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let lines = api
            .deployment_logs(
                str_arg(&args, "deploymentId")?,
                opt_u32_arg(&args, "limit")?,
            )
            .await?;

        let mut out = format!("Retrieved {} log line(s):\n\n", lines.len());
        for line in &lines {
            match &line.timestamp {
                Some(ts) => out.push_str(&format!("[{}] {}\n", ts.to_rfc3339(), line.message)),
                None => {
                    out.push_str(&line.message);
                    out.push('\n');
                }
            }
        }
        Ok(CallToolResult::text(out))
    })
}

#[cfg(test)]
mod tests {
    use crate::registry::CommandRegistry;
    use railmcp_api::ApiClient;
    use railmcp_core::ApiConfig;
    use std::sync::Arc;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn unrepresentable_limit_is_rejected_before_the_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cfg = ApiConfig::new("token", format!("{}/graphql", server.uri()));
        let registry = CommandRegistry::new(Arc::new(ApiClient::new(&cfg).unwrap()));

        // Above u32 range: must fail, not wrap.
        let result = registry
            .dispatch(
                "deployment_logs",
                Some(serde_json::json!({
                    "deploymentId": "d1",
                    "limit": 5_000_000_000u64,
                })),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("limit"));

        // Fractional: passes the "number" schema check, rejected here.
        let result = registry
            .dispatch(
                "deployment_logs",
                Some(serde_json::json!({
                    "deploymentId": "d1",
                    "limit": 1.5,
                })),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("limit"));
    }
}
