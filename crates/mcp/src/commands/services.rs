// Service commands

use super::{opt_str_arg, str_arg};
use crate::protocol::CallToolResult;
use crate::registry::{CommandArgs, CommandDef, CommandFuture, ParamKind, ParamSpec};
use railmcp_api::ApiClient;
use std::sync::Arc;

pub(super) static DEFS: &[CommandDef] = &[
    CommandDef {
        name: "service_list",
        description: "List the services in a project",
        params: &[ParamSpec::required(
            "projectId",
            ParamKind::String,
            "ID of the project",
        )],
        run: service_list,
    },
    CommandDef {
        name: "service_info",
        description: "Get details for one service",
        params: &[ParamSpec::required(
            "serviceId",
            ParamKind::String,
            "ID of the service",
        )],
        run: service_info,
    },
    CommandDef {
        name: "service_create",
        description: "Create a service in a project from a GitHub repository",
        params: &[
            ParamSpec::required("projectId", ParamKind::String, "ID of the target project"),
            ParamSpec::required(
                "repo",
                ParamKind::String,
                "GitHub repository in owner/name form",
            ),
            ParamSpec::optional(
                "name",
                ParamKind::String,
                "Service name (defaults to the repository name)",
            ),
        ],
        run: service_create,
    },
];

fn service_list(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let services = api.list_services(str_arg(&args, "projectId")?).await?;
        let json = serde_json::to_string_pretty(&services)?;
        Ok(CallToolResult::text(format!(
            "Found {} service(s):\n\n{}",
            services.len(),
            json
        )))
    })
}

fn service_info(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let service = api.get_service(str_arg(&args, "serviceId")?).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&service)?))
    })
}

fn service_create(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let service = api
            .create_service(
                str_arg(&args, "projectId")?,
                str_arg(&args, "repo")?,
                opt_str_arg(&args, "name"),
            )
            .await?;
        Ok(CallToolResult::text(format!(
            "Created service `{}` ({})",
            service.name, service.id
        )))
    })
}
