// Project commands

use super::str_arg;
use crate::protocol::CallToolResult;
use crate::registry::{CommandArgs, CommandDef, CommandFuture, ParamKind, ParamSpec};
use railmcp_api::ApiClient;
use std::sync::Arc;

pub(super) static DEFS: &[CommandDef] = &[
    CommandDef {
        name: "project_list",
        description: "List all projects visible to the configured credential",
        params: &[],
        run: project_list,
    },
    CommandDef {
        name: "project_info",
        description: "Get a project with its environments and services",
        params: &[ParamSpec::required(
            "projectId",
            ParamKind::String,
            "ID of the project to inspect",
        )],
        run: project_info,
    },
    CommandDef {
        name: "project_create",
        description: "Create a new empty project",
        params: &[ParamSpec::required(
            "name",
            ParamKind::String,
            "Name for the new project",
        )],
        run: project_create,
    },
    CommandDef {
        name: "project_delete",
        description: "Delete a project and everything in it",
        params: &[ParamSpec::required(
            "projectId",
            ParamKind::String,
            "ID of the project to delete",
        )],
        run: project_delete,
    },
    CommandDef {
        name: "environment_list",
        description: "List the environments in a project",
        params: &[ParamSpec::required(
            "projectId",
            ParamKind::String,
            "ID of the project",
        )],
        run: environment_list,
    },
];

fn project_list(api: Arc<ApiClient>, _args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let projects = api.list_projects().await?;
        let json = serde_json::to_string_pretty(&projects)?;
        Ok(CallToolResult::text(format!(
            "Found {} project(s):\n\n{}",
            projects.len(),
            json
        )))
    })
}

fn project_info(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let project = api.get_project(str_arg(&args, "projectId")?).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&project)?))
    })
}

fn project_create(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let project = api.create_project(str_arg(&args, "name")?).await?;
        Ok(CallToolResult::text(format!(
            "Created project `{}` ({})",
            project.name, project.id
        )))
    })
}

fn project_delete(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let id = str_arg(&args, "projectId")?;
        api.delete_project(id).await?;
        Ok(CallToolResult::text(format!("Deleted project {}", id)))
    })
}

fn environment_list(api: Arc<ApiClient>, args: CommandArgs) -> CommandFuture {
    Box::pin(async move {
        let environments = api.list_environments(str_arg(&args, "projectId")?).await?;
        let json = serde_json::to_string_pretty(&environments)?;
        Ok(CallToolResult::text(format!(
            "Found {} environment(s):\n\n{}",
            environments.len(),
            json
        )))
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
    async fn environment_list_renders_project_environments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "project": {
                    "id": "p1",
                    "name": "demo",
                    "environments": { "edges": [
                        { "node": { "id": "env-1", "name": "production" } },
                        { "node": { "id": "env-2", "name": "staging" } }
                    ] },
                    "services": { "edges": [] }
                } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = ApiConfig::new("token", format!("{}/graphql", server.uri()));
        let registry = CommandRegistry::new(Arc::new(ApiClient::new(&cfg).unwrap()));

        let result = registry
            .dispatch(
                "environment_list",
                Some(serde_json::json!({ "projectId": "p1" })),
            )
            .await
            .unwrap();
        assert!(result.is_error.is_none());
        let crate::protocol::ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("Found 2 environment(s)"));
        assert!(text.contains("production"));
    }
}
