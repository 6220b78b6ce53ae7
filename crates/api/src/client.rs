//! HTTP client for the platform's GraphQL API.

use crate::error::{ApiError, ApiResult};
use crate::queries;
use railmcp_core::{
    ApiConfig, Connection, Deployment, Environment, LogLine, Project, Service, VariableMap,
};
use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Shape of a GraphQL response envelope.
#[derive(Debug, serde::Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, serde::Deserialize)]
struct GraphqlError {
    message: String,
}

/// Client for issuing queries and mutations against the backend.
///
/// Cheap to clone; the underlying `reqwest::Client` is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    /// Create a client with the bearer credential baked into every request.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.token))
                .map_err(|_| ApiError::Config("invalid API token format".to_string()))?,
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!("railmcp/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    /// Execute one GraphQL operation and return the `data` payload.
    pub async fn graphql(&self, query: &str, variables: Value) -> ApiResult<Value> {
        debug!(url = %self.api_url, "GraphQL request");

        let response = self
            .client
            .post(&self.api_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        let envelope: GraphqlResponse = response.json().await?;
        if !envelope.errors.is_empty() {
            let joined = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ApiError::Graphql(joined));
        }

        envelope.data.ok_or(ApiError::MissingField("data"))
    }

    /// Pull one named field out of a `data` payload.
    fn field<T: DeserializeOwned>(mut data: Value, name: &'static str) -> ApiResult<T> {
        let value = data
            .get_mut(name)
            .map(Value::take)
            .ok_or(ApiError::MissingField(name))?;
        Ok(serde_json::from_value(value)?)
    }

    // --- projects ---

    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        let data = self.graphql(queries::PROJECTS, json!({})).await?;
        let conn: Connection<Project> = Self::field(data, "projects")?;
        Ok(conn.into_nodes())
    }

    pub async fn get_project(&self, id: &str) -> ApiResult<Project> {
        let data = self.graphql(queries::PROJECT, json!({ "id": id })).await?;
        Self::field(data, "project")
    }

    pub async fn create_project(&self, name: &str) -> ApiResult<Project> {
        let data = self
            .graphql(queries::PROJECT_CREATE, json!({ "name": name }))
            .await?;
        Self::field(data, "projectCreate")
    }

    pub async fn delete_project(&self, id: &str) -> ApiResult<bool> {
        let data = self
            .graphql(queries::PROJECT_DELETE, json!({ "id": id }))
            .await?;
        Self::field(data, "projectDelete")
    }

    // --- services ---

    pub async fn list_services(&self, project_id: &str) -> ApiResult<Vec<Service>> {
        // Services hang off the project node; one query, no separate endpoint.
        let project = self.get_project(project_id).await?;
        Ok(project.services.into_nodes())
    }

    pub async fn list_environments(&self, project_id: &str) -> ApiResult<Vec<Environment>> {
        let project = self.get_project(project_id).await?;
        Ok(project.environments.into_nodes())
    }

    pub async fn get_service(&self, id: &str) -> ApiResult<Service> {
        let data = self.graphql(queries::SERVICE, json!({ "id": id })).await?;
        Self::field(data, "service")
    }

    pub async fn create_service(
        &self,
        project_id: &str,
        repo: &str,
        name: Option<&str>,
    ) -> ApiResult<Service> {
        let data = self
            .graphql(
                queries::SERVICE_CREATE,
                json!({
                    "input": {
                        "projectId": project_id,
                        "name": name,
                        "source": { "repo": repo },
                    }
                }),
            )
            .await?;
        Self::field(data, "serviceCreate")
    }

    // --- deployments ---

    pub async fn list_deployments(
        &self,
        project_id: &str,
        service_id: &str,
        environment_id: &str,
        limit: Option<u32>,
    ) -> ApiResult<Vec<Deployment>> {
        let data = self
            .graphql(
                queries::DEPLOYMENTS,
                json!({
                    "input": {
                        "projectId": project_id,
                        "serviceId": service_id,
                        "environmentId": environment_id,
                    },
                    "first": limit.unwrap_or(10),
                }),
            )
            .await?;
        let conn: Connection<Deployment> = Self::field(data, "deployments")?;
        Ok(conn.into_nodes())
    }

    pub async fn get_deployment(&self, id: &str) -> ApiResult<Deployment> {
        let data = self
            .graphql(queries::DEPLOYMENT, json!({ "id": id }))
            .await?;
        Self::field(data, "deployment")
    }

    pub async fn trigger_deployment(
        &self,
        service_id: &str,
        environment_id: &str,
        commit_sha: Option<&str>,
    ) -> ApiResult<bool> {
        let data = self
            .graphql(
                queries::DEPLOYMENT_TRIGGER,
                json!({
                    "serviceId": service_id,
                    "environmentId": environment_id,
                    "commitSha": commit_sha,
                }),
            )
            .await?;
        Self::field(data, "serviceInstanceDeploy")
    }

    pub async fn deployment_logs(
        &self,
        deployment_id: &str,
        limit: Option<u32>,
    ) -> ApiResult<Vec<LogLine>> {
        let data = self
            .graphql(
                queries::DEPLOYMENT_LOGS,
                json!({
                    "deploymentId": deployment_id,
                    "limit": limit.unwrap_or(100),
                }),
            )
            .await?;
        Self::field(data, "deploymentLogs")
    }

    // --- variables ---

    pub async fn list_variables(
        &self,
        project_id: &str,
        environment_id: &str,
        service_id: Option<&str>,
    ) -> ApiResult<VariableMap> {
        let data = self
            .graphql(
                queries::VARIABLES,
                json!({
                    "projectId": project_id,
                    "environmentId": environment_id,
                    "serviceId": service_id,
                }),
            )
            .await?;
        Self::field(data, "variables")
    }

    pub async fn upsert_variable(
        &self,
        project_id: &str,
        environment_id: &str,
        service_id: Option<&str>,
        name: &str,
        value: &str,
    ) -> ApiResult<()> {
        self.graphql(
            queries::VARIABLE_UPSERT,
            json!({
                "input": {
                    "projectId": project_id,
                    "environmentId": environment_id,
                    "serviceId": service_id,
                    "name": name,
                    "value": value,
                }
            }),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_variable(
        &self,
        project_id: &str,
        environment_id: &str,
        service_id: Option<&str>,
        name: &str,
    ) -> ApiResult<()> {
        self.graphql(
            queries::VARIABLE_DELETE,
            json!({
                "input": {
                    "projectId": project_id,
                    "environmentId": environment_id,
                    "serviceId": service_id,
                    "name": name,
                }
            }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ApiClient {
        let cfg = ApiConfig::new("test-token", format!("{}/graphql", server.uri()));
        ApiClient::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "projects": { "edges": [] } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let projects = test_client(&server).list_projects().await.unwrap();
        assert!(projects.is_empty());
    }

    #[tokio::test]
    async fn graphql_errors_surface_as_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "errors": [{ "message": "Not Authorized" }]
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).list_projects().await.unwrap_err();
        match err {
            ApiError::Graphql(msg) => assert!(msg.contains("Not Authorized")),
            other => panic!("expected Graphql error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_failure_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = test_client(&server).list_projects().await.unwrap_err();
        match err {
            ApiError::Api { status, .. } => assert_eq!(status, 502),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn variables_deserialize_as_map() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "variables": { "projectId": "p1", "environmentId": "e1" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "variables": { "DATABASE_URL": "postgres://x", "PORT": "8080" } }
            })))
            .mount(&server)
            .await;

        let vars = test_client(&server)
            .list_variables("p1", "e1", None)
            .await
            .unwrap();
        assert_eq!(vars.get("PORT").map(String::as_str), Some("8080"));
        assert_eq!(vars.len(), 2);
    }
}
