//! GraphQL query and mutation templates.
//!
//! These are data, interpreted by [`crate::ApiClient`]; parameters travel
//! in the `variables` object, never by string interpolation.

pub const PROJECTS: &str = r#"
query Projects {
  projects {
    edges {
      node {
        id
        name
        description
        createdAt
      }
    }
  }
}"#;

pub const PROJECT: &str = r#"
query Project($id: String!) {
  project(id: $id) {
    id
    name
    description
    createdAt
    environments {
      edges {
        node {
          id
          name
        }
      }
    }
    services {
      edges {
        node {
          id
          name
        }
      }
    }
  }
}"#;

pub const PROJECT_CREATE: &str = r#"
mutation ProjectCreate($name: String) {
  projectCreate(input: { name: $name }) {
    id
    name
    createdAt
  }
}"#;

pub const PROJECT_DELETE: &str = r#"
mutation ProjectDelete($id: String!) {
  projectDelete(id: $id)
}"#;

pub const SERVICE: &str = r#"
query Service($id: String!) {
  service(id: $id) {
    id
    name
    projectId
    createdAt
  }
}"#;

pub const SERVICE_CREATE: &str = r#"
mutation ServiceCreate($input: ServiceCreateInput!) {
  serviceCreate(input: $input) {
    id
    name
    projectId
  }
}"#;

pub const DEPLOYMENTS: &str = r#"
query Deployments($input: DeploymentListInput!, $first: Int) {
  deployments(input: $input, first: $first) {
    edges {
      node {
        id
        status
        createdAt
        url
        staticUrl
      }
    }
  }
}"#;

pub const DEPLOYMENT: &str = r#"
query Deployment($id: String!) {
  deployment(id: $id) {
    id
    status
    createdAt
    url
    staticUrl
  }
}"#;

pub const DEPLOYMENT_TRIGGER: &str = r#"
mutation ServiceInstanceDeploy($serviceId: String!, $environmentId: String!, $commitSha: String) {
  serviceInstanceDeploy(
    serviceId: $serviceId
    environmentId: $environmentId
    commitSha: $commitSha
  )
}"#;

pub const DEPLOYMENT_LOGS: &str = r#"
query DeploymentLogs($deploymentId: String!, $limit: Int) {
  deploymentLogs(deploymentId: $deploymentId, limit: $limit) {
    timestamp
    message
    severity
  }
}"#;

pub const VARIABLES: &str = r#"
query Variables($projectId: String!, $environmentId: String!, $serviceId: String) {
  variables(
    projectId: $projectId
    environmentId: $environmentId
    serviceId: $serviceId
  )
}"#;

pub const VARIABLE_UPSERT: &str = r#"
mutation VariableUpsert($input: VariableUpsertInput!) {
  variableUpsert(input: $input)
}"#;

pub const VARIABLE_DELETE: &str = r#"
mutation VariableDelete($input: VariableDeleteInput!) {
  variableDelete(input: $input)
}"#;
