//! Error types for the backend client adapter.

/// Result type for backend operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur when talking to the platform API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success HTTP status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Backend accepted the request but returned GraphQL-level errors.
    #[error("GraphQL error: {0}")]
    Graphql(String),

    /// Response body did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field was absent from the response data.
    #[error("missing field in response: {0}")]
    MissingField(&'static str),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Create an API error from a status code and raw response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            message: body.trim().to_string(),
        }
    }
}
