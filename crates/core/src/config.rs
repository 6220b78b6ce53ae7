use serde::{Deserialize, Serialize};

/// Default GraphQL endpoint of the platform's public API
pub const DEFAULT_API_URL: &str = "https://backboard.railway.com/graphql/v2";

/// Environment variable holding the bearer credential
pub const TOKEN_ENV_VAR: &str = "RAILWAY_API_TOKEN";

/// Environment variable overriding the backend endpoint
pub const API_URL_ENV_VAR: &str = "RAILWAY_API_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing API token: set {TOKEN_ENV_VAR}")]
    MissingToken,

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Backend connection settings: one static credential, one endpoint.
///
/// The token is attached to every backend call; there is no per-request
/// credential handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(skip_serializing)]
    pub token: String,
    pub api_url: String,
}

impl ApiConfig {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: api_url.into(),
        }
    }

    /// Load from the process environment, falling back to the public endpoint.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let api_url =
            std::env::var(API_URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(api_url));
        }

        Ok(Self { token, api_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config() {
        let cfg = ApiConfig::new("secret", DEFAULT_API_URL);
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.token, "secret");
    }

    #[test]
    fn token_is_not_serialized() {
        let cfg = ApiConfig::new("secret", DEFAULT_API_URL);
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));
    }
}
