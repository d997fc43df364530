use super::error::{RestDaoError, RestResult};

/// Runtime configuration describing how to reach the hosted realtime database.
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl RestConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    /// Attach a database auth token to every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> RestResult<Self> {
        let base_url =
            std::env::var("HOF_REMOTE_BASE_URL").map_err(|_| RestDaoError::MissingEnvVar {
                var: "HOF_REMOTE_BASE_URL",
            })?;

        let mut config = Self::new(base_url);
        if let Ok(token) = std::env::var("HOF_REMOTE_AUTH_TOKEN") {
            config = config.with_auth_token(token);
        }

        Ok(config)
    }
}
