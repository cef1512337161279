//! Coordinator configuration.
//!
//! Values are read from environment variables prefixed `SQS_VISIBILITY__`,
//! for example `SQS_VISIBILITY__PROXY_URL=http://proxy:3128` sets
//! `proxy_url`. Credentials fall back to the standard `AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN` variables.

use crate::backoff::{BackoffPolicy, DEFAULT_INCREMENT_SECONDS};
use crate::error::ConfigError;
use crate::signing::Credentials;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const ENV_PREFIX: &str = "SQS_VISIBILITY";

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_visibility_increment_seconds() -> u32 {
    DEFAULT_INCREMENT_SECONDS
}

/// Settings for the SQS client and the backoff policy
#[derive(Clone, Deserialize)]
pub struct CoordinatorConfig {
    /// Endpoint override, e.g. `http://localhost:4566`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Outbound proxy applied to all calls; blank means none
    #[serde(default)]
    pub proxy_url: Option<String>,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Seconds added to the visibility timeout per prior delivery
    #[serde(default = "default_visibility_increment_seconds")]
    pub visibility_increment_seconds: u32,

    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    #[serde(default)]
    pub session_token: Option<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            proxy_url: None,
            request_timeout_seconds: default_request_timeout_seconds(),
            visibility_increment_seconds: default_visibility_increment_seconds(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parsing`] when a variable cannot be coerced to
    /// its field type and [`ConfigError::Invalid`] when validation fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let mut config: Self = settings.try_deserialize()?;

        if config.access_key_id.is_none() && config.secret_access_key.is_none() {
            config.access_key_id = non_blank_env("AWS_ACCESS_KEY_ID");
            config.secret_access_key = non_blank_env("AWS_SECRET_ACCESS_KEY");
            if config.session_token.is_none() {
                config.session_token = non_blank_env("AWS_SESSION_TOKEN");
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Set endpoint override
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set outbound proxy
    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Set static access key pair
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set session token for temporary credentials
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Set seconds added per prior delivery
    pub fn with_visibility_increment(mut self, seconds: u32) -> Self {
        self.visibility_increment_seconds = seconds;
        self
    }

    /// Check the configuration for inconsistent values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "request_timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(ConfigError::Invalid {
                message: "access_key_id and secret_access_key must be set together".to_string(),
            });
        }

        if let Some(endpoint) = &self.endpoint {
            reqwest::Url::parse(endpoint).map_err(|e| ConfigError::Invalid {
                message: format!("endpoint '{}' is not a valid URL: {}", endpoint, e),
            })?;
        }

        Ok(())
    }

    /// Proxy URL, ignoring blank values
    pub fn proxy(&self) -> Option<&str> {
        self.proxy_url
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Get per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get backoff policy from the configured increment
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.visibility_increment_seconds)
    }

    /// Static credentials, when both key parts are configured
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials = Credentials::new(access_key.as_str(), secret_key.as_str());
                Some(match &self.session_token {
                    Some(token) => credentials.with_session_token(token.as_str()),
                    None => credentials,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for CoordinatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorConfig")
            .field("endpoint", &self.endpoint)
            .field("proxy_url", &self.proxy_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field(
                "visibility_increment_seconds",
                &self.visibility_increment_seconds,
            )
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
