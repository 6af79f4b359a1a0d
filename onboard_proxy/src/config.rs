//! Environment-driven proxy configuration.

use crate::{ProxyError, Result};
use onboard_core::config::{env_var, env_var_or};

/// Upstream aggregator connection settings.
#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    /// Aggregator REST API base, without a trailing slash
    pub api_base: String,
    /// Bearer token for the aggregator
    pub api_key: String,
}

impl UpstreamConfig {
    /// Loads upstream settings from the environment.
    ///
    /// `OPENROUTER_API_KEY` is required; `OPENROUTER_API_BASE` defaults to
    /// the hosted aggregator.
    pub fn from_env() -> Result<Self> {
        let api_key = env_var("OPENROUTER_API_KEY")
            .ok_or_else(|| ProxyError::Config("OPENROUTER_API_KEY is not set".to_string()))?;
        Ok(Self {
            api_base: env_var_or("OPENROUTER_API_BASE", "https://openrouter.ai/api/v1")
                .trim_end_matches('/')
                .to_string(),
            api_key,
        })
    }

    /// Creates a configuration with explicit values, for tests and tools.
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

/// Observability backend settings for the HTTP telemetry sink.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Backend REST API base
    pub api_base: String,
    /// Backend API key
    pub api_key: String,
    /// Project name spans are filed under
    pub project: String,
}

impl TelemetryConfig {
    /// Loads telemetry settings from the environment.
    ///
    /// Returns `None` when `BRAINTRUST_API_KEY` is unset: the HTTP sink is
    /// optional and the proxy falls back to tracing-only telemetry.
    pub fn from_env() -> Option<Self> {
        let api_key = env_var("BRAINTRUST_API_KEY")?;
        Some(Self {
            api_base: env_var_or("BRAINTRUST_API_BASE", "https://api.braintrust.dev/v1")
                .trim_end_matches('/')
                .to_string(),
            api_key,
            project: env_var_or("BRAINTRUST_PROJECT_NAME", "AnythingLLM"),
        })
    }
}

/// Full proxy configuration.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// TCP port to listen on
    pub port: u16,
    /// Upstream aggregator settings
    pub upstream: UpstreamConfig,
    /// Optional observability backend settings
    pub telemetry: Option<TelemetryConfig>,
}

impl ProxyConfig {
    /// Loads the full configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let port = match env_var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ProxyError::Config(format!("Invalid PORT value: {raw}")))?,
            None => 8080,
        };
        Ok(Self {
            port,
            upstream: UpstreamConfig::from_env()?,
            telemetry: TelemetryConfig::from_env(),
        })
    }
}
