//! Environment-based configuration.
//!
//! All services are configured through environment variables, matching the
//! deployment style of the demo stack (one `.env` per service). Values are
//! trimmed of whitespace and surrounding quotes since several shells and
//! `.env` loaders leave quotes in place.

use crate::{CoreError, Result};

/// Reads an environment variable, trimming whitespace and quotes.
///
/// Returns `None` when unset or empty after trimming.
pub fn env_var(name: &str) -> Option<String> {
    let raw = std::env::var(name).ok()?;
    let trimmed = raw.trim().trim_matches('"').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Reads an environment variable with a fallback default.
pub fn env_var_or(name: &str, default: &str) -> String {
    env_var(name).unwrap_or_else(|| default.to_string())
}

/// Identity provider configuration.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// REST API base URL
    pub api_base: String,
    /// Bearer token for API calls
    pub api_key: String,
    /// Inquiry template to instantiate for new verifications
    pub template_id: Option<String>,
    /// Base URL of the provider's hosted verification flow
    pub hosted_flow_base: String,
}

impl ProviderConfig {
    /// Loads provider configuration from the environment.
    ///
    /// Requires `PERSONA_API_KEY`; everything else has sandbox defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = env_var("PERSONA_API_KEY")
            .ok_or_else(|| CoreError::Config("Missing PERSONA_API_KEY".to_string()))?;

        Ok(Self {
            api_base: env_var_or("PERSONA_API_BASE", "https://withpersona.com/api/v1")
                .trim_end_matches('/')
                .to_string(),
            api_key,
            template_id: env_var("PERSONA_INQUIRY_TEMPLATE_ID"),
            hosted_flow_base: env_var_or(
                "PERSONA_HOSTED_FLOW_BASE_URL",
                "https://inquiry.withpersona.com/inquiry",
            )
            .trim_end_matches('/')
            .to_string(),
        })
    }

    /// Creates a configuration with explicit values, for tests and tools.
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            template_id: None,
            hosted_flow_base: "https://inquiry.withpersona.com/inquiry".to_string(),
        }
    }

    /// Sets the inquiry template id.
    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    /// Sets the hosted flow base URL.
    pub fn with_hosted_flow_base(mut self, base: impl Into<String>) -> Self {
        self.hosted_flow_base = base.into().trim_end_matches('/').to_string();
        self
    }
}
