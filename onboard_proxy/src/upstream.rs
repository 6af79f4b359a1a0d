//! HTTP client for the upstream LLM aggregator.
//!
//! Requests are forwarded with their JSON bodies unchanged so unknown
//! parameters pass through. Only a connect timeout is set: streamed
//! completions hold the response open for as long as the model generates.

use crate::config::UpstreamConfig;
use crate::{ProxyError, Result};
use serde_json::Value;
use std::time::Duration;

/// Client for the upstream aggregator's OpenAI-compatible API.
#[derive(Clone, Debug)]
pub struct Upstream {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl Upstream {
    /// Creates a new upstream client.
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, config })
    }

    /// Forwards a chat completion request, streaming or not.
    pub async fn chat_completions(&self, payload: &Value) -> Result<reqwest::Response> {
        self.post("chat/completions", payload).await
    }

    /// Forwards an embeddings request.
    pub async fn embeddings(&self, payload: &Value) -> Result<reqwest::Response> {
        self.post("embeddings", payload).await
    }

    /// Fetches the aggregator's model list.
    pub async fn models(&self) -> Result<reqwest::Response> {
        let url = format!("{}/models", self.config.api_base);
        self.http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.config.api_base, path);
        self.http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))
    }
}
