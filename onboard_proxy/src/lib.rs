//! onboardkit proxy - logging proxy for LLM chat and embedding traffic.
//!
//! Sits between an OpenAI-compatible client and an upstream aggregator,
//! forwarding requests unchanged while recording telemetry (token usage,
//! latency, model) to configured sinks. Streaming completions are passed
//! through as raw SSE bytes and logged once the stream finishes.
//!
//! Telemetry is strictly best-effort: a sink failure is counted and logged
//! but never fails the proxied request.

pub mod config;
pub mod metrics;
pub mod routes;
pub mod telemetry;
pub mod upstream;

pub use config::{ProxyConfig, TelemetryConfig, UpstreamConfig};
pub use metrics::{MetricKind, ProxyMetrics};
pub use routes::{router, AppState};
pub use telemetry::{HttpSink, SpanMetrics, SpanRecord, TelemetrySink, TracingSink};
pub use upstream::Upstream;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error types for proxy operations.
#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    /// The upstream aggregator could not be reached
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// HTTP transport error while relaying a response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response body was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "type": "proxy_error",
            }
        });
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}
