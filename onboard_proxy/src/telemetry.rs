//! Telemetry spans and the sink seam.
//!
//! Every proxied LLM call produces one [`SpanRecord`] with token usage,
//! latency, and a summary of input and output. Sinks are fan-out: the
//! tracing sink is always on, the HTTP sink posts spans to an
//! observability backend when configured. Sink failures are counted and
//! logged by the caller, never propagated to the proxied request.

use crate::config::TelemetryConfig;
use crate::metrics::{MetricKind, ProxyMetrics};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Metrics attached to a telemetry span.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpanMetrics {
    /// Prompt tokens consumed
    pub prompt_tokens: u64,
    /// Completion tokens generated
    pub completion_tokens: u64,
    /// Total tokens
    pub total_tokens: u64,
    /// Wall-clock duration of the upstream call
    pub duration_ms: f64,
}

impl SpanMetrics {
    /// Extracts token counts from an OpenAI-style `usage` object.
    ///
    /// Absent or malformed fields count as zero.
    pub fn from_usage(body: &Value, duration: Duration) -> Self {
        let usage = body.get("usage");
        let token = |key: &str| {
            usage
                .and_then(|u| u.get(key))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };
        Self {
            prompt_tokens: token("prompt_tokens"),
            completion_tokens: token("completion_tokens"),
            total_tokens: token("total_tokens"),
            duration_ms: duration.as_secs_f64() * 1000.0,
        }
    }
}

/// One proxied LLM call, as recorded to the sinks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpanRecord {
    /// Span name ("Chat Completion", "Streaming Chat Completion", "Embeddings")
    pub name: String,
    /// Model the call was routed to
    pub model: Option<String>,
    /// Request input (messages, or a summary for embedding batches)
    pub input: Option<Value>,
    /// Generated output, or a summary for embeddings
    pub output: Option<String>,
    /// Usage and latency
    pub metrics: SpanMetrics,
    /// Free-form metadata (provider, stream flag, sampling parameters)
    pub metadata: Value,
}

/// Seam over telemetry backends, for the routes and test doubles.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Records one span.
    async fn record(&self, span: &SpanRecord) -> Result<()>;
}

/// Sink that logs spans through `tracing`.
pub struct TracingSink;

#[async_trait]
impl TelemetrySink for TracingSink {
    async fn record(&self, span: &SpanRecord) -> Result<()> {
        tracing::info!(
            name = %span.name,
            model = span.model.as_deref().unwrap_or("-"),
            prompt_tokens = span.metrics.prompt_tokens,
            completion_tokens = span.metrics.completion_tokens,
            total_tokens = span.metrics.total_tokens,
            duration_ms = span.metrics.duration_ms,
            "llm call"
        );
        Ok(())
    }
}

/// Sink that posts spans to the observability backend's REST API.
pub struct HttpSink {
    http: reqwest::Client,
    config: TelemetryConfig,
}

impl HttpSink {
    /// Creates a new HTTP sink.
    pub fn new(config: TelemetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    async fn record(&self, span: &SpanRecord) -> Result<()> {
        let url = format!("{}/project_logs", self.config.api_base);
        let body = serde_json::json!({
            "project": self.config.project,
            "events": [span],
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        resp.error_for_status()?;
        Ok(())
    }
}

/// Fans a span out to every sink, absorbing failures.
pub async fn record_span(sinks: &[std::sync::Arc<dyn TelemetrySink>], metrics: &ProxyMetrics, span: SpanRecord) {
    for sink in sinks {
        if let Err(err) = sink.record(&span).await {
            metrics.record(MetricKind::TelemetryFailure);
            tracing::warn!("Telemetry sink failed: {err}");
        }
    }
}

/// Incremental parser for an OpenAI-style SSE completion stream.
///
/// Feeds raw passthrough bytes, accumulates the assistant content from
/// `choices[0].delta.content` across `data:` events. Partial lines are
/// buffered until their newline arrives.
#[derive(Default)]
pub struct SseCollector {
    pending: String,
    content: String,
    chunks: u64,
}

impl SseCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk of stream bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.pending.push_str(&String::from_utf8_lossy(bytes));

        while let Some(newline) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=newline).collect();
            self.consume_line(line.trim_end());
        }
    }

    fn consume_line(&mut self, line: &str) {
        let Some(data) = line.strip_prefix("data: ") else {
            return;
        };
        if data == "[DONE]" {
            return;
        }
        let Ok(event) = serde_json::from_str::<Value>(data) else {
            return;
        };
        self.chunks += 1;
        if let Some(delta) = event
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("delta"))
            .and_then(|d| d.get("content"))
            .and_then(Value::as_str)
        {
            self.content.push_str(delta);
        }
    }

    /// Returns the accumulated assistant content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the number of data events seen.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }
}
