//! HTTP surface of the proxy.
//!
//! All routes are OpenAI-compatible and forward to the upstream
//! aggregator. Chat and embedding handlers measure the call, extract
//! usage, and fan a span out to the telemetry sinks before relaying the
//! upstream body with its original status.

use crate::metrics::{MetricKind, ProxyMetrics};
use crate::telemetry::{record_span, SpanMetrics, SpanRecord, SseCollector, TelemetrySink};
use crate::upstream::Upstream;
use crate::{ProxyError, Result};
use axum::body::{Bytes, StreamBody};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    /// Upstream aggregator client
    pub upstream: Arc<Upstream>,
    /// Telemetry sinks, fanned out per call
    pub sinks: Arc<Vec<Arc<dyn TelemetrySink>>>,
    /// Request and failure counters
    pub metrics: Arc<ProxyMetrics>,
}

/// Builds the proxy router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/models", get(models))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/embeddings", post(embeddings))
        .with_state(state)
}

/// Health check.
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({"status": "ok", "service": "onboard-proxy"}))
}

async fn models(State(state): State<AppState>) -> Result<Response> {
    state.metrics.record(MetricKind::ModelsRequest);
    let resp = track_upstream(&state, state.upstream.models().await)?;
    relay_json(resp).await
}

async fn chat_completions(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Response> {
    let model = payload
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("openai/gpt-3.5-turbo")
        .to_string();
    let streaming = payload
        .get("stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if streaming {
        state.metrics.record(MetricKind::ChatStreamRequest);
        return stream_chat(state, payload, model).await;
    }
    state.metrics.record(MetricKind::ChatRequest);

    let start = Instant::now();
    let resp = track_upstream(&state, state.upstream.chat_completions(&payload).await)?;
    let status = relay_status(resp.status());
    let body: Value = resp.json().await?;

    let output = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(|s| s.to_string());

    let span = SpanRecord {
        name: "Chat Completion".to_string(),
        model: Some(model.clone()),
        input: payload.get("messages").cloned(),
        output,
        metrics: SpanMetrics::from_usage(&body, start.elapsed()),
        metadata: serde_json::json!({
            "model": model,
            "temperature": payload.get("temperature"),
            "max_tokens": payload.get("max_tokens"),
            "provider": "openrouter",
        }),
    };
    record_span(&state.sinks, &state.metrics, span).await;

    Ok((status, Json(body)).into_response())
}

/// Streaming passthrough: upstream SSE bytes are relayed unchanged while
/// a collector accumulates the content for one span at end of stream.
async fn stream_chat(state: AppState, payload: Value, model: String) -> Result<Response> {
    let start = Instant::now();
    let resp = track_upstream(&state, state.upstream.chat_completions(&payload).await)?;
    let status = relay_status(resp.status());

    let (tx, rx) = unbounded::<std::result::Result<Bytes, std::io::Error>>();
    tokio::spawn(pump_stream(resp, tx, state, payload, model, start));

    Ok((
        status,
        [(header::CONTENT_TYPE, "text/event-stream")],
        StreamBody::new(rx),
    )
        .into_response())
}

async fn pump_stream(
    resp: reqwest::Response,
    tx: UnboundedSender<std::result::Result<Bytes, std::io::Error>>,
    state: AppState,
    payload: Value,
    model: String,
    start: Instant,
) {
    let mut upstream = resp.bytes_stream();
    let mut collector = SseCollector::new();

    while let Some(chunk) = upstream.next().await {
        match chunk {
            Ok(bytes) => {
                collector.feed(&bytes);
                if tx.unbounded_send(Ok(bytes)).is_err() {
                    // Client went away; stop relaying but still log the span
                    break;
                }
            }
            Err(err) => {
                state.metrics.record(MetricKind::UpstreamError);
                tracing::warn!("Upstream stream failed: {err}");
                let event = serde_json::json!({"error": err.to_string()});
                let _ = tx.unbounded_send(Ok(Bytes::from(format!("data: {event}\n\n"))));
                break;
            }
        }
    }

    let span = SpanRecord {
        name: "Streaming Chat Completion".to_string(),
        model: Some(model.clone()),
        input: payload.get("messages").cloned(),
        output: Some(collector.content().to_string()),
        metrics: SpanMetrics {
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            ..SpanMetrics::default()
        },
        metadata: serde_json::json!({
            "model": model,
            "stream": true,
            "chunks": collector.chunks(),
        }),
    };
    record_span(&state.sinks, &state.metrics, span).await;
}

async fn embeddings(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Response> {
    state.metrics.record(MetricKind::EmbeddingRequest);
    let model = payload
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("text-embedding-ada-002")
        .to_string();

    let start = Instant::now();
    let resp = track_upstream(&state, state.upstream.embeddings(&payload).await)?;
    let status = relay_status(resp.status());
    let body: Value = resp.json().await?;

    let input = match payload.get("input") {
        Some(Value::String(text)) => Some(Value::String(text.clone())),
        Some(Value::Array(texts)) => Some(Value::String(format!("[{} texts]", texts.len()))),
        _ => None,
    };
    let embeddings = body
        .get("data")
        .and_then(Value::as_array)
        .map_or(0, |d| d.len());

    let span = SpanRecord {
        name: "Embeddings".to_string(),
        model: Some(model.clone()),
        input,
        output: Some(format!("[{embeddings} embeddings]")),
        metrics: SpanMetrics::from_usage(&body, start.elapsed()),
        metadata: serde_json::json!({"model": model, "provider": "openrouter"}),
    };
    record_span(&state.sinks, &state.metrics, span).await;

    Ok((status, Json(body)).into_response())
}

/// Counts a failed upstream call before propagating it.
fn track_upstream<T>(state: &AppState, result: Result<T>) -> Result<T> {
    if matches!(result, Err(ProxyError::Upstream(_))) {
        state.metrics.record(MetricKind::UpstreamError);
    }
    result
}

/// Relays an upstream JSON response with its original status.
async fn relay_json(resp: reqwest::Response) -> Result<Response> {
    let status = relay_status(resp.status());
    let body: Value = resp.json().await?;
    Ok((status, Json(body)).into_response())
}

/// Converts the upstream status for the relayed response.
fn relay_status(status: reqwest::StatusCode) -> StatusCode {
    StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
}
