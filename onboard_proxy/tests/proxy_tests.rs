//! End-to-end proxy tests against an in-process fake upstream.

use async_trait::async_trait;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use onboard_proxy::{
    router, AppState, MetricKind, ProxyMetrics, SpanRecord, TelemetrySink, Upstream,
    UpstreamConfig,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sink double that captures spans in memory.
#[derive(Default)]
struct CapturingSink {
    spans: Mutex<Vec<SpanRecord>>,
}

impl CapturingSink {
    fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetrySink for CapturingSink {
    async fn record(&self, span: &SpanRecord) -> onboard_proxy::Result<()> {
        self.spans.lock().unwrap().push(span.clone());
        Ok(())
    }
}

/// Sink double that always fails.
struct FailingSink;

#[async_trait]
impl TelemetrySink for FailingSink {
    async fn record(&self, _span: &SpanRecord) -> onboard_proxy::Result<()> {
        Err(onboard_proxy::ProxyError::Upstream(
            "sink offline".to_string(),
        ))
    }
}

async fn spawn(app: Router) -> SocketAddr {
    let server = axum::Server::bind(&"127.0.0.1:0".parse().unwrap())
        .serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

fn fake_upstream() -> Router {
    Router::new()
        .route(
            "/models",
            get(|| async {
                Json(json!({"data": [{"id": "openai/gpt-4o"}, {"id": "openai/gpt-3.5-turbo"}]}))
            }),
        )
        .route(
            "/chat/completions",
            post(|Json(payload): Json<Value>| async move {
                if payload.get("stream").and_then(Value::as_bool).unwrap_or(false) {
                    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n\
                                data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n\
                                data: [DONE]\n\n";
                    return (
                        [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
                        body,
                    )
                        .into_response();
                }
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Hi there"}}],
                    "usage": {"prompt_tokens": 7, "completion_tokens": 2, "total_tokens": 9}
                }))
                .into_response()
            }),
        )
        .route(
            "/embeddings",
            post(|| async {
                Json(json!({
                    "data": [{"embedding": [0.1, 0.2]}, {"embedding": [0.3, 0.4]}],
                    "usage": {"total_tokens": 5}
                }))
            }),
        )
}

struct Harness {
    base: String,
    sink: Arc<CapturingSink>,
    metrics: Arc<ProxyMetrics>,
    http: reqwest::Client,
}

async fn harness(extra_sink: Option<Arc<dyn TelemetrySink>>) -> Harness {
    let upstream_addr = spawn(fake_upstream()).await;
    let upstream = Upstream::new(UpstreamConfig::new(
        format!("http://{upstream_addr}"),
        "sk-or-test",
    ))
    .unwrap();

    let sink = Arc::new(CapturingSink::default());
    let mut sinks: Vec<Arc<dyn TelemetrySink>> = vec![sink.clone()];
    if let Some(extra) = extra_sink {
        sinks.push(extra);
    }
    let metrics = Arc::new(ProxyMetrics::new());

    let state = AppState {
        upstream: Arc::new(upstream),
        sinks: Arc::new(sinks),
        metrics: metrics.clone(),
    };
    let proxy_addr = spawn(router(state)).await;

    Harness {
        base: format!("http://{proxy_addr}"),
        sink,
        metrics,
        http: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn test_health() {
    let h = harness(None).await;
    let body: Value = h
        .http
        .get(format!("{}/health", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_models_forwarded() {
    let h = harness(None).await;
    let body: Value = h
        .http
        .get(format!("{}/v1/models", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(h.metrics.count(MetricKind::ModelsRequest), 1);
}

#[tokio::test]
async fn test_chat_completion_logs_span() {
    let h = harness(None).await;
    let body: Value = h
        .http
        .post(format!("{}/v1/chat/completions", h.base))
        .json(&json!({
            "model": "openai/gpt-4o",
            "messages": [{"role": "user", "content": "hello"}],
            "temperature": 0.2
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["choices"][0]["message"]["content"], "Hi there");

    let spans = h.sink.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "Chat Completion");
    assert_eq!(spans[0].model.as_deref(), Some("openai/gpt-4o"));
    assert_eq!(spans[0].output.as_deref(), Some("Hi there"));
    assert_eq!(spans[0].metrics.total_tokens, 9);
    assert_eq!(h.metrics.count(MetricKind::ChatRequest), 1);
}

#[tokio::test]
async fn test_streaming_passthrough() {
    let h = harness(None).await;
    let resp = h
        .http
        .post(format!("{}/v1/chat/completions", h.base))
        .json(&json!({
            "model": "openai/gpt-4o",
            "messages": [{"role": "user", "content": "hello"}],
            "stream": true
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(
        resp.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );
    let body = resp.text().await.unwrap();
    assert!(body.contains("data: [DONE]"));

    // The span is recorded after the relay finishes
    let mut spans = h.sink.spans();
    for _ in 0..50 {
        if !spans.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        spans = h.sink.spans();
    }
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "Streaming Chat Completion");
    assert_eq!(spans[0].output.as_deref(), Some("Hi there"));
    assert_eq!(h.metrics.count(MetricKind::ChatStreamRequest), 1);
}

#[tokio::test]
async fn test_embeddings_logs_span() {
    let h = harness(None).await;
    let body: Value = h
        .http
        .post(format!("{}/v1/embeddings", h.base))
        .json(&json!({
            "model": "text-embedding-ada-002",
            "input": ["first", "second", "third"]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let spans = h.sink.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "Embeddings");
    assert_eq!(
        spans[0].input.as_ref().and_then(Value::as_str),
        Some("[3 texts]")
    );
    assert_eq!(spans[0].output.as_deref(), Some("[2 embeddings]"));
    assert_eq!(spans[0].metrics.total_tokens, 5);
}

#[tokio::test]
async fn test_sink_failure_does_not_fail_request() {
    let h = harness(Some(Arc::new(FailingSink))).await;
    let resp = h
        .http
        .post(format!("{}/v1/chat/completions", h.base))
        .json(&json!({"messages": [{"role": "user", "content": "hello"}]}))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(h.metrics.count(MetricKind::TelemetryFailure), 1);
    // The capturing sink still got its copy
    assert_eq!(h.sink.spans().len(), 1);
}

#[tokio::test]
async fn test_unreachable_upstream_maps_to_proxy_error() {
    // Point at a port nothing listens on
    let upstream = Upstream::new(UpstreamConfig::new("http://127.0.0.1:1", "sk-or-test")).unwrap();
    let metrics = Arc::new(ProxyMetrics::new());
    let state = AppState {
        upstream: Arc::new(upstream),
        sinks: Arc::new(vec![]),
        metrics: metrics.clone(),
    };
    let addr = spawn(router(state)).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/chat/completions"))
        .json(&json!({"messages": []}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["type"], "proxy_error");
    assert_eq!(metrics.count(MetricKind::UpstreamError), 1);
}
