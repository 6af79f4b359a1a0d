//! Proxy server binary.

use anyhow::Result;
use onboard_proxy::{
    router, AppState, HttpSink, ProxyConfig, ProxyMetrics, TelemetrySink, TracingSink, Upstream,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("onboard_proxy=info")),
        )
        .init();

    let config = ProxyConfig::from_env()?;
    let upstream = Upstream::new(config.upstream.clone())?;

    let mut sinks: Vec<Arc<dyn TelemetrySink>> = vec![Arc::new(TracingSink)];
    match &config.telemetry {
        Some(telemetry) => {
            tracing::info!(project = %telemetry.project, "Telemetry backend configured");
            sinks.push(Arc::new(HttpSink::new(telemetry.clone())?));
        }
        None => {
            tracing::info!("No telemetry backend configured, logging spans locally only");
        }
    }

    let state = AppState {
        upstream: Arc::new(upstream),
        sinks: Arc::new(sinks),
        metrics: Arc::new(ProxyMetrics::new()),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Proxy listening on {addr}");
    axum::Server::bind(&addr)
        .serve(router(state).into_make_service())
        .await?;

    Ok(())
}
