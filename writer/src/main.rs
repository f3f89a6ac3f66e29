use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use bataudit_writer::handlers::{health, ingest};
use bataudit_writer::AppState;
use common_audit_queue::{AuditQueue, RedisQueue};
use common_observability::AuditMetrics;
use tracing::info;

fn env_or(primary: &str, legacy: &str, default: &str) -> String {
    std::env::var(primary)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var(legacy).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let redis_address = env_or("REDIS_ADDRESS", "BATAUDIT_REDIS_ADDRESS", "localhost:6379");
    let queue_name = env_or("QUEUE_NAME", "BATAUDIT_QUEUE_NAME", common_audit_queue::DEFAULT_QUEUE_NAME);
    let port: u16 = env_or("API_WRITER_PORT", "BATAUDIT_API_WRITER_PORT", "8081")
        .parse()
        .context("API_WRITER_PORT must be a valid port number")?;

    let queue: Arc<dyn AuditQueue> = Arc::new(
        RedisQueue::new(&redis_address, &queue_name)
            .await
            .context("failed to connect to redis")?,
    );
    let metrics = Arc::new(AuditMetrics::new().context("failed to initialize metrics")?);

    let state = AppState { queue, metrics };

    let app = Router::new()
        .route("/audit", post(ingest))
        .route("/health", get(health))
        .route("/metrics", get(bataudit_writer::handlers::metrics))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    info!(port, "writer listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
