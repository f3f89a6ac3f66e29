use anyhow::Context;
use axum::routing::get;
use axum::Router;
use bataudit_reader::handlers::{get_one, health, list};
use bataudit_reader::AppState;
use sqlx::postgres::PgPoolOptions;
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

    let port: u16 = env_or("API_READER_PORT", "BATAUDIT_API_READER_PORT", "8082")
        .parse()
        .context("API_READER_PORT must be a valid port number")?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("failed to connect to postgres")?;
    let state = AppState { store: common_audit_store::AuditRepository::new(pool) };

    let app = Router::new()
        .route("/audit", get(list))
        .route("/audit/:id", get(get_one))
        .route("/health", get(health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    info!(port, "reader listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    Ok(())
}
