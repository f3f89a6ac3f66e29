use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bataudit_worker::{WorkerConfig, WorkerPool};
use common_audit_queue::{AuditQueue, RedisQueue};
use common_audit_store::{AuditRepository, AuditStore};
use common_observability::AuditMetrics;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const BOOT_BACKOFFS: [u64; 5] = [2, 4, 8, 16, 32];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = WorkerConfig::from_env();
    let metrics = Arc::new(AuditMetrics::new().context("failed to initialize metrics")?);

    let queue: Arc<dyn AuditQueue> = Arc::new(connect_queue(&config).await?);

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pg_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("failed to connect to postgres")?;
    let store: Arc<dyn AuditStore> = Arc::new(AuditRepository::new(pg_pool));

    let token = CancellationToken::new();
    let shutdown_token = token.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        shutdown_token.cancel();
    });

    let pool = WorkerPool::new(config, queue, store, metrics, token);
    pool.start().await;

    Ok(())
}

/// Connects to Redis with exponential backoff (2, 4, 8, 16, 32s) before
/// giving up; this is distinct from the fixed 2s spacing used between
/// persistence retries once the pool is running.
async fn connect_queue(config: &WorkerConfig) -> anyhow::Result<RedisQueue> {
    let mut last_err = None;
    for (attempt, delay) in std::iter::once(0).chain(BOOT_BACKOFFS).enumerate() {
        if attempt > 0 {
            warn!(attempt, delay_secs = delay, "retrying redis connection");
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
        match RedisQueue::new(&config.redis_address, &config.queue_name).await {
            Ok(q) => return Ok(q),
            Err(e) => last_err = Some(e),
        }
    }
    Err(anyhow::anyhow!("could not connect to redis after {} attempts: {:?}", BOOT_BACKOFFS.len() + 1, last_err))
}
