use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::warn;

use crate::{AuditQueue, QueueError};

/// Redis-list-backed queue: `RPUSH` to enqueue, `BLPOP` with a 1-second
/// timeout to dequeue, `LLEN` to probe length. Construction pings the
/// broker within a 5-second window and fails fast if it is unreachable.
#[derive(Clone)]
pub struct RedisQueue {
    manager: ConnectionManager,
    queue: String,
}

impl RedisQueue {
    pub async fn new(redis_address: &str, queue: impl Into<String>) -> Result<Self, QueueError> {
        let redis_url = if redis_address.contains("://") {
            redis_address.to_string()
        } else {
            format!("redis://{redis_address}")
        };
        let client = redis::Client::open(redis_url)
            .map_err(|e| QueueError::Broker(e.to_string()))?;

        let manager = tokio::time::timeout(Duration::from_secs(5), ConnectionManager::new(client))
            .await
            .map_err(|_| QueueError::Broker("timed out connecting to redis".into()))?
            .map_err(|e| QueueError::Broker(e.to_string()))?;

        let mut ping_conn = manager.clone();
        tokio::time::timeout(Duration::from_secs(5), async {
            redis::cmd("PING").query_async::<_, String>(&mut ping_conn).await
        })
        .await
        .map_err(|_| QueueError::Broker("ping timed out".into()))?
        .map_err(|e| QueueError::Broker(e.to_string()))?;

        Ok(Self { manager, queue: queue.into() })
    }
}

#[async_trait]
impl AuditQueue for RedisQueue {
    async fn enqueue(&self, payload: Vec<u8>) -> Result<(), QueueError> {
        let mut conn = self.manager.clone();
        conn.rpush(&self.queue, payload)
            .await
            .map_err(|e| QueueError::Broker(e.to_string()))
    }

    async fn dequeue(&self) -> Result<Option<Vec<u8>>, QueueError> {
        let mut conn = self.manager.clone();
        let result: Option<(String, Vec<u8>)> = conn
            .blpop(&self.queue, 1.0)
            .await
            .map_err(|e| QueueError::Broker(e.to_string()))?;
        Ok(result.map(|(_, payload)| payload))
    }

    async fn queue_length(&self) -> Result<i64, QueueError> {
        let mut conn = self.manager.clone();
        conn.llen(&self.queue)
            .await
            .map_err(|e| QueueError::Broker(e.to_string()))
    }

    async fn close(&self) -> Result<(), QueueError> {
        // ConnectionManager has no explicit close; dropping the last clone
        // releases the underlying connection.
        warn!(queue = %self.queue, "redis queue close requested; connection drops with last handle");
        Ok(())
    }
}
