mod in_memory;
mod redis_queue;

pub use in_memory::InMemoryQueue;
pub use redis_queue::RedisQueue;

use async_trait::async_trait;

pub const DEFAULT_QUEUE_NAME: &str = "bataudit:events";

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("broker error: {0}")]
    Broker(String),
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Producer/consumer contract shared by the writer and the worker pool.
/// `RedisQueue` is the production backend; `InMemoryQueue` stands in for
/// tests and for any caller that does not need a live broker.
#[async_trait]
pub trait AuditQueue: Send + Sync {
    /// Append `payload` to the tail of the queue. At-least-once: once this
    /// returns `Ok`, the item is durable; no ordering guarantee relative to
    /// other enqueues is implied.
    async fn enqueue(&self, payload: Vec<u8>) -> Result<(), QueueError>;

    /// Block on the head of the queue for up to one second. `Ok(None)`
    /// means the queue was empty when the wait elapsed, not an error.
    async fn dequeue(&self) -> Result<Option<Vec<u8>>, QueueError>;

    /// Advisory length probe; may be stale by the time the caller acts on it.
    async fn queue_length(&self) -> Result<i64, QueueError>;

    /// Release the underlying broker connection.
    async fn close(&self) -> Result<(), QueueError>;
}
