use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

use crate::{AuditQueue, QueueError};

/// `VecDeque`-backed queue used in tests and by any caller that does not
/// need a live broker. `dequeue` blocks up to one second like `RedisQueue`.
#[derive(Default)]
pub struct InMemoryQueue {
    items: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self { items: Mutex::new(VecDeque::new()), notify: Notify::new() }
    }
}

#[async_trait]
impl AuditQueue for InMemoryQueue {
    async fn enqueue(&self, payload: Vec<u8>) -> Result<(), QueueError> {
        self.items.lock().unwrap().push_back(payload);
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Vec<u8>>, QueueError> {
        // Register interest before checking the queue so a concurrent
        // enqueue can't notify between the check and the wait.
        let notified = self.notify.notified();
        if let Some(item) = self.items.lock().unwrap().pop_front() {
            return Ok(Some(item));
        }
        if tokio::time::timeout(Duration::from_secs(1), notified).await.is_err() {
            return Ok(None);
        }
        Ok(self.items.lock().unwrap().pop_front())
    }

    async fn queue_length(&self) -> Result<i64, QueueError> {
        Ok(self.items.lock().unwrap().len() as i64)
    }

    async fn close(&self) -> Result<(), QueueError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_then_dequeue_round_trips() {
        let q = InMemoryQueue::new();
        q.enqueue(b"hello".to_vec()).await.unwrap();
        assert_eq!(q.queue_length().await.unwrap(), 1);
        let got = q.dequeue().await.unwrap();
        assert_eq!(got, Some(b"hello".to_vec()));
        assert_eq!(q.queue_length().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dequeue_times_out_on_empty_queue() {
        let q = InMemoryQueue::new();
        let got = q.dequeue().await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn double_enqueue_produces_two_identical_entries() {
        let q = InMemoryQueue::new();
        q.enqueue(b"same".to_vec()).await.unwrap();
        q.enqueue(b"same".to_vec()).await.unwrap();
        assert_eq!(q.queue_length().await.unwrap(), 2);
        assert_eq!(q.dequeue().await.unwrap(), Some(b"same".to_vec()));
        assert_eq!(q.dequeue().await.unwrap(), Some(b"same".to_vec()));
    }
}
