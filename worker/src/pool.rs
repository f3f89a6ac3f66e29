use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common_audit_model::Audit;
use common_audit_queue::AuditQueue;
use common_audit_store::AuditStore;
use common_observability::AuditMetrics;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::autoscale::{evaluate_target, is_emergency};
use crate::config::WorkerConfig;

struct PoolState {
    active_workers: u32,
    worker_channels: HashMap<u64, mpsc::Sender<()>>,
    last_scale_time: Instant,
}

/// Owns the shared pool state (`active_workers`, `worker_channels`,
/// `last_scale_time`) behind one mutex, plus the queue/store/metrics
/// handles every worker and the monitor task share read-only.
pub struct WorkerPool {
    state: Mutex<PoolState>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    config: WorkerConfig,
    queue: Arc<dyn AuditQueue>,
    store: Arc<dyn AuditStore>,
    metrics: Arc<AuditMetrics>,
    token: CancellationToken,
}

impl WorkerPool {
    pub fn new(
        config: WorkerConfig,
        queue: Arc<dyn AuditQueue>,
        store: Arc<dyn AuditStore>,
        metrics: Arc<AuditMetrics>,
        token: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PoolState {
                active_workers: 0,
                worker_channels: HashMap::new(),
                last_scale_time: Instant::now(),
            }),
            handles: Mutex::new(Vec::new()),
            config,
            queue,
            store,
            metrics,
            token,
        })
    }

    /// Launches the monitor, scales to the initial worker count, and blocks
    /// until every task (monitor plus every worker ever spawned) exits.
    pub async fn start(self: &Arc<Self>) {
        info!(initial = self.config.initial_worker_count, queue = self.config.queue_name, "starting worker pool");

        self.scale_to(self.config.initial_worker_count).await;

        let monitor = {
            let pool = self.clone();
            tokio::spawn(async move { pool.monitor_loop().await })
        };
        let _ = monitor.await;

        let handles = std::mem::take(&mut *self.handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
        info!("all workers have stopped");
    }

    pub async fn active_workers(&self) -> u32 {
        self.state.lock().await.active_workers
    }

    /// Drops a worker's bookkeeping on its own exit from the root
    /// cancellation branch — `scale_to` never runs for this id since the
    /// shutdown path bypasses it entirely, so the pool must account for
    /// the departure itself or `active_workers` never reaches zero (P7).
    async fn retire(&self, id: u64) {
        let mut guard = self.state.lock().await;
        guard.worker_channels.remove(&id);
        guard.active_workers = guard.active_workers.saturating_sub(1);
    }

    async fn scale_to(self: &Arc<Self>, target: u32) {
        let target = target.clamp(self.config.min_worker_count, self.config.max_worker_count);
        let mut guard = self.state.lock().await;
        if target == guard.active_workers {
            return;
        }

        if target > guard.active_workers {
            let mut next_id = guard.worker_channels.keys().copied().max().map(|m| m + 1).unwrap_or(0);
            let mut to_spawn = Vec::new();
            for _ in guard.active_workers..target {
                let (tx, rx) = mpsc::channel(1);
                guard.worker_channels.insert(next_id, tx);
                to_spawn.push((next_id, rx));
                next_id += 1;
            }
            let from = guard.active_workers;
            guard.active_workers = target;
            guard.last_scale_time = Instant::now();
            drop(guard);

            info!(from, to = target, "scaling up");
            let mut handles = self.handles.lock().await;
            for (id, rx) in to_spawn {
                let pool = self.clone();
                handles.push(tokio::spawn(async move { pool.run_worker(id, rx).await }));
            }
        } else {
            if guard.active_workers <= self.config.min_worker_count {
                return;
            }
            let to_remove = (guard.active_workers - target) as usize;
            let ids: Vec<u64> = guard.worker_channels.keys().take(to_remove).copied().collect();
            info!(from = guard.active_workers, to = target, ?ids, "scaling down");
            for id in ids {
                if let Some(tx) = guard.worker_channels.remove(&id) {
                    let _ = tx.try_send(());
                }
            }
            guard.active_workers -= to_remove as u32;
            guard.last_scale_time = Instant::now();
        }
    }

    async fn monitor_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    info!("monitor observed shutdown");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let queue_len = match tokio::time::timeout(Duration::from_secs(2), self.queue.queue_length()).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    warn!(error = %e, "queue length probe failed");
                    continue;
                }
                Err(_) => {
                    warn!("queue length probe timed out");
                    continue;
                }
            };
            self.metrics.set_queue_depth(queue_len);

            let active = self.active_workers().await;
            self.metrics.set_active_workers(active as i64);

            if !self.config.enable_autoscaling {
                info!(queue_len, active_workers = active, "autoscaling disabled, status only");
                continue;
            }

            let emergency = is_emergency(queue_len, active, &self.config);
            let in_cooldown = self.state.lock().await.last_scale_time.elapsed() < self.config.cooldown_period;

            if in_cooldown && !emergency {
                debug!(queue_len, active_workers = active, "scaling suppressed by cooldown");
                continue;
            }

            if let Some(target) = evaluate_target(queue_len, active, &self.config) {
                let direction = match (target > active, emergency) {
                    (true, true) => "emergency",
                    (true, false) => "up",
                    (false, _) => "down",
                };
                self.metrics.record_scale_event(direction);
                self.scale_to(target).await;
            }
        }
    }

    async fn run_worker(self: Arc<Self>, id: u64, mut stop_rx: mpsc::Receiver<()>) {
        info!(worker_id = id, "worker started");
        let mut ticker = tokio::time::interval(self.config.poll_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    self.retire(id).await;
                    info!(worker_id = id, "worker stopped (shutdown)");
                    return;
                }
                _ = stop_rx.recv() => {
                    info!(worker_id = id, "worker stopped (scale down)");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let dequeued = tokio::time::timeout(Duration::from_secs(1), self.queue.dequeue()).await;
            let payload = match dequeued {
                Ok(Ok(Some(p))) => p,
                Ok(Ok(None)) => {
                    self.metrics.record_dequeue("timeout");
                    continue;
                }
                Ok(Err(e)) => {
                    warn!(worker_id = id, error = %e, "dequeue error");
                    self.metrics.record_dequeue("error");
                    continue;
                }
                Err(_) => {
                    // child dequeue deadline exceeded: identical to an empty queue.
                    self.metrics.record_dequeue("timeout");
                    continue;
                }
            };
            self.metrics.record_dequeue("hit");

            let remaining = self.queue.queue_length().await.ok();
            debug!(worker_id = id, remaining = ?remaining, "dequeued item");

            let event: Audit = match serde_json::from_slice(&payload) {
                Ok(e) => e,
                Err(e) => {
                    warn!(worker_id = id, error = %e, "poison payload dropped");
                    continue;
                }
            };

            if self.persist_with_retry(id, &event).await {
                self.metrics.record_persist_attempt("success");
            } else {
                self.metrics.record_persist_attempt("exhausted");
                error!(worker_id = id, audit_id = %event.id, attempts = self.config.max_retries, "failed to persist event");
            }
        }
    }

    async fn persist_with_retry(&self, worker_id: u64, event: &Audit) -> bool {
        for attempt in 0..self.config.max_retries {
            let start = Instant::now();
            match self.store.create(event).await {
                Ok(()) => {
                    self.metrics.observe_persist_latency(start.elapsed().as_secs_f64());
                    info!(worker_id, audit_id = %event.id, attempt = attempt + 1, "event persisted");
                    return true;
                }
                Err(e) => {
                    warn!(worker_id, attempt = attempt + 1, error = %e, "persist attempt failed");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_audit_queue::InMemoryQueue;
    use common_audit_store::StoreError;

    struct FakeStore;

    #[async_trait::async_trait]
    impl AuditStore for FakeStore {
        async fn create(&self, _audit: &Audit) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn test_pool(min: u32, max: u32) -> Arc<WorkerPool> {
        let config = WorkerConfig {
            min_worker_count: min,
            max_worker_count: max,
            poll_duration: Duration::from_millis(20),
            ..WorkerConfig::default()
        };
        WorkerPool::new(
            config,
            Arc::new(InMemoryQueue::new()),
            Arc::new(FakeStore),
            Arc::new(AuditMetrics::new().unwrap()),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn scale_up_spawns_workers() {
        let pool = test_pool(1, 5);
        pool.scale_to(3).await;
        assert_eq!(pool.active_workers().await, 3);
    }

    #[tokio::test]
    async fn scale_down_never_drops_below_min() {
        let pool = test_pool(1, 5);
        pool.scale_to(1).await;
        pool.scale_to(0).await;
        assert_eq!(pool.active_workers().await, 1);
    }

    #[tokio::test]
    async fn cancellation_drains_active_workers_to_zero() {
        let pool = test_pool(1, 5);
        pool.scale_to(3).await;
        assert_eq!(pool.active_workers().await, 3);

        pool.token.cancel();
        // Each worker's dequeue has a 1-second timeout it may be mid-wait
        // on when cancellation fires; give every worker a chance to reach
        // its next select point and retire.
        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(pool.active_workers().await, 0);
    }
}
