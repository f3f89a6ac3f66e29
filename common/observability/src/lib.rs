use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Shared metrics surface for the writer and worker binaries. Each process
/// owns its own `Registry`; there is no process-global registry.
#[derive(Clone)]
pub struct AuditMetrics {
    registry: Registry,
    ingest_requests: IntCounterVec,
    queue_depth: IntGauge,
    active_workers: IntGauge,
    scale_events: IntCounterVec,
    dequeue_outcomes: IntCounterVec,
    persist_attempts: IntCounterVec,
    persist_latency_seconds: Histogram,
}

impl AuditMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let ingest_requests = IntCounterVec::new(
            Opts::new("audit_ingest_requests_total", "Ingestion requests by outcome"),
            &["status"],
        )?;
        let queue_depth =
            IntGauge::with_opts(Opts::new("audit_queue_depth", "Last observed queue length"))?;
        let active_workers = IntGauge::with_opts(Opts::new(
            "audit_active_workers",
            "Current number of running workers",
        ))?;
        let scale_events = IntCounterVec::new(
            Opts::new("audit_scale_events_total", "Autoscale decisions by direction"),
            &["direction"],
        )?;
        let dequeue_outcomes = IntCounterVec::new(
            Opts::new("audit_dequeue_outcomes_total", "Dequeue attempts by outcome"),
            &["outcome"],
        )?;
        let persist_attempts = IntCounterVec::new(
            Opts::new("audit_persist_attempts_total", "Persistence attempts by outcome"),
            &["outcome"],
        )?;
        let persist_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "audit_persist_latency_seconds",
                "Time spent persisting one audit event (seconds)",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        )?;

        registry.register(Box::new(ingest_requests.clone()))?;
        registry.register(Box::new(queue_depth.clone()))?;
        registry.register(Box::new(active_workers.clone()))?;
        registry.register(Box::new(scale_events.clone()))?;
        registry.register(Box::new(dequeue_outcomes.clone()))?;
        registry.register(Box::new(persist_attempts.clone()))?;
        registry.register(Box::new(persist_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            ingest_requests,
            queue_depth,
            active_workers,
            scale_events,
            dequeue_outcomes,
            persist_attempts,
            persist_latency_seconds,
        })
    }

    pub fn record_ingest(&self, status: &str) {
        self.ingest_requests.with_label_values(&[status]).inc();
    }

    pub fn set_queue_depth(&self, depth: i64) {
        self.queue_depth.set(depth);
    }

    pub fn set_active_workers(&self, count: i64) {
        self.active_workers.set(count);
    }

    pub fn record_scale_event(&self, direction: &str) {
        self.scale_events.with_label_values(&[direction]).inc();
    }

    pub fn record_dequeue(&self, outcome: &str) {
        self.dequeue_outcomes.with_label_values(&[outcome]).inc();
    }

    pub fn record_persist_attempt(&self, outcome: &str) {
        self.persist_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn observe_persist_latency(&self, secs: f64) {
        self.persist_latency_seconds.observe(secs);
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"))
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
