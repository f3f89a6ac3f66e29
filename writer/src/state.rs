use std::sync::Arc;

use common_audit_queue::AuditQueue;
use common_observability::AuditMetrics;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn AuditQueue>,
    pub metrics: Arc<AuditMetrics>,
}
