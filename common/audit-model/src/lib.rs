mod http_method;
mod model;
pub mod validation;

pub use http_method::HttpMethod;
pub use model::{Audit, AuditSummary};

use serde::Serialize;

/// `{field, value, tag, param, message}` — the shape every validation
/// failure is reported in on the ingestion endpoint's 400 response.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDiagnostic {
    pub field: String,
    pub value: String,
    pub tag: String,
    pub param: String,
    pub message: String,
}
