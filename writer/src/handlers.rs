use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use common_audit_model::Audit;
use common_audit_sanitize::{detect_sensitive_data, mask_sensitive_data, sanitize_audit};
use common_http_errors::{ApiError, ApiResult, FieldDiagnostic};
use serde::Serialize;
use validator::Validate;

use crate::state::AppState;

#[derive(Serialize)]
struct IngestAccepted {
    message: &'static str,
    status: &'static str,
    audit_id: String,
    request_id: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// `POST /audit` — decode, default, sanitize, mask, validate, enqueue.
/// Order matters: sanitization and masking must run before validation so
/// a masked/sanitized value is what gets checked (and ultimately stored).
pub async fn ingest(State(state): State<AppState>, body: axum::body::Bytes) -> ApiResult<impl IntoResponse> {
    let mut audit: Audit = serde_json::from_slice(&body).map_err(|e| {
        state.metrics.record_ingest("malformed_json");
        ApiError::MalformedJson { details: e.to_string() }
    })?;

    audit.default_timestamp_if_zero();
    sanitize_audit(&mut audit);
    if detect_sensitive_data(&audit) {
        mask_sensitive_data(&mut audit);
    }

    if let Err(errors) = audit.validate() {
        state.metrics.record_ingest("validation_failed");
        let diagnostics = common_audit_model::validation::format_validation_errors(&errors)
            .into_iter()
            .map(|d| FieldDiagnostic { field: d.field, value: d.value, tag: d.tag, param: d.param, message: d.message })
            .collect();
        return Err(ApiError::ValidationFailed { diagnostics });
    }

    audit.assign_identity_if_missing();

    let payload = serde_json::to_vec(&audit).map_err(ApiError::internal)?;
    match tokio::time::timeout(Duration::from_secs(5), state.queue.enqueue(payload)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            state.metrics.record_ingest("broker_failure");
            return Err(ApiError::BrokerFailure { message: e.to_string() });
        }
        Err(_) => {
            state.metrics.record_ingest("broker_failure");
            return Err(ApiError::BrokerFailure { message: "enqueue timed out".into() });
        }
    }

    state.metrics.record_ingest("accepted");
    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(IngestAccepted {
            message: "Audit received and will be processed",
            status: "success",
            audit_id: audit.id,
            request_id: audit.request_id,
            timestamp: audit.timestamp,
        }),
    ))
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    queue_depth: Option<i64>,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let queue_depth = state.queue.queue_length().await.ok();
    Json(HealthBody { status: "ok", queue_depth })
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(resp) => resp,
        Err(e) => ApiError::internal(e).into_response(),
    }
}
