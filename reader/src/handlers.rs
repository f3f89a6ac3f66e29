use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use common_audit_store::AuditRepository;
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AppState {
    pub store: AuditRepository,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default = "default_page")]
    page: i64,
}

fn default_limit() -> i64 {
    20
}

fn default_page() -> i64 {
    1
}

#[derive(Serialize)]
struct Pagination {
    page: i64,
    #[serde(rename = "totalPage")]
    total_page: i64,
    limit: i64,
    #[serde(rename = "totalItems")]
    total_items: i64,
}

#[derive(Serialize)]
struct ListResponse {
    data: Vec<common_audit_model::AuditSummary>,
    pagination: Pagination,
}

pub async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<impl IntoResponse> {
    let limit = q.limit.clamp(1, 500);
    let page = q.page.max(1);
    let offset = (page - 1) * limit;

    let page_result = state.store.list(limit, offset).await.map_err(ApiError::internal)?;
    let total_page = if page_result.total_items == 0 {
        0
    } else {
        (page_result.total_items + limit - 1) / limit
    };

    Ok(Json(ListResponse {
        data: page_result.data,
        pagination: Pagination { page, total_page, limit, total_items: page_result.total_items },
    }))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let audit = state
        .store
        .get_by_id(&id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound { resource: "audit" })?;
    Ok(Json(audit))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
