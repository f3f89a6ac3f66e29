use async_trait::async_trait;
use common_audit_model::{Audit, AuditSummary, HttpMethod};
use sqlx::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The worker's only dependency on persistence. Kept separate from the
/// reader's `list`/`get_by_id` methods (which stay inherent on
/// `AuditRepository`) so tests can substitute a fake store without a
/// live Postgres connection, the same role `AuditQueue` plays for Redis.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn create(&self, audit: &Audit) -> Result<(), StoreError>;
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn create(&self, audit: &Audit) -> Result<(), StoreError> {
        AuditRepository::create(self, audit).await
    }
}

pub struct ListPage {
    pub data: Vec<AuditSummary>,
    pub total_items: i64,
}

fn parse_method(raw: &str) -> HttpMethod {
    match raw {
        "GET" => HttpMethod::Get,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        _ => HttpMethod::Post,
    }
}

/// Postgres-backed repository for the `audits` table. Workers call
/// `create`; the reader calls `list`/`get_by_id`.
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, audit: &Audit) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audits (
                id, request_id, method, path, status_code, response_time_ms,
                identifier, user_email, user_name, roles, user_type, tenant_id,
                ip, user_agent, query_params, path_params, request_body,
                error_message, service_name, environment, timestamp
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            ON CONFLICT (id) DO NOTHING",
        )
        .bind(&audit.id)
        .bind(&audit.request_id)
        .bind(audit.method.as_str())
        .bind(&audit.path)
        .bind(audit.status_code)
        .bind(audit.response_time_ms)
        .bind(&audit.identifier)
        .bind(&audit.user_email)
        .bind(&audit.user_name)
        .bind(&audit.roles)
        .bind(&audit.user_type)
        .bind(&audit.tenant_id)
        .bind(&audit.ip)
        .bind(&audit.user_agent)
        .bind(&audit.query_params)
        .bind(&audit.path_params)
        .bind(&audit.request_body)
        .bind(&audit.error_message)
        .bind(&audit.service_name)
        .bind(&audit.environment)
        .bind(audit.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<ListPage, StoreError> {
        let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audits")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, AuditSummaryRow>(
            "SELECT id, identifier, user_email, user_name, method, path,
                    status_code, service_name, timestamp, response_time_ms
             FROM audits
             ORDER BY timestamp DESC
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(ListPage { data: rows.into_iter().map(Into::into).collect(), total_items })
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Audit>, StoreError> {
        let row = sqlx::query_as::<_, AuditRow>(
            "SELECT id, request_id, method, path, status_code, response_time_ms,
                    identifier, user_email, user_name, roles, user_type, tenant_id,
                    ip, user_agent, query_params, path_params, request_body,
                    error_message, service_name, environment, timestamp
             FROM audits WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

#[derive(sqlx::FromRow)]
struct AuditSummaryRow {
    id: String,
    identifier: String,
    user_email: String,
    user_name: String,
    method: String,
    path: String,
    status_code: i32,
    service_name: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    response_time_ms: i64,
}

impl From<AuditSummaryRow> for AuditSummary {
    fn from(r: AuditSummaryRow) -> Self {
        AuditSummary {
            id: r.id,
            identifier: r.identifier,
            user_email: r.user_email,
            user_name: r.user_name,
            method: parse_method(&r.method),
            path: r.path,
            status_code: r.status_code,
            service_name: r.service_name,
            timestamp: r.timestamp,
            response_time_ms: r.response_time_ms,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    id: String,
    request_id: String,
    method: String,
    path: String,
    status_code: i32,
    response_time_ms: i64,
    identifier: String,
    user_email: String,
    user_name: String,
    roles: serde_json::Value,
    user_type: String,
    tenant_id: String,
    ip: String,
    user_agent: String,
    query_params: serde_json::Value,
    path_params: serde_json::Value,
    request_body: serde_json::Value,
    error_message: String,
    service_name: String,
    environment: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_method_roundtrips_known_values() {
        assert_eq!(parse_method("GET"), HttpMethod::Get);
        assert_eq!(parse_method("PUT"), HttpMethod::Put);
        assert_eq!(parse_method("DELETE"), HttpMethod::Delete);
    }

    #[test]
    fn parse_method_defaults_unknown_to_post() {
        assert_eq!(parse_method("PATCH"), HttpMethod::Post);
    }
}

impl From<AuditRow> for Audit {
    fn from(r: AuditRow) -> Self {
        Audit {
            id: r.id,
            request_id: r.request_id,
            method: parse_method(&r.method),
            path: r.path,
            status_code: r.status_code,
            response_time_ms: r.response_time_ms,
            identifier: r.identifier,
            user_email: r.user_email,
            user_name: r.user_name,
            roles: r.roles,
            user_type: r.user_type,
            tenant_id: r.tenant_id,
            ip: r.ip,
            user_agent: r.user_agent,
            query_params: r.query_params,
            path_params: r.path_params,
            request_body: r.request_body,
            error_message: r.error_message,
            service_name: r.service_name,
            environment: r.environment,
            timestamp: r.timestamp,
        }
    }
}
