use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::http_method::HttpMethod;
use crate::validation::{
    valid_email, valid_environment, valid_ip, valid_service_name, valid_uuid,
};

fn empty_json() -> Value {
    Value::Null
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// The primary audit record. Mutated only by the ingestion endpoint
/// (defaulting, sanitization, masking); immutable once persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Audit {
    #[serde(default)]
    #[validate(custom(function = "valid_uuid"))]
    pub id: String,

    #[serde(default, rename = "request_id")]
    pub request_id: String,

    pub method: HttpMethod,

    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "This field is required"))]
    pub path: String,

    #[serde(default)]
    #[validate(range(min = 100, max = 599, message = "The value must be between 100 and 599"))]
    pub status_code: i32,

    #[serde(default)]
    #[validate(range(min = 0, message = "The value must be >= 0"))]
    pub response_time_ms: i64,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "This field is required"))]
    pub identifier: String,

    #[serde(default)]
    #[validate(custom(function = "valid_email"))]
    pub user_email: String,

    #[serde(default)]
    pub user_name: String,

    #[serde(default = "empty_json")]
    pub roles: Value,

    #[serde(default)]
    pub user_type: String,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default, rename = "ip")]
    #[validate(custom(function = "valid_ip"))]
    pub ip: String,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub user_agent: String,

    #[serde(default = "empty_json")]
    pub query_params: Value,

    #[serde(default = "empty_json")]
    pub path_params: Value,

    #[serde(default = "empty_json")]
    pub request_body: Value,

    #[serde(default)]
    #[validate(length(max = 1000))]
    pub error_message: String,

    #[serde(default)]
    #[validate(custom(function = "valid_service_name"))]
    pub service_name: String,

    #[serde(default)]
    #[validate(custom(function = "valid_environment"))]
    pub environment: String,

    #[serde(default = "epoch")]
    pub timestamp: DateTime<Utc>,
}

impl Audit {
    /// `timestamp` defaults to zero when the field is absent; the ingestion
    /// endpoint calls this to promote a zero timestamp to ingestion time.
    pub fn default_timestamp_if_zero(&mut self) {
        if self.timestamp == epoch() {
            self.timestamp = Utc::now();
        }
    }

    /// Assigns an `id` and `request_id` when the caller left them empty.
    /// Always runs after validation succeeds, so persisted records always
    /// carry a valid UUID identity.
    pub fn assign_identity_if_missing(&mut self) {
        if self.id.is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        if self.request_id.is_empty() {
            self.request_id = format!("bat-{}", uuid::Uuid::new_v4());
        }
    }

    /// Redundant service-layer guard alongside the validator's own
    /// `identifier` check — kept so a caller that bypasses the HTTP
    /// validation step (a future direct persistence caller) still fails
    /// loudly instead of writing a blank identifier.
    pub fn require_identifier(&self) -> Result<(), &'static str> {
        if self.identifier.is_empty() {
            Err("identifier is required")
        } else {
            Ok(())
        }
    }
}

/// Read-path projection returned by the listing and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub id: String,
    pub identifier: String,
    pub user_email: String,
    pub user_name: String,
    pub method: HttpMethod,
    pub path: String,
    pub status_code: i32,
    pub service_name: String,
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: i64,
}

impl From<&Audit> for AuditSummary {
    fn from(a: &Audit) -> Self {
        AuditSummary {
            id: a.id.clone(),
            identifier: a.identifier.clone(),
            user_email: a.user_email.clone(),
            user_name: a.user_name.clone(),
            method: a.method,
            path: a.path.clone(),
            status_code: a.status_code,
            service_name: a.service_name.clone(),
            timestamp: a.timestamp,
            response_time_ms: a.response_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Audit {
        Audit {
            id: String::new(),
            request_id: String::new(),
            method: HttpMethod::Post,
            path: "/x".into(),
            status_code: 200,
            response_time_ms: 5,
            identifier: "u1".into(),
            user_email: String::new(),
            user_name: String::new(),
            roles: Value::Null,
            user_type: String::new(),
            tenant_id: String::new(),
            ip: String::new(),
            user_agent: String::new(),
            query_params: Value::Null,
            path_params: Value::Null,
            request_body: Value::Null,
            error_message: String::new(),
            service_name: "svc".into(),
            environment: "production".into(),
            timestamp: epoch(),
        }
    }

    #[test]
    fn zero_timestamp_is_promoted_to_now() {
        let mut a = sample();
        a.default_timestamp_if_zero();
        assert!(a.timestamp > epoch());
    }

    #[test]
    fn missing_identity_is_assigned() {
        let mut a = sample();
        a.assign_identity_if_missing();
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
        assert!(a.request_id.starts_with("bat-"));
    }

    #[test]
    fn present_identity_is_preserved() {
        let mut a = sample();
        a.id = "keep-me".into();
        a.request_id = "keep-me-too".into();
        a.assign_identity_if_missing();
        assert_eq!(a.id, "keep-me");
        assert_eq!(a.request_id, "keep-me-too");
    }

    #[test]
    fn validate_rejects_missing_path() {
        let mut a = sample();
        a.path = String::new();
        assert!(a.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_record() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn require_identifier_catches_blank() {
        let mut a = sample();
        a.identifier = String::new();
        assert!(a.require_identifier().is_err());
    }
}
