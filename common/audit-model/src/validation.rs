use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;
use validator::{ValidationError, ValidationErrors};

use crate::FieldDiagnostic;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$").unwrap()
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9.-]+(\.[A-Za-z]{2,})+(:\d+)?(/[^\s]*)?$").unwrap()
});

static SERVICE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]{0,99}$").unwrap());

const ALLOWED_ENVIRONMENTS: [&str; 5] =
    ["production", "staging", "development", "testing", "local"];

/// Empty or a parseable IPv4/IPv6 address.
pub fn valid_ip(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || IpAddr::from_str(value).is_ok() {
        return Ok(());
    }
    let mut err = ValidationError::new("valid_ip");
    err.message = Some("Invalid IP address".into());
    Err(err)
}

/// Empty or an RFC 5322-shaped address (checked with a practical subset regex).
pub fn valid_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || EMAIL_RE.is_match(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("valid_email");
    err.message = Some("Invalid email address".into());
    Err(err)
}

/// Empty or a parseable UUID.
pub fn valid_uuid(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || uuid::Uuid::parse_str(value).is_ok() {
        return Ok(());
    }
    let mut err = ValidationError::new("valid_uuid");
    err.message = Some("Invalid UUID".into());
    Err(err)
}

/// One of {production, staging, development, testing, local} after lowercasing.
/// Empty fails (unlike the other optional predicates) — environment is required.
pub fn valid_environment(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && ALLOWED_ENVIRONMENTS.contains(&value.to_lowercase().as_str()) {
        return Ok(());
    }
    let mut err = ValidationError::new("valid_environment");
    err.message = Some(
        "Invalid environment. Allowed: production, staging, development, testing, local".into(),
    );
    Err(err)
}

/// Empty or `^https?://host(.tld)+(:port)?(/path)?$`.
pub fn valid_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || URL_RE.is_match(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("valid_url");
    err.message = Some("Invalid URL".into());
    Err(err)
}

/// `^[A-Za-z0-9][A-Za-z0-9._\-]{0,99}$`
pub fn valid_service_name(value: &str) -> Result<(), ValidationError> {
    if SERVICE_NAME_RE.is_match(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("valid_service_name");
    err.message = Some(
        "Invalid service name: must start with an alphanumeric and contain only letters, digits, '.', '_' or '-'".into(),
    );
    Err(err)
}

/// GET | POST | PUT | DELETE — exposed for callers validating a method string
/// directly (the `Audit` struct itself rejects unknown methods at
/// deserialization time via `HttpMethod`'s custom `Deserialize`).
pub fn valid_http_method(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_uppercase().as_str() {
        "GET" | "POST" | "PUT" | "DELETE" => Ok(()),
        _ => {
            let mut err = ValidationError::new("valid_http_method");
            err.message = Some("Invalid HTTP method. Allowed: GET, POST, PUT, DELETE".into());
            Err(err)
        }
    }
}

fn message_for(tag: &str, param: &str) -> String {
    match tag {
        "required" => "This field is required".to_string(),
        "length" => {
            if param.is_empty() {
                "The value length is invalid".to_string()
            } else {
                format!("The value length must satisfy: {param}")
            }
        }
        "range" => format!("The value must be within range: {param}"),
        "valid_ip" => "Invalid IP address".to_string(),
        "valid_email" => "Invalid email address".to_string(),
        "valid_uuid" => "Invalid UUID".to_string(),
        "valid_environment" => {
            "Invalid environment. Allowed: production, staging, development, testing, local"
                .to_string()
        }
        "valid_url" => "Invalid URL".to_string(),
        "valid_service_name" => {
            "Invalid service name: must start with an alphanumeric and contain only letters, digits, '.', '_' or '-'".to_string()
        }
        "valid_http_method" => "Invalid HTTP method. Allowed: GET, POST, PUT, DELETE".to_string(),
        other => format!("Invalid value ({other})"),
    }
}

/// Flattens `validator::ValidationErrors` into the `{field, value, tag, param,
/// message}` diagnostics shape the ingestion endpoint returns to callers.
pub fn format_validation_errors(errors: &ValidationErrors) -> Vec<FieldDiagnostic> {
    let mut out = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for err in field_errors {
            let tag = err.code.to_string();
            let value = err
                .params
                .get("value")
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            let param = err
                .params
                .iter()
                .filter(|(k, _)| *k != "value")
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| message_for(&tag, &param));
            out.push(FieldDiagnostic {
                field: field.to_string(),
                value,
                tag,
                param,
                message,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_accepts_empty_and_valid() {
        assert!(valid_ip("").is_ok());
        assert!(valid_ip("127.0.0.1").is_ok());
        assert!(valid_ip("::1").is_ok());
        assert!(valid_ip("not-an-ip").is_err());
    }

    #[test]
    fn environment_rejects_empty() {
        assert!(valid_environment("").is_err());
        assert!(valid_environment("PRODUCTION").is_ok());
        assert!(valid_environment("bogus").is_err());
    }

    #[test]
    fn service_name_requires_alnum_start() {
        assert!(valid_service_name("svc-1").is_ok());
        assert!(valid_service_name("_svc").is_err());
    }

    #[test]
    fn url_accepts_empty_and_well_formed() {
        assert!(valid_url("").is_ok());
        assert!(valid_url("https://example.com/path").is_ok());
        assert!(valid_url("ftp://example.com").is_err());
    }
}
