use axum::http::StatusCode;
use axum::response::IntoResponse;
use common_http_errors::{ApiError, FieldDiagnostic};

#[test]
fn malformed_json_variant() {
    let err = ApiError::MalformedJson { details: "EOF".into() };
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "BAT-001");
}

#[test]
fn validation_failed_variant() {
    let err = ApiError::ValidationFailed {
        diagnostics: vec![FieldDiagnostic {
            field: "Path".into(),
            value: "".into(),
            tag: "required".into(),
            param: "".into(),
            message: "This field is required".into(),
        }],
    };
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "BAT-002");
}

#[test]
fn broker_failure_variant() {
    let err = ApiError::BrokerFailure { message: "timeout".into() };
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "BAT-003");
}

#[test]
fn not_found_variant() {
    let err = ApiError::NotFound { resource: "audit" };
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test]
fn internal_variant() {
    let err = ApiError::internal("boom");
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "internal_error");
}
