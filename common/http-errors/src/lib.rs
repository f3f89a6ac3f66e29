use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Per-field validation failure, shaped to match what the validator crate
/// already knows about a rejected field.
#[derive(Serialize, Debug, Clone)]
pub struct FieldDiagnostic {
    pub field: String,
    pub value: String,
    pub tag: String,
    pub param: String,
    pub message: String,
}

#[derive(Serialize, Debug)]
struct FailureBody {
    error: String,
    details: String,
    status: &'static str,
    code: &'static str,
}

#[derive(Serialize, Debug)]
struct ValidationFailureBody {
    error: String,
    diagnostics: Vec<FieldDiagnostic>,
    status: &'static str,
    code: &'static str,
}

#[derive(Serialize, Debug)]
struct NotFoundBody {
    error: String,
    status: &'static str,
}

#[derive(Debug)]
pub enum ApiError {
    /// BAT-001: the request body did not decode as JSON.
    MalformedJson { details: String },
    /// BAT-002: the decoded event failed field validation.
    ValidationFailed { diagnostics: Vec<FieldDiagnostic> },
    /// BAT-003: the queue rejected the enqueue (unreachable broker, timeout).
    BrokerFailure { message: String },
    /// Resource lookups on the read path (not part of the core contract).
    NotFound { resource: &'static str },
    Internal { message: String },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal { message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, body): (StatusCode, &'static str, Response) = match self {
            ApiError::MalformedJson { details } => (
                StatusCode::BAD_REQUEST,
                "BAT-001",
                Json(FailureBody {
                    error: "invalid request payload".into(),
                    details,
                    status: "failed",
                    code: "BAT-001",
                })
                .into_response(),
            ),
            ApiError::ValidationFailed { diagnostics } => (
                StatusCode::BAD_REQUEST,
                "BAT-002",
                Json(ValidationFailureBody {
                    error: "validation failed".into(),
                    diagnostics,
                    status: "failed",
                    code: "BAT-002",
                })
                .into_response(),
            ),
            ApiError::BrokerFailure { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "BAT-003",
                Json(FailureBody {
                    error: "failed to enqueue audit event".into(),
                    details: message,
                    status: "failed",
                    code: "BAT-003",
                })
                .into_response(),
            ),
            ApiError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "not_found",
                Json(NotFoundBody {
                    error: format!("{resource} not found"),
                    status: "failed",
                })
                .into_response(),
            ),
            ApiError::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                Json(FailureBody {
                    error: "internal error".into(),
                    details: message,
                    status: "failed",
                    code: "internal_error",
                })
                .into_response(),
            ),
        };
        let mut resp = (status, body).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
