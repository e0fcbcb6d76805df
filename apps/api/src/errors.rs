use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::composition::pipeline::ComposeError;
use crate::llm_client::{ServiceError, ServiceErrorKind};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Completion service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ComposeError> for AppError {
    fn from(e: ComposeError) -> Self {
        match e {
            ComposeError::Service(e) => AppError::Service(e),
            ComposeError::Parse(e) => AppError::UnprocessableEntity(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => {
                tracing::warn!("Unprocessable completion: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNPROCESSABLE_ENTITY",
                    "The completion service did not return a usable draft".to_string(),
                )
            }
            AppError::Service(e) => {
                tracing::error!("Completion service error: {e}");
                service_error_response(e.kind())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn service_error_response(kind: ServiceErrorKind) -> (StatusCode, &'static str, String) {
    match kind {
        ServiceErrorKind::Auth => (
            StatusCode::BAD_GATEWAY,
            "SERVICE_AUTH",
            "The completion service rejected the credentials".to_string(),
        ),
        ServiceErrorKind::Quota => (
            StatusCode::TOO_MANY_REQUESTS,
            "SERVICE_QUOTA",
            "The completion service is rate limiting requests".to_string(),
        ),
        ServiceErrorKind::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            "SERVICE_TIMEOUT",
            "The completion service timed out".to_string(),
        ),
        ServiceErrorKind::Network => (
            StatusCode::BAD_GATEWAY,
            "SERVICE_UNAVAILABLE",
            "The completion service could not be reached".to_string(),
        ),
        ServiceErrorKind::Upstream => (
            StatusCode::BAD_GATEWAY,
            "SERVICE_ERROR",
            "The completion service returned an error".to_string(),
        ),
    }
}
