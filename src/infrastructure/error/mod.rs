use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::notification::DispatchError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Dispatch(DispatchError::UnroutableEvent(_)) => {
                (StatusCode::BAD_REQUEST, "UNROUTABLE_EVENT")
            }
            AppError::Dispatch(DispatchError::MissingExtraField(_)) => {
                (StatusCode::BAD_REQUEST, "MISSING_EXTRA_FIELD")
            }
            AppError::Dispatch(DispatchError::UnresolvableRelationship(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNRESOLVABLE_RELATIONSHIP")
            }
            AppError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let log_message = self.to_string();

        let client_message = match &self {
            AppError::Unavailable(_) if is_production() => "Service unavailable".to_string(),
            _ => log_message.clone(),
        };

        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
