use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::store::StoreError;
use serde::Serialize;
use worker::IntakeError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `QUEUE_FULL`, `SHUTTING_DOWN`, `INTERNAL_ERROR`.
    pub code: &'static str,
    /// Human-readable error description.
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// The evaluation queue has no room for another submission.
    QueueFull,
    ShuttingDown,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::QueueFull => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "QUEUE_FULL",
                    message: "Evaluation queue is full, try again later".into(),
                },
            ),
            AppError::ShuttingDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "SHUTTING_DOWN",
                    message: "Server is shutting down".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = matches!(self, AppError::QueueFull | AppError::ShuttingDown);
        let (status, body) = self.status_and_body();

        if retry_after {
            (status, [("Retry-After", "1")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StoreError::Backend(detail) => AppError::Internal(detail),
        }
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Validation(msg) => AppError::Validation(msg),
            IntakeError::NotFound(msg) => AppError::NotFound(msg),
            IntakeError::Saturated => {
                tracing::warn!("Submission refused, evaluation queue is full");
                AppError::QueueFull
            }
            IntakeError::ShuttingDown => AppError::ShuttingDown,
            IntakeError::Store(e) => e.into(),
        }
    }
}
