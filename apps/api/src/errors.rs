use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message shown for any question-answering failure, whatever the cause.
pub const QUESTION_FAILED_MESSAGE: &str = "Failed to get an answer. Please try again.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A processing call or question is already outstanding for the session.
    #[error("Busy: {0}")]
    Busy(String),

    /// The processing collaborator failed; the message is surfaced verbatim.
    #[error("Processing failed: {0}")]
    Collaborator(String),

    #[error("Question answering failed")]
    QuestionFailed,

    #[error("Upload error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The text a client should show the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Busy(msg)
            | AppError::Collaborator(msg) => msg.clone(),
            AppError::QuestionFailed => QUESTION_FAILED_MESSAGE.to_string(),
            AppError::Multipart(e) => e.body_text(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Busy(_) => (StatusCode::CONFLICT, "BUSY"),
            AppError::Collaborator(msg) => {
                tracing::warn!("Processing collaborator error: {msg}");
                (StatusCode::BAD_GATEWAY, "PROCESSING_FAILED")
            }
            AppError::QuestionFailed => (StatusCode::BAD_GATEWAY, "QUESTION_FAILED"),
            AppError::Multipart(e) => (e.status(), "UPLOAD_ERROR"),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}
