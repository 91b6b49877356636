use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::tone::UnknownTone;
use crate::extraction::ExtractionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant is terminal for the current user action only. Session state that
/// was already computed is left in place by the orchestrator.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Please upload your resume and paste the job description.")]
    MissingInput,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("No valid analysis data received.")]
    NoAnalysisData,

    #[error("Failed to generate cover letter. Please try again.")]
    EmptyGeneration,

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedFormat { .. } => AppError::Validation(err.to_string()),
            ExtractionError::Pdf(_)
            | ExtractionError::Docx(_)
            | ExtractionError::Interrupted { .. } => {
                AppError::UnreadableDocument(err.to_string())
            }
        }
    }
}

impl From<UnknownTone> for AppError {
    fn from(err: UnknownTone) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl AppError {
    /// Status, machine-readable code and user-facing message for the error envelope.
    pub fn response_parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingInput => (StatusCode::BAD_REQUEST, "MISSING_INPUT", self.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::UnreadableDocument(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREADABLE_DOCUMENT",
                msg.clone(),
            ),
            AppError::NoAnalysisData => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_ANALYSIS_DATA",
                self.to_string(),
            ),
            AppError::EmptyGeneration => {
                tracing::warn!("Cover letter generation returned empty text");
                (StatusCode::BAD_GATEWAY, "EMPTY_GENERATION", self.to_string())
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.response_parts();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
