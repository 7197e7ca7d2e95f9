use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every version transition failure is local to its own transaction: nothing
/// is partially committed, so callers may always retry after a
/// `ConcurrencyConflict` and inspect status after a `GenerationFailed`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Slug already in use: {0}")]
    DuplicateSlug(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Refinement failed: {0}")]
    RefinementFailed(String),

    #[error("Concurrent modification: {0}")]
    ConcurrencyConflict(String),

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wraps a driver error from a mutating transition, surfacing Postgres
    /// serialization/deadlock failures (SQLSTATE 40001/40P01) as retryable
    /// `ConcurrencyConflict` instead of an opaque database error.
    pub fn from_db(transition: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(code) = db_err.code() {
                if code == "40001" || code == "40P01" {
                    return AppError::ConcurrencyConflict(format!(
                        "{transition} lost a serialization race, retry the request"
                    ));
                }
            }
        }
        AppError::Database(err)
    }

    /// Wraps a portfolio INSERT error, surfacing the slug unique-constraint
    /// violation (SQLSTATE 23505) as `DuplicateSlug` so the caller can retry
    /// with a fresh random suffix.
    pub fn from_insert(slug: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::DuplicateSlug(slug.to_string());
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::InvalidState(msg) => (StatusCode::BAD_REQUEST, "INVALID_STATE", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::DuplicateSlug(slug) => (
                StatusCode::CONFLICT,
                "DUPLICATE_SLUG",
                format!("Slug already in use: {slug}"),
            ),
            AppError::GenerationFailed(msg) => {
                tracing::error!("Generation failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    msg.clone(),
                )
            }
            AppError::RefinementFailed(msg) => {
                tracing::error!("Refinement failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REFINEMENT_FAILED",
                    msg.clone(),
                )
            }
            AppError::ConcurrencyConflict(msg) => {
                (StatusCode::CONFLICT, "CONCURRENCY_CONFLICT", msg.clone())
            }
            AppError::IntegrityViolation(msg) => {
                tracing::error!("Integrity violation: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTEGRITY_VIOLATION",
                    msg.clone(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
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
