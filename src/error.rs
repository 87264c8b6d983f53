/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装: {"success": false, "error": <status>, "message": <description>}
 * - RepoError / AuthError を種類ごとに status へ変換 (まとめて 422 にしない)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Render the failure body with `status`. Also used by the HTTP layer for
/// failures that never reach a handler (timeouts, oversized bodies).
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(status, message))).into_response()
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error("resource not found")]
    NotFound,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("conflict")]
    Conflict,
    #[error("unprocessable")]
    Unprocessable,
    #[error("service unavailable")]
    Unavailable,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Auth(e) => e.status(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Auth(e) => e.description().to_string(),
            other => other.to_string(),
        };
        error_response(self.status(), message)
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::Conflict,
            RepoError::Unavailable(source) => {
                tracing::error!(error = %source, "database unavailable");
                AppError::Unavailable
            }
            RepoError::Db(source) => {
                tracing::error!(error = %source, "database error");
                AppError::Unprocessable
            }
        }
    }
}
