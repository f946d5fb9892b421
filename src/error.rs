/*
 * Responsibility
 * - アプリ共通の AppError 定義 (HTTP に変換される唯一のエラー型)
 * - IntoResponse 実装 (status / 構造化 JSON body)
 * - audit 用に FailureDetail を response extensions に残す
 *
 * Notes
 * - body の `path` は error_boundary middleware が元の URI で埋める
 * - 500 系は内部詳細を client に返さない (server log にだけ出す)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::audit::FailureDetail;
use crate::services::authenticator::AuthError;

const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// `{timestamp, status, error, message, path}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: message.into(),
            path: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Authentication failed: Invalid credentials provided.")]
    BadCredentials,
    #[error("Full authentication is required to access this resource.")]
    Unauthorized,
    #[error("Access denied. You do not have the required permissions to access this resource.")]
    Forbidden,
    #[error("No endpoint found for this path.")]
    NotFound,
    #[error("internal server error")]
    Internal,
    #[error("unexpected error: {0}")]
    Unexpected(#[source] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BadCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `AppError::Forbidden` style label used as the audit exception type.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "AppError::InvalidRequest",
            AppError::BadCredentials => "AppError::BadCredentials",
            AppError::Unauthorized => "AppError::Unauthorized",
            AppError::Forbidden => "AppError::Forbidden",
            AppError::NotFound => "AppError::NotFound",
            AppError::Internal => "AppError::Internal",
            AppError::Unexpected(_) => "AppError::Unexpected",
        }
    }

    // what the client sees
    fn public_message(&self) -> String {
        match self {
            AppError::Internal | AppError::Unexpected(_) => UNEXPECTED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed with an unexpected error");
        }

        let body = ErrorResponse::new(status, self.public_message());
        let detail = FailureDetail::with_type(self.kind(), &self);

        let mut res = (status, Json(body.clone())).into_response();
        res.extensions_mut().insert(body);
        res.extensions_mut().insert(detail);
        res
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::BadCredentials => AppError::BadCredentials,
            AuthError::Worker(err) => AppError::Unexpected(err.into()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Unexpected(e)
    }
}
