//! API error type shared by the store and the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed badge or user input.
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{resource_type} not found: {id}")]
    NotFound { resource_type: &'static str, id: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation { message: message.into() }
    }

    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        ApiError::NotFound { resource_type, id: id.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal { message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(target: "eduguardian_backend", code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
