//! API Error Types

use alert_store::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cdss_engine::RuleError;
use request_validator::ValidationError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be turned into an evaluation context
    #[error("Request failed validation")]
    Validation(Vec<ValidationError>),

    /// Rule set rejected or rule source unreadable
    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Startup error: {0}")]
    Startup(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rules(RuleError::Io(_)) | ApiError::Rules(RuleError::Parse(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Rules(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ValidationError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let error = self.to_string();
        let details = match self {
            ApiError::Validation(errors) => errors,
            _ => Vec::new(),
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}
