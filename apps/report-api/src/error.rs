//! Error types for the report API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use template_engine::{EngineError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(#[from] EngineError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TemplateNotFound(code) => ApiError::TemplateNotFound(code),
            StoreError::EntryNotFound(id) => ApiError::EntryNotFound(id),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::TemplateNotFound(code) => (
                StatusCode::NOT_FOUND,
                format!("Template not found: {}", code),
            ),
            ApiError::EntryNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Entry not found: {}", id))
            }
            ApiError::InvalidTemplate(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Store error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
