//! HTTP error responses for the JSON API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::domain::error::FoliobackError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<FoliobackError> for WebError {
    fn from(err: FoliobackError) -> Self {
        let status = match &err {
            FoliobackError::NotFound { .. } => StatusCode::NOT_FOUND,
            FoliobackError::ConstraintViolation { .. } => StatusCode::CONFLICT,
            FoliobackError::InsufficientHoldings { .. }
            | FoliobackError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            FoliobackError::InvalidOrder { .. } => StatusCode::BAD_REQUEST,
            FoliobackError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            FoliobackError::Database { .. }
            | FoliobackError::ConfigParse { .. }
            | FoliobackError::ConfigMissing { .. }
            | FoliobackError::ConfigInvalid { .. }
            | FoliobackError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("request failed: {err}");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
