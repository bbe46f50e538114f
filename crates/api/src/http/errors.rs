//! Mapping from domain errors to HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cellarsync_domain::CellarSyncError;
use serde_json::json;

/// Handler error carrying a domain error.
///
/// Renders as `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug)]
pub struct ApiError(pub CellarSyncError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CellarSyncError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CellarSyncError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CellarSyncError> for ApiError {
    fn from(err: CellarSyncError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "error": self.0 });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
