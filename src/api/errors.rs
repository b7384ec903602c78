use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::ServiceError;

/// Renders a [`ServiceError`] as a JSON `{"error": ...}` body with the
/// status mapped from the taxonomy. Store failures echo their diagnostic
/// text, which suits an internal tool.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::DuplicateUsername => StatusCode::CONFLICT,
            ServiceError::UserNotFound => StatusCode::NOT_FOUND,
            ServiceError::BadCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::Hash(_) | ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E: Into<ServiceError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}
