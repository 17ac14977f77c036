//! HTTP error mapping for the core error taxonomy.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use cordon_auth::AuthError;
use cordon_core::error::CordonError;

/// Response-side wrapper for [`CordonError`].
#[derive(Debug)]
pub struct ApiError(pub CordonError);

impl From<CordonError> for ApiError {
    fn from(err: CordonError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CordonError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            CordonError::Forbidden { .. } => StatusCode::FORBIDDEN,
            CordonError::NotFound { .. } => StatusCode::NOT_FOUND,
            CordonError::AlreadyExists { .. } => StatusCode::CONFLICT,
            CordonError::Validation { .. } | CordonError::SecurityIncident { .. } => {
                StatusCode::BAD_REQUEST
            }
            CordonError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            CordonError::Store(_)
            | CordonError::StoreTimeout
            | CordonError::Crypto(_)
            | CordonError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
