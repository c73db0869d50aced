//! HTTP error responses for the management API.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

use crate::identity::IdentityError;

/// Errors a management API handler can return.
///
/// Store failures never appear here; the store facade absorbs them.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body or parameters are invalid.
    #[error("{0}")]
    BadRequest(String),
    /// The caller could not be identified.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl ApiError {
    /// Status code sent for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Identity(IdentityError::MissingToken | IdentityError::Rejected) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Identity(IdentityError::Unavailable(_) | IdentityError::UpstreamStatus(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "management API request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
