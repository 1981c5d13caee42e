//! Gateway error taxonomy and its single mapping to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::channels::PlatformError;

/// Fixed message for malformed form submissions.
const BAD_FORM_MESSAGE: &str = "Some parameters are missing or incorrect from the request.";

/// Everything a request can fail with, classified at the route boundary.
/// The HTTP status is derived here and nowhere else.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input; no backend call was attempted.
    #[error("{0}")]
    Validation(String),

    /// The channel id does not resolve to a live channel.
    #[error("Channel {0} not found.")]
    NotFound(u64),

    /// The platform's API rejected the send; status and message are the
    /// platform's own, passed through verbatim.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Anything else that went wrong during dispatch.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_form() -> Self {
        Self::Validation(BAD_FORM_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PlatformError> for ApiError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Api { status, message } => Self::Backend { status, message },
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
