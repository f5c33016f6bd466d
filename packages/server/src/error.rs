//! HTTP error mapping
//!
//! JSON API routes report failures in the body (`{"success": false,
//! "error": ...}`) with status 200, which is what existing clients expect.
//! Download routes use real status codes with an `{"error": ...}` body.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use podcast_studio::StudioError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Studio(#[from] StudioError),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    MissingParameter(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Studio(_) | ApiError::Multipart(_) | ApiError::InvalidRequest(_) => {
                StatusCode::OK
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        warn!(status = status.as_u16(), error = %message, "request failed");
        if status == StatusCode::OK {
            (status, Json(json!({"success": false, "error": message}))).into_response()
        } else {
            (status, Json(json!({"error": message}))).into_response()
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
