//! Error taxonomy and the HTTP mapping to the response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::schema::ApiResponse;

/// Errors surfaced by the pipelines and route handlers.
///
/// The upload pipeline's background analysis never returns these to a caller;
/// a failure there is recorded on the `FileRecord` instead.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad extension, rejected before any record is created.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Parse-time path error.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Format-specific parse failure, propagated as-is.
    #[error("parse error: {0}")]
    Parse(String),

    /// Gateway transport or JSON-shape failure during file analysis.
    #[error("AI analysis failed: {0}")]
    AiAnalysis(String),

    /// Gateway transport failure during chat.
    #[error("AI chat failed: {0}")]
    AiChat(String),

    /// Caller mistake in the request body or query.
    #[error("{0}")]
    BadRequest(String),

    /// Unknown file or session id on a lookup route.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedFormat(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ApiResponse::err(self.to_string()))).into_response()
    }
}
