//! Error types for freya-ui
//!
//! Every proxy failure is converted to the `{ "error": message }` envelope
//! at the handler boundary; nothing else reaches the browser.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use freya_common::api::ErrorResponse;
use thiserror::Error;
use tracing::debug;

/// Proxy route error
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Backend unreachable, timed out, or the body could not be read (500)
    #[error("Failed to {action}: {message}")]
    Transport {
        action: &'static str,
        message: String,
    },

    /// Backend answered with a non-success status (relayed as-is)
    #[error("{backend} error: {body}")]
    Upstream {
        backend: &'static str,
        status: u16,
        body: String,
    },

    /// Backend answered 2xx with something other than JSON (500)
    #[error("{backend} returned invalid response format")]
    InvalidFormat { backend: &'static str },

    /// Inbound request body unusable (400)
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    /// Inbound body could not be read at all, e.g. over the size limit
    /// (status chosen by the extractor, 413 for oversize)
    #[error("Invalid request body: {message}")]
    BodyRejected { status: u16, message: String },
}

impl From<BytesRejection> for ProxyError {
    fn from(rejection: BytesRejection) -> Self {
        ProxyError::BodyRejected {
            status: rejection.status().as_u16(),
            message: rejection.body_text(),
        }
    }
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Upstream { status, .. } | ProxyError::BodyRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Transport { .. } | ProxyError::InvalidFormat { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        debug!(status = status.as_u16(), "Proxy error response: {}", self);
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Result type for proxy handlers
pub type ProxyResult<T> = Result<T, ProxyError>;
