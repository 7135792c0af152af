//! Error types for the review server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fleet_core::ErrorKind;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for server startup
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while starting or running the server
#[derive(Error, Debug)]
pub enum Error {
    /// Every port in the retry window was taken
    #[error("Could not find available port after {attempts} attempts starting at {start}")]
    NoAvailablePort { start: u16, attempts: u16 },

    /// Binding failed for a reason other than the port being in use
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

/// API error response, rendered as `{"error": {"code", "message"}}`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Request body was not valid JSON
    pub fn invalid_json() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_JSON",
            "Invalid JSON in request body",
        )
    }
}

impl From<fleet_core::Error> for ApiError {
    fn from(err: fleet_core::Error) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => {
                tracing::error!(code = err.code(), error = %err, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.code,
                message: &self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
