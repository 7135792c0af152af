//! Error types for OpenFleet review operations

use fleet_store::ReviewStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for OpenFleet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an error, used to pick HTTP statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something malformed
    Validation,
    /// The addressed review, thread or document does not exist
    NotFound,
    /// The review is in the wrong state for the operation
    Conflict,
    /// Storage or configuration failure
    Internal,
}

/// Error type for OpenFleet operations
#[derive(Error, Debug)]
pub enum Error {
    /// Document path missing or not absolute
    #[error("{0}")]
    InvalidPath(String),

    /// Document to review does not exist
    #[error("Document not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Comment or reply body empty
    #[error("{0} body is required")]
    BodyRequired(&'static str),

    /// Line range outside `1 <= lineStart <= lineEnd`
    #[error("lineStart and lineEnd must be positive numbers with lineStart <= lineEnd")]
    InvalidLines,

    /// Unknown review decision
    #[error("Decision must be 'approve' or 'request_changes'")]
    InvalidDecision(String),

    /// Operation not allowed in the review's current state
    #[error("Review must be in '{required}' state to {action}, current state: '{actual}'")]
    InvalidState {
        action: &'static str,
        required: ReviewStatus,
        actual: ReviewStatus,
    },

    /// Review not found
    #[error("Review with ID '{0}' not found")]
    ReviewNotFound(String),

    /// Thread not found in the review
    #[error("Thread with ID '{0}' not found")]
    ThreadNotFound(String),

    /// Reviewed document disappeared from disk
    #[error("Document file not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] fleet_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidPath(_) => "INVALID_PATH",
            Error::FileNotFound(_) => "FILE_NOT_FOUND",
            Error::BodyRequired(_) => "BODY_REQUIRED",
            Error::InvalidLines => "INVALID_LINES",
            Error::InvalidDecision(_) => "INVALID_DECISION",
            Error::InvalidState { .. } => "INVALID_STATE",
            Error::ReviewNotFound(_) => "REVIEW_NOT_FOUND",
            Error::ThreadNotFound(_) => "THREAD_NOT_FOUND",
            Error::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Error::Store(e) if e.is_corrupt() => "STORAGE_CORRUPT",
            Error::Store(_) | Error::Io(_) | Error::Json(_) => "STORAGE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Category of the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPath(_)
            | Error::FileNotFound(_)
            | Error::BodyRequired(_)
            | Error::InvalidLines
            | Error::InvalidDecision(_) => ErrorKind::Validation,
            Error::InvalidState { .. } => ErrorKind::Conflict,
            Error::ReviewNotFound(_) | Error::ThreadNotFound(_) | Error::DocumentNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::Store(_) | Error::Io(_) | Error::Json(_) | Error::Config(_) | Error::Other(_) => {
                ErrorKind::Internal
            }
        }
    }
}
