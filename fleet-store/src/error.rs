//! Error types for review storage

use std::path::PathBuf;
use thiserror::Error;

/// Storage error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record file exists but cannot be parsed
    #[error("Corrupt record at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl Error {
    /// Check if this error describes an unreadable record rather than an IO fault
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt { .. })
    }
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, Error>;
