//! Historian error types
//!
//! Defines all errors that can occur when translating read requests
//! and normalizing backend results.

use thiserror::Error;

use crate::connection::ConnectionError;

/// Errors that can occur in historian operations
#[derive(Error, Debug)]
pub enum HistorianError {
    /// Request is malformed (bad time range, missing interval, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Valid request that this backend cannot serve
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Requested tag (or field mapping) does not exist
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    /// Error from the underlying SQL connection
    #[error("Backend error: {0}")]
    Backend(#[from] ConnectionError),

    /// Backend returned a result the normalizer cannot decode
    #[error("Malformed result: {0}")]
    MalformedResult(String),

    /// Source configuration problem
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HistorianError {
    /// Whether the error was caused by the request rather than the backend
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HistorianError::InvalidRequest(_)
                | HistorianError::Unsupported(_)
                | HistorianError::TagNotFound(_)
        )
    }
}

/// Result type alias for historian operations
pub type Result<T> = std::result::Result<T, HistorianError>;
