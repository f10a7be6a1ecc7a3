//! Error types for httpdump

use std::io;
use thiserror::Error;

/// Result type for httpdump operations
pub type Result<T> = std::result::Result<T, DumpError>;

/// Errors that can occur while serving requests or starting up
#[derive(Debug, Error)]
pub enum DumpError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Bucket id missing from the request path
    #[error("id is required")]
    InvalidBucketId,

    /// Request body could not be read
    #[error("{0}")]
    BodyRead(String),

    /// Cookie header present but unreadable
    #[error("Invalid cookie header: {0}")]
    InvalidCookie(String),

    /// Response could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl DumpError {
    /// Whether the caller is at fault
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, DumpError::InvalidBucketId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_id_message() {
        assert_eq!(DumpError::InvalidBucketId.to_string(), "id is required");
        assert!(DumpError::InvalidBucketId.is_client_error());
    }

    #[test]
    fn test_body_read_keeps_text() {
        let error = DumpError::BodyRead("connection reset".to_string());
        assert_eq!(error.to_string(), "connection reset");
        assert!(!error.is_client_error());
    }
}
