//! Error types for the DBFS mock kernel
//!
//! Provides a unified error type for all operations.

use std::io::ErrorKind;

use thiserror::Error;

/// Result type alias using MockError
pub type Result<T> = std::result::Result<T, MockError>;

/// Unified error type for mock kernel operations
#[derive(Debug, Error)]
pub enum MockError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    /// The peer closed the stream partway through a frame
    #[error("Truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame { expected: usize, received: usize },

    /// A frame's declared length exceeds the configured ceiling
    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// No data arrived within the idle timeout
    #[error("Idle timeout")]
    IdleTimeout,

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Request frame too short: need {needed} bytes, have {available}")]
    FrameTooShort { needed: usize, available: usize },

    #[error("Response too short: need {needed} bytes, have {available}")]
    ResponseTooShort { needed: usize, available: usize },

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MockError {
    /// True when the error means the peer went away (reset, abort, broken pipe)
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            MockError::Io(e) if matches!(
                e.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            )
        )
    }

    /// True for malformed-frame errors that earn the client an error response
    pub fn is_malformed_frame(&self) -> bool {
        matches!(
            self,
            MockError::FrameTooShort { .. } | MockError::FrameTooLarge { .. } | MockError::Protocol(_)
        )
    }
}

impl From<serde_json::Error> for MockError {
    fn from(err: serde_json::Error) -> Self {
        MockError::Serialization(err.to_string())
    }
}
