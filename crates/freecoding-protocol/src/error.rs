//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding frames or UI messages.
///
/// Decoding never fails: malformed input on the inbound stream is noise
/// and is discarded by the decoder instead.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame name is not one or more of `A-Z` and `_`.
    #[error("invalid frame name: {0:?}")]
    InvalidFrameName(String),

    /// Payload contains the end marker of its own frame and would be cut short.
    #[error("payload of {name} frame contains its own end marker")]
    PayloadContainsEndMarker { name: String },

    /// Failed to (de)serialize a UI message.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error while writing frames.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Creates an invalid frame name error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidFrameName(name.into())
    }

    /// Creates a payload-contains-end-marker error.
    pub fn payload_contains_end_marker(name: impl Into<String>) -> Self {
        Self::PayloadContainsEndMarker { name: name.into() }
    }
}
