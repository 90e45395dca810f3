//! Client error types.

use std::fmt;

use freecoding_bridge::BridgeError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// IO error.
    Io(std::io::Error),
    /// The bridge failed to start or run the backend.
    Bridge(BridgeError),
    /// The backend exited with a failure status.
    BackendExited(Option<i32>),
    /// The session was interrupted before an answer arrived.
    Interrupted,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Bridge(err) => write!(f, "{}", err),
            Self::BackendExited(Some(code)) => write!(f, "backend exited with status {}", code),
            Self::BackendExited(None) => write!(f, "backend was terminated by a signal"),
            Self::Interrupted => write!(f, "interrupted before an answer arrived"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Bridge(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<BridgeError> for ClientError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Config { message } => Self::Config(message),
            other => Self::Bridge(other),
        }
    }
}
