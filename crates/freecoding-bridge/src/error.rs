//! Bridge error types.

use std::io;
use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur in the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// IO error (pipes, process handles).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error (frame encoding, JSON).
    #[error("Protocol error: {0}")]
    Protocol(#[from] freecoding_protocol::ProtocolError),

    /// An answer arrived while no answer listener was registered.
    ///
    /// Callers must register a listener before submitting the question that
    /// produces the answer; hitting this is a bug, not a backend failure.
    #[error("Answer delivered with no registered answer listener")]
    NoAnswerListener,

    /// The backend executable could not be started.
    #[error("Failed to spawn backend {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A backend stdio pipe was not available.
    #[error("Backend {stream} is not piped")]
    MissingPipe { stream: &'static str },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl BridgeError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a spawn error.
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Returns true for violations of the channel's calling contract, which
    /// are reported as internal errors rather than backend failures.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::NoAnswerListener)
    }
}
