//! Frames and the reserved frame names of the wire protocol.

use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

/// Inbound frame carrying the answer to the last question.
pub const ANSWER_FRAME: &str = "FREECODING_ANSWER";

/// Outbound frame carrying a question.
pub const QUESTION_FRAME: &str = "FREECODING_QUESTION";

/// Outbound frame carrying the language code, sent before every question.
pub const SELECT_LANGUAGE_FRAME: &str = "SELECT_LANGUAGE";

/// Inbound side-channel event announcing a loaded document.
pub const DOCUMENT_LOAD_EVENT: &str = "DOCUMENT_LOAD";

/// Suffix of a start marker: `<NAME> START`.
pub const START_SUFFIX: &str = " START";

/// Suffix of an end marker: `<NAME> END`.
pub const END_SUFFIX: &str = " END";

/// Longest frame name the decoder recognizes.
pub const MAX_NAME_LEN: usize = 256;

/// A named payload extracted from, or written to, the backend stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame name, one or more of `A-Z` and `_`.
    pub name: String,
    /// Payload between the markers, trimmed of surrounding whitespace.
    pub payload: String,
}

impl Frame {
    /// Creates a frame without validating the name.
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Creates a frame, rejecting names the decoder could never recognize.
    pub fn checked(name: impl Into<String>, payload: impl Into<String>) -> ProtocolResult<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(ProtocolError::InvalidFrameName(name));
        }
        Ok(Self::new(name, payload))
    }

    /// Classifies this frame by its name.
    pub fn kind(&self) -> FrameKind {
        FrameKind::of(&self.name)
    }

    /// Returns the start marker for this frame.
    pub fn start_marker(&self) -> String {
        start_marker(&self.name)
    }

    /// Returns the end marker for this frame.
    pub fn end_marker(&self) -> String {
        end_marker(&self.name)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.name, self.payload.len())
    }
}

/// Frame names the protocol attaches meaning to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// [`ANSWER_FRAME`]
    Answer,
    /// [`QUESTION_FRAME`]
    Question,
    /// [`SELECT_LANGUAGE_FRAME`]
    SelectLanguage,
    /// Any other name: a generic, open-ended event.
    Event,
}

impl FrameKind {
    /// Classifies a frame name.
    pub fn of(name: &str) -> Self {
        match name {
            ANSWER_FRAME => Self::Answer,
            QUESTION_FRAME => Self::Question,
            SELECT_LANGUAGE_FRAME => Self::SelectLanguage,
            _ => Self::Event,
        }
    }
}

/// Returns true if `name` is one to [`MAX_NAME_LEN`] bytes of `A-Z` and `_`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LEN && name.bytes().all(is_name_byte)
}

/// Returns true if `b` may appear in a frame name.
pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || b == b'_'
}

/// Returns `<name> START`.
pub fn start_marker(name: &str) -> String {
    format!("{name}{START_SUFFIX}")
}

/// Returns `<name> END`.
pub fn end_marker(name: &str) -> String {
    format!("{name}{END_SUFFIX}")
}
