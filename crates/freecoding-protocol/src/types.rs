//! Questions bound for the backend and the JSON messages exchanged with
//! the chat UI.

use freecoding_core::{Language, local_timestamp};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolResult;

/// A question as it will be written to the backend.
///
/// The language is captured when the question is submitted, so a question
/// that waits in a buffer keeps the language that was selected when it was
/// asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundQuestion {
    /// The question text.
    pub text: String,
    /// Language selected when the question was submitted.
    pub language: Language,
}

impl OutboundQuestion {
    /// Creates a new outbound question.
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }
}

/// Raw `{ "type": ..., "data": ... }` object posted by the UI.
#[derive(Debug, Clone, Deserialize)]
struct RawUiCommand {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: String,
}

/// A command posted by the chat UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// `sendMessage`: ask the backend a question.
    SendMessage(String),
    /// `changeLanguage`: select the language for subsequent questions.
    ChangeLanguage(String),
    /// Any other message type; carries the type name.
    Unknown(String),
}

impl UiCommand {
    /// Parses a command from its JSON form.
    ///
    /// Unknown `type` values are not an error, so older front-ends keep
    /// working against newer UIs.
    pub fn from_json(json: &str) -> ProtocolResult<Self> {
        let raw: RawUiCommand = serde_json::from_str(json)?;
        Ok(match raw.kind.as_str() {
            "sendMessage" => Self::SendMessage(raw.data),
            "changeLanguage" => Self::ChangeLanguage(raw.data),
            _ => Self::Unknown(raw.kind),
        })
    }
}

/// A chat bubble shown in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message text.
    pub text: String,
    /// True for messages typed by the user, false for backend answers.
    pub is_user: bool,
    /// Local `HH:MM:SS` label.
    pub timestamp: String,
}

/// Notice that the backend loaded a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNotice {
    /// Payload of the document-load event.
    pub text: String,
    /// Local `HH:MM:SS` label.
    pub timestamp: String,
}

/// A message posted to the chat UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum UiEvent {
    /// Show a chat message.
    AddMessage(ChatMessage),
    /// The backend loaded a document.
    DocumentLoaded(DocumentNotice),
    /// A line the backend wrote to stderr.
    BackendError {
        /// The stderr line.
        text: String,
    },
    /// The backend process exited.
    BackendExited {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
    /// The transport itself misbehaved (not a backend problem).
    InternalError {
        /// Description of the failure.
        message: String,
    },
}

impl UiEvent {
    /// A message typed by the user, stamped now.
    pub fn user_message(text: impl Into<String>) -> Self {
        Self::AddMessage(ChatMessage {
            text: text.into(),
            is_user: true,
            timestamp: local_timestamp(),
        })
    }

    /// An answer from the backend, stamped now.
    pub fn answer(text: impl Into<String>) -> Self {
        Self::AddMessage(ChatMessage {
            text: text.into(),
            is_user: false,
            timestamp: local_timestamp(),
        })
    }

    /// A document-load notice, stamped now.
    pub fn document_loaded(text: impl Into<String>) -> Self {
        Self::DocumentLoaded(DocumentNotice {
            text: text.into(),
            timestamp: local_timestamp(),
        })
    }

    /// Serializes the event as a single JSON line (without the newline).
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
