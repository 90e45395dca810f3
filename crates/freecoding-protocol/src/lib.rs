//! Wire protocol between the chat front-end and the answering backend.
//!
//! The backend is a long-running process spoken to over its stdin and
//! stdout. Both directions carry text frames delimited by markers:
//!
//! ```text
//! FREECODING_ANSWER START
//! the answer, possibly
//! spanning several lines
//! FREECODING_ANSWER END
//! ```
//!
//! Anything between frames is noise and is ignored. Several frame names
//! share one stream; only a few are reserved (see [`FrameKind`]).
//!
//! # Example
//!
//! ```rust
//! use freecoding_protocol::{FrameDecoder, encode_frame};
//!
//! let bytes = encode_frame("FREECODING_ANSWER", "42").unwrap();
//! let mut decoder = FrameDecoder::new();
//! let (head, tail) = bytes.split_at(7);
//! assert!(decoder.feed(head).is_empty());
//! let frames = decoder.feed(tail);
//! assert_eq!(frames[0].payload, "42");
//! ```

mod decoder;
mod error;
mod frame;
mod framing;
mod types;

pub use decoder::{DEFAULT_MAX_FRAME_SIZE, DecoderMode, FrameDecoder};
pub use error::{ProtocolError, ProtocolResult};
pub use frame::{
    ANSWER_FRAME, DOCUMENT_LOAD_EVENT, END_SUFFIX, Frame, FrameKind, MAX_NAME_LEN, QUESTION_FRAME,
    SELECT_LANGUAGE_FRAME, START_SUFFIX, end_marker, is_valid_name, start_marker,
};
pub use framing::{FrameWriter, encode_frame, encode_question};
pub use types::{ChatMessage, DocumentNotice, OutboundQuestion, UiCommand, UiEvent};
