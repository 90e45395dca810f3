//! Marker-delimited frame encoding for the backend's stdin.
//!
//! ```text
//! <NAME> START
//! <payload>
//! <NAME> END
//! ```

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::{
    Frame, QUESTION_FRAME, SELECT_LANGUAGE_FRAME, end_marker, is_valid_name, start_marker,
};
use crate::types::OutboundQuestion;

/// Encodes a frame to bytes ready for transmission.
///
/// Fails if the name could never be decoded, or if the payload contains
/// the frame's own end marker (the frame would be cut short).
///
/// # Example
///
/// ```rust
/// use freecoding_protocol::encode_frame;
///
/// let bytes = encode_frame("SELECT_LANGUAGE", "es").unwrap();
/// assert_eq!(bytes, b"SELECT_LANGUAGE START\nes\nSELECT_LANGUAGE END\n");
/// ```
pub fn encode_frame(name: &str, payload: &str) -> ProtocolResult<Vec<u8>> {
    if !is_valid_name(name) {
        return Err(ProtocolError::invalid_name(name));
    }

    let end = end_marker(name);
    if payload.contains(&end) {
        return Err(ProtocolError::payload_contains_end_marker(name));
    }

    let start = start_marker(name);
    let mut buffer = Vec::with_capacity(start.len() + payload.len() + end.len() + 3);
    buffer.extend_from_slice(start.as_bytes());
    buffer.push(b'\n');
    buffer.extend_from_slice(payload.as_bytes());
    buffer.push(b'\n');
    buffer.extend_from_slice(end.as_bytes());
    buffer.push(b'\n');
    Ok(buffer)
}

/// Encodes a question as the `SELECT_LANGUAGE` + `FREECODING_QUESTION` pair.
pub fn encode_question(question: &OutboundQuestion) -> ProtocolResult<Vec<u8>> {
    let mut buffer = encode_frame(SELECT_LANGUAGE_FRAME, question.language.code())?;
    buffer.extend(encode_frame(QUESTION_FRAME, &question.text)?);
    Ok(buffer)
}

/// Writes frames to an async byte stream (the backend's stdin).
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Creates a new FrameWriter wrapping the given writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a single frame and flushes.
    pub async fn write_frame(&mut self, frame: &Frame) -> ProtocolResult<()> {
        let data = encode_frame(&frame.name, &frame.payload)?;
        self.writer.write_all(&data).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Writes a question, preceded by its language selection, and flushes.
    ///
    /// Both frames are encoded before anything is written, so an invalid
    /// question never leaves a lone language frame on the stream.
    pub async fn write_question(&mut self, question: &OutboundQuestion) -> ProtocolResult<()> {
        let data = encode_question(question)?;
        debug!(
            language = %question.language,
            bytes = data.len(),
            "Writing question to backend"
        );
        self.writer.write_all(&data).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwraps this FrameWriter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
