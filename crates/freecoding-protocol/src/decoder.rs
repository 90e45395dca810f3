//! Incremental decoder for marker-delimited frames.
//!
//! The backend writes frames onto its stdout as
//!
//! ```text
//! <NAME> START
//! <payload, may span lines>
//! <NAME> END
//! ```
//!
//! mixed with arbitrary other output (logging, banners). Bytes arrive in
//! chunks of any size, so [`FrameDecoder::feed`] keeps partial state across
//! calls and yields the same frames whatever the chunking.
//!
//! # Rules
//!
//! - Idle: scan for the first `NAME START` at the beginning of a line. Bytes
//!   before it are noise and are dropped. If there is no marker, everything
//!   is dropped except an unterminated last line that could still grow into
//!   a start marker (`FREECODING_ANS` waiting for `WER START`). Names longer
//!   than [`MAX_NAME_LEN`] never form a marker, which bounds that line.
//! - Capturing: wait for the literal `NAME END` of the same name. Another
//!   `OTHER START` in between is ordinary payload; frames never nest.
//! - A completed frame's payload is trimmed of surrounding whitespace, and
//!   the remaining buffer is scanned again before `feed` returns.
//!
//! Whether the buffer starts on a line boundary is tracked explicitly, so a
//! marker split from its preceding newline by a chunk boundary (or by a
//! discarded noise line) is judged exactly as in the unsplit stream.

use std::sync::LazyLock;

use regex::bytes::Regex;
use tracing::{debug, trace, warn};

use crate::frame::{Frame, MAX_NAME_LEN, START_SUFFIX, end_marker, is_name_byte};

/// Default upper bound on a single frame's payload (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A start marker anchored at the beginning of a line.
static START_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Z_]+) START").expect("Invalid start marker regex")
});

/// What the decoder is currently doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderMode {
    /// No open frame; scanning for the next start marker.
    Idle,
    /// A start marker for this name was consumed; accumulating payload.
    Capturing(String),
}

/// Stateful decoder turning a chunked byte stream into [`Frame`]s.
#[derive(Debug)]
pub struct FrameDecoder {
    mode: DecoderMode,
    buffer: Vec<u8>,
    /// True when `buffer[0]` sits right after a newline (or at stream start).
    at_line_start: bool,
    /// Matches `NAME END` of the open frame.
    end_pattern: Option<Regex>,
    end_len: usize,
    /// Where the next end-marker search may begin.
    search_from: usize,
    /// The open frame is already known to exceed `max_frame_size`.
    oversized: bool,
    max_frame_size: Option<usize>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Creates a decoder with the default frame size limit.
    pub fn new() -> Self {
        Self::with_max_frame_size(Some(DEFAULT_MAX_FRAME_SIZE))
    }

    /// Creates a decoder with a custom frame size limit (`None` disables it).
    ///
    /// Frames whose payload exceeds the limit are dropped like noise.
    pub fn with_max_frame_size(max_frame_size: Option<usize>) -> Self {
        Self {
            mode: DecoderMode::Idle,
            buffer: Vec::new(),
            at_line_start: true,
            end_pattern: None,
            end_len: 0,
            search_from: 0,
            oversized: false,
            max_frame_size,
        }
    }

    /// Returns the current mode.
    pub fn mode(&self) -> &DecoderMode {
        &self.mode
    }

    /// Returns the name of the open frame, if any.
    pub fn capturing(&self) -> Option<&str> {
        match &self.mode {
            DecoderMode::Capturing(name) => Some(name),
            DecoderMode::Idle => None,
        }
    }

    /// Returns the number of bytes retained for the next call to `feed`.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drops all partial state, as after a disconnect.
    pub fn reset(&mut self) {
        *self = Self::with_max_frame_size(self.max_frame_size);
    }

    /// Appends a chunk and returns every frame completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        loop {
            let progressed = match self.mode {
                DecoderMode::Idle => self.open_frame(),
                DecoderMode::Capturing(_) => self.close_frame(&mut frames),
            };
            if !progressed {
                break;
            }
        }
        frames
    }

    /// Looks for the next start marker. Returns true if one was consumed.
    fn open_frame(&mut self) -> bool {
        let found = START_MARKER
            .captures_iter(&self.buffer)
            .filter_map(|caps| Some((caps.get(0)?, caps.get(1)?)))
            .find(|(marker, name)| {
                (marker.start() > 0 || self.at_line_start) && name.len() <= MAX_NAME_LEN
            })
            .map(|(marker, name)| {
                (
                    marker.start(),
                    marker.end(),
                    String::from_utf8_lossy(name.as_bytes()).into_owned(),
                )
            });

        let Some((start, end, name)) = found else {
            self.discard_noise();
            return false;
        };

        if start > 0 {
            trace!(bytes = start, "Discarding noise before start marker");
        }
        self.buffer.drain(..end);

        let marker = end_marker(&name);
        match Regex::new(&regex::escape(&marker)) {
            Ok(pattern) => self.end_pattern = Some(pattern),
            Err(e) => {
                warn!(name = %name, error = %e, "Cannot match end marker, ignoring frame");
                self.at_line_start = false;
                return true;
            }
        }
        self.end_len = marker.len();
        self.search_from = 0;
        self.oversized = false;
        self.mode = DecoderMode::Capturing(name);
        true
    }

    /// Looks for the end marker of the open frame. Returns true if the frame
    /// was closed.
    fn close_frame(&mut self, frames: &mut Vec<Frame>) -> bool {
        let found = self
            .end_pattern
            .as_ref()
            .and_then(|pattern| pattern.find_at(&self.buffer, self.search_from))
            .map(|m| m.start());

        let Some(end) = found else {
            // The marker may already have started in the last few bytes.
            let tail = self.end_len.saturating_sub(1);
            let resume = self.buffer.len().saturating_sub(tail);
            if !self.oversized && self.exceeds_limit(resume) {
                warn!(
                    name = self.capturing().unwrap_or_default(),
                    max = self.max_frame_size.unwrap_or_default(),
                    "Frame exceeds size limit, dropping it"
                );
                self.oversized = true;
            }
            if self.oversized {
                self.buffer.drain(..resume);
                self.search_from = 0;
            } else {
                self.search_from = resume;
            }
            return false;
        };

        let mode = std::mem::replace(&mut self.mode, DecoderMode::Idle);
        if let DecoderMode::Capturing(name) = mode {
            if self.oversized {
                debug!(name = %name, "Skipped oversized frame");
            } else if self.exceeds_limit(end) {
                warn!(
                    name = %name,
                    size = end,
                    max = self.max_frame_size.unwrap_or_default(),
                    "Frame exceeds size limit, dropping it"
                );
            } else {
                let payload = String::from_utf8_lossy(&self.buffer[..end])
                    .trim()
                    .to_string();
                let frame = Frame { name, payload };
                debug!(frame = %frame, "Decoded frame");
                frames.push(frame);
            }
        }

        self.buffer.drain(..end + self.end_len);
        self.end_pattern = None;
        self.end_len = 0;
        self.search_from = 0;
        self.oversized = false;
        self.at_line_start = false;
        true
    }

    /// Drops buffered noise, keeping only an unterminated last line that may
    /// still become a start marker.
    fn discard_noise(&mut self) {
        let (fragment_start, line_start) = match self.buffer.iter().rposition(|&b| b == b'\n') {
            Some(newline) => (newline + 1, true),
            None => (0, self.at_line_start),
        };

        if line_start && could_start_marker(&self.buffer[fragment_start..]) {
            if fragment_start > 0 {
                trace!(bytes = fragment_start, "Discarding noise");
            }
            self.buffer.drain(..fragment_start);
            self.at_line_start = true;
        } else {
            if !self.buffer.is_empty() {
                trace!(bytes = self.buffer.len(), "Discarding noise");
            }
            self.buffer.clear();
            self.at_line_start = false;
        }
    }

    fn exceeds_limit(&self, len: usize) -> bool {
        self.max_frame_size.is_some_and(|max| len > max)
    }
}

/// Returns true if `fragment` is a prefix of some `NAME START` marker.
fn could_start_marker(fragment: &[u8]) -> bool {
    let name_len = fragment.iter().take_while(|&&b| is_name_byte(b)).count();
    if name_len > MAX_NAME_LEN {
        return false;
    }
    let rest = &fragment[name_len..];
    rest.is_empty() || (name_len > 0 && START_SUFFIX.as_bytes().starts_with(rest))
}
