//! Dispatch of decoded frames to the channel.
//!
//! This is the only place a frame name gets meaning: the answer frame goes
//! to the answer slot, every other name is a generic event keyed by name.

use tracing::debug;

use freecoding_protocol::{Frame, FrameKind};

use crate::channel::Channel;
use crate::error::{BridgeError, BridgeResult};

/// An inbound frame, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Payload of an answer frame.
    Answer(String),
    /// Any other frame, delivered by name.
    Event {
        /// Frame name, used as the subscription key.
        name: String,
        /// Frame payload.
        payload: String,
    },
}

impl From<Frame> for Inbound {
    fn from(frame: Frame) -> Self {
        match frame.kind() {
            FrameKind::Answer => Self::Answer(frame.payload),
            FrameKind::Question | FrameKind::SelectLanguage | FrameKind::Event => Self::Event {
                name: frame.name,
                payload: frame.payload,
            },
        }
    }
}

/// What happened to a routed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Delivered to the answer listener.
    Answer,
    /// Delivered to an event subscriber.
    Event,
    /// No subscriber for the event; dropped.
    Dropped,
}

/// Routes frames into a [`Channel`].
#[derive(Debug, Default, Clone, Copy)]
pub struct EventRouter;

impl EventRouter {
    /// Creates a router.
    pub fn new() -> Self {
        Self
    }

    /// Routes one frame.
    ///
    /// # Errors
    ///
    /// Fails only when an answer arrives with no answer listener registered.
    pub fn route(&self, channel: &mut Channel, frame: Frame) -> BridgeResult<Routed> {
        match Inbound::from(frame) {
            Inbound::Answer(payload) => {
                debug!(bytes = payload.len(), "Routing answer");
                channel.deliver_answer(payload)?;
                Ok(Routed::Answer)
            }
            Inbound::Event { name, payload } => {
                if channel.publish(&name, &payload) {
                    debug!(event = %name, "Routed event");
                    Ok(Routed::Event)
                } else {
                    Ok(Routed::Dropped)
                }
            }
        }
    }

    /// Routes frames in order, stopping at the first contract violation.
    ///
    /// Frames after a failing one are left undelivered and returned with the
    /// error so the caller can decide whether to keep routing them.
    pub fn route_all(
        &self,
        channel: &mut Channel,
        frames: Vec<Frame>,
    ) -> Result<Vec<Routed>, (BridgeError, Vec<Frame>)> {
        let mut outcomes = Vec::with_capacity(frames.len());
        let mut frames = frames.into_iter();
        while let Some(frame) = frames.next() {
            match self.route(channel, frame) {
                Ok(routed) => outcomes.push(routed),
                Err(e) => return Err((e, frames.collect())),
            }
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freecoding_protocol::{ANSWER_FRAME, FrameDecoder};
    use std::sync::{Arc, Mutex};

    #[test]
    fn classifies_answer_and_events() {
        assert_eq!(
            Inbound::from(Frame::new(ANSWER_FRAME, "x")),
            Inbound::Answer("x".into())
        );
        assert_eq!(
            Inbound::from(Frame::new("SELECT_LANGUAGE", "es")),
            Inbound::Event {
                name: "SELECT_LANGUAGE".into(),
                payload: "es".into()
            }
        );
    }

    #[test]
    fn answer_frame_reaches_answer_listener() {
        let mut channel = Channel::default();
        let got = Arc::new(Mutex::new(None));
        let sink = got.clone();
        channel.set_answer_listener(move |a| *sink.lock().unwrap() = Some(a));

        let routed = EventRouter::new()
            .route(&mut channel, Frame::new(ANSWER_FRAME, "hello"))
            .unwrap();
        assert_eq!(routed, Routed::Answer);
        assert_eq!(got.lock().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn answer_without_listener_fails() {
        let mut channel = Channel::default();
        let result = EventRouter::new().route(&mut channel, Frame::new(ANSWER_FRAME, "x"));
        assert!(matches!(result, Err(BridgeError::NoAnswerListener)));
    }

    #[test]
    fn unsubscribed_event_is_dropped() {
        let mut channel = Channel::default();
        let routed = EventRouter::new()
            .route(&mut channel, Frame::new("NEW_THING", "x"))
            .unwrap();
        assert_eq!(routed, Routed::Dropped);
    }

    #[test]
    fn answer_is_not_published_as_event() {
        let mut channel = Channel::default();
        let published = Arc::new(Mutex::new(0));
        let sink = published.clone();
        channel.subscribe(ANSWER_FRAME, move |_: &str| *sink.lock().unwrap() += 1);
        channel.set_answer_listener(|_| {});

        EventRouter::new()
            .route(&mut channel, Frame::new(ANSWER_FRAME, "x"))
            .unwrap();
        assert_eq!(*published.lock().unwrap(), 0);
    }

    #[test]
    fn route_all_stops_at_violation() {
        let mut channel = Channel::default();
        channel.subscribe("EV", |_: &str| {});
        channel.set_answer_listener(|_| {});

        let frames = vec![
            Frame::new(ANSWER_FRAME, "first"),
            Frame::new(ANSWER_FRAME, "second"),
            Frame::new("EV", "after"),
        ];
        let (err, rest) = EventRouter::new()
            .route_all(&mut channel, frames)
            .unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(rest, vec![Frame::new("EV", "after")]);
    }

    #[test]
    fn end_to_end_noise_answer_trailer() {
        let mut decoder = FrameDecoder::new();
        let mut channel = Channel::default();
        let answers = Arc::new(Mutex::new(Vec::new()));
        let sink = answers.clone();
        channel.set_answer_listener(move |a| sink.lock().unwrap().push(a));

        let frames =
            decoder.feed(b"noise\nFREECODING_ANSWER START\nhello\nFREECODING_ANSWER END\nmore");
        let outcomes = EventRouter::new().route_all(&mut channel, frames).unwrap();

        assert_eq!(outcomes, vec![Routed::Answer]);
        assert_eq!(*answers.lock().unwrap(), vec!["hello".to_string()]);
        // "more" can never grow into a marker, so it is already gone.
        assert_eq!(decoder.pending_len(), 0);
    }
}
