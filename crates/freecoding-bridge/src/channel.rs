//! Question/answer coordination between the UI side and the backend.
//!
//! The channel owns three independent pieces of session state:
//!
//! - the question outlet, which buffers questions until the backend writer
//!   attaches and then forwards them directly;
//! - the answer slot, a single listener for the next answer frame;
//! - the subscription registry for named side-channel events.
//!
//! Everything here is synchronous. Listeners run inline and are expected to
//! hand work off (to a queue, a task) rather than block.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use tracing::{debug, trace, warn};

use freecoding_core::Language;
use freecoding_protocol::OutboundQuestion;

use crate::error::{BridgeError, BridgeResult};

/// Receives every question bound for the backend.
pub type QuestionListener = Box<dyn FnMut(OutboundQuestion) + Send>;

/// Receives one answer.
pub type AnswerListener = Box<dyn FnOnce(String) + Send>;

/// Receives the payloads of one named event.
pub type EventListener = Box<dyn FnMut(&str) + Send>;

/// Where submitted questions go.
enum QuestionOutlet {
    /// No listener yet; questions wait in submission order.
    Buffering(VecDeque<OutboundQuestion>),
    /// Questions go straight to the listener.
    Attached(QuestionListener),
}

/// Session-scoped settings read when a question is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    language: Language,
}

impl Session {
    /// Creates a session with the given language.
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Returns the selected language.
    pub fn language(&self) -> &Language {
        &self.language
    }
}

/// The coordination object between the UI side and the framed stream.
pub struct Channel {
    outlet: QuestionOutlet,
    answer_slot: Option<AnswerListener>,
    subscriptions: HashMap<String, EventListener>,
    session: Session,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("attached", &self.is_attached())
            .field("pending_questions", &self.pending_questions())
            .field("answer_pending", &self.has_answer_listener())
            .field("subscriptions", &self.subscriptions.len())
            .field("session", &self.session)
            .finish()
    }
}

impl Channel {
    /// Creates a channel in buffering mode with the given language.
    pub fn new(language: Language) -> Self {
        Self {
            outlet: QuestionOutlet::Buffering(VecDeque::new()),
            answer_slot: None,
            subscriptions: HashMap::new(),
            session: Session::new(language),
        }
    }

    // --- questions ---

    /// Submits a question, stamped with the current language.
    ///
    /// Goes to the question listener if one is attached, otherwise waits in
    /// the buffer.
    pub fn submit_question(&mut self, text: impl Into<String>) {
        let question = OutboundQuestion::new(text, self.session.language.clone());
        match &mut self.outlet {
            QuestionOutlet::Attached(listener) => listener(question),
            QuestionOutlet::Buffering(pending) => {
                pending.push_back(question);
                debug!(pending = pending.len(), "Buffered question");
            }
        }
    }

    /// Installs the question listener and flushes the buffer to it, in
    /// submission order, before returning.
    ///
    /// Attaching again replaces the listener; the buffer is already empty.
    pub fn attach_question_listener<F>(&mut self, listener: F)
    where
        F: FnMut(OutboundQuestion) + Send + 'static,
    {
        let mut listener: QuestionListener = Box::new(listener);
        let previous = std::mem::replace(
            &mut self.outlet,
            QuestionOutlet::Buffering(VecDeque::new()),
        );
        if let QuestionOutlet::Buffering(pending) = previous {
            if !pending.is_empty() {
                debug!(count = pending.len(), "Flushing buffered questions");
            }
            for question in pending {
                listener(question);
            }
        }
        self.outlet = QuestionOutlet::Attached(listener);
    }

    /// Returns true once a question listener is attached.
    pub fn is_attached(&self) -> bool {
        matches!(self.outlet, QuestionOutlet::Attached(_))
    }

    /// Returns the number of buffered questions.
    pub fn pending_questions(&self) -> usize {
        match &self.outlet {
            QuestionOutlet::Buffering(pending) => pending.len(),
            QuestionOutlet::Attached(_) => 0,
        }
    }

    // --- answers ---

    /// Installs the listener for the next answer, replacing any previous one.
    ///
    /// Returns true if a listener was replaced. There is one slot: a second
    /// question asked before the first is answered takes the slot over.
    pub fn set_answer_listener<F>(&mut self, listener: F) -> bool
    where
        F: FnOnce(String) + Send + 'static,
    {
        let replaced = self.answer_slot.replace(Box::new(listener)).is_some();
        if replaced {
            warn!("Replacing an answer listener that was still waiting");
        }
        replaced
    }

    /// Returns true if an answer listener is waiting.
    pub fn has_answer_listener(&self) -> bool {
        self.answer_slot.is_some()
    }

    /// Hands an answer to the waiting listener and empties the slot.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NoAnswerListener`] if no listener is waiting,
    /// including a second answer for an already answered question.
    pub fn deliver_answer(&mut self, text: impl Into<String>) -> BridgeResult<()> {
        let listener = self.answer_slot.take().ok_or(BridgeError::NoAnswerListener)?;
        listener(text.into());
        Ok(())
    }

    /// Registers the answer listener, then submits the question.
    pub fn ask<F>(&mut self, text: impl Into<String>, on_answer: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.set_answer_listener(on_answer);
        self.submit_question(text);
    }

    // --- named events ---

    /// Subscribes to a named event. Returns true if a subscriber was replaced.
    pub fn subscribe<F>(&mut self, event: impl Into<String>, listener: F) -> bool
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.subscriptions
            .insert(event.into(), Box::new(listener))
            .is_some()
    }

    /// Removes the subscriber for an event. Returns true if there was one.
    pub fn unsubscribe(&mut self, event: &str) -> bool {
        self.subscriptions.remove(event).is_some()
    }

    /// Returns true if someone is subscribed to `event`.
    pub fn is_subscribed(&self, event: &str) -> bool {
        self.subscriptions.contains_key(event)
    }

    /// Publishes an event. Returns false (and does nothing) if nobody is
    /// subscribed.
    pub fn publish(&mut self, event: &str, payload: &str) -> bool {
        match self.subscriptions.get_mut(event) {
            Some(listener) => {
                listener(payload);
                true
            }
            None => {
                trace!(event, "No subscriber for event, dropping it");
                false
            }
        }
    }

    // --- session ---

    /// Selects the language for questions submitted from now on.
    pub fn set_language(&mut self, language: impl Into<Language>) {
        let language = language.into();
        debug!(language = %language, "Language selected");
        self.session.language = language;
    }

    /// Returns the selected language.
    pub fn current_language(&self) -> &Language {
        self.session.language()
    }

    /// Returns the session settings.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log<T> = Arc<Mutex<Vec<T>>>;

    fn log<T>() -> Log<T> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn texts(log: &Log<OutboundQuestion>) -> Vec<String> {
        log.lock().unwrap().iter().map(|q| q.text.clone()).collect()
    }

    #[test]
    fn questions_before_attach_are_flushed_in_order_once() {
        let mut channel = Channel::default();
        channel.submit_question("a");
        channel.submit_question("b");
        channel.submit_question("c");
        assert_eq!(channel.pending_questions(), 3);
        assert!(!channel.is_attached());

        let seen = log();
        let sink = seen.clone();
        channel.attach_question_listener(move |q| sink.lock().unwrap().push(q));

        assert_eq!(texts(&seen), vec!["a", "b", "c"]);
        assert_eq!(channel.pending_questions(), 0);
        assert!(channel.is_attached());

        channel.submit_question("d");
        assert_eq!(texts(&seen), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn questions_after_attach_go_straight_through() {
        let mut channel = Channel::default();
        let seen = log();
        let sink = seen.clone();
        channel.attach_question_listener(move |q| sink.lock().unwrap().push(q));
        channel.submit_question("now");
        assert_eq!(texts(&seen), vec!["now"]);
        assert_eq!(channel.pending_questions(), 0);
    }

    #[test]
    fn reattaching_replaces_the_listener() {
        let mut channel = Channel::default();
        let first = log();
        let second = log();
        let sink = first.clone();
        channel.attach_question_listener(move |q| sink.lock().unwrap().push(q));
        let sink = second.clone();
        channel.attach_question_listener(move |q| sink.lock().unwrap().push(q));

        channel.submit_question("x");
        assert!(texts(&first).is_empty());
        assert_eq!(texts(&second), vec!["x"]);
    }

    #[test]
    fn buffered_questions_keep_their_language() {
        let mut channel = Channel::new(Language::new("en"));
        channel.submit_question("first");
        channel.set_language("es");
        channel.submit_question("second");

        let seen = log();
        let sink = seen.clone();
        channel.attach_question_listener(move |q| sink.lock().unwrap().push(q));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].language.code(), "en");
        assert_eq!(seen[1].language.code(), "es");
    }

    #[test]
    fn language_change_applies_to_next_question() {
        let mut channel = Channel::default();
        let seen = log();
        let sink = seen.clone();
        channel.attach_question_listener(move |q| sink.lock().unwrap().push(q));

        channel.submit_question("one");
        channel.set_language("fr");
        channel.submit_question("two");

        assert_eq!(channel.current_language().code(), "fr");
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].language.code(), "en");
        assert_eq!(seen[1].language.code(), "fr");
    }

    #[test]
    fn deliver_without_listener_is_a_contract_violation() {
        let mut channel = Channel::default();
        let result = channel.deliver_answer("orphan");
        assert!(matches!(result, Err(BridgeError::NoAnswerListener)));
    }

    #[test]
    fn answer_goes_to_listener_and_clears_slot() {
        let mut channel = Channel::default();
        let answers = log();
        let sink = answers.clone();
        channel.set_answer_listener(move |a| sink.lock().unwrap().push(a));
        assert!(channel.has_answer_listener());

        channel.deliver_answer("42").unwrap();
        assert_eq!(*answers.lock().unwrap(), vec!["42".to_string()]);
        assert!(!channel.has_answer_listener());

        // A stray second answer must not reach the old continuation.
        assert!(channel.deliver_answer("late").is_err());
        assert_eq!(answers.lock().unwrap().len(), 1);
    }

    #[test]
    fn newer_answer_listener_wins() {
        let mut channel = Channel::default();
        let first = log();
        let second = log();
        let sink = first.clone();
        assert!(!channel.set_answer_listener(move |a| sink.lock().unwrap().push(a)));
        let sink = second.clone();
        assert!(channel.set_answer_listener(move |a| sink.lock().unwrap().push(a)));

        channel.deliver_answer("answer").unwrap();
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn ask_registers_before_submitting() {
        let mut channel = Channel::default();
        let answers = log();
        let sink = answers.clone();
        channel.ask("q", move |a| sink.lock().unwrap().push(a));
        assert!(channel.has_answer_listener());
        assert_eq!(channel.pending_questions(), 1);

        channel.deliver_answer("a").unwrap();
        assert_eq!(*answers.lock().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn publish_reaches_only_the_matching_subscriber() {
        let mut channel = Channel::default();
        let docs = log();
        let sink = docs.clone();
        channel.subscribe("DOCUMENT_LOAD", move |p: &str| {
            sink.lock().unwrap().push(p.to_string())
        });

        assert!(!channel.publish("OTHER_EVENT", "x"));
        assert!(docs.lock().unwrap().is_empty());

        assert!(channel.publish("DOCUMENT_LOAD", "report.pdf"));
        assert_eq!(*docs.lock().unwrap(), vec!["report.pdf".to_string()]);
    }

    #[test]
    fn subscribing_again_replaces_the_subscriber() {
        let mut channel = Channel::default();
        let first = log();
        let second = log();
        let sink = first.clone();
        assert!(!channel.subscribe("EV", move |p: &str| {
            sink.lock().unwrap().push(p.to_string())
        }));
        let sink = second.clone();
        assert!(channel.subscribe("EV", move |p: &str| {
            sink.lock().unwrap().push(p.to_string())
        }));

        channel.publish("EV", "payload");
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut channel = Channel::default();
        channel.subscribe("EV", |_: &str| {});
        assert!(channel.is_subscribed("EV"));
        assert!(channel.unsubscribe("EV"));
        assert!(!channel.unsubscribe("EV"));
        assert!(!channel.publish("EV", "x"));
    }

    #[test]
    fn unknown_language_codes_pass_through() {
        let mut channel = Channel::default();
        channel.set_language("tlh");
        assert_eq!(channel.current_language().code(), "tlh");
        assert_eq!(channel.session().language().code(), "tlh");
    }

    #[test]
    fn debug_output_summarizes_state() {
        let mut channel = Channel::default();
        channel.submit_question("q");
        let debug = format!("{channel:?}");
        assert!(debug.contains("pending_questions: 1"));
        assert!(debug.contains("attached: false"));
    }
}
