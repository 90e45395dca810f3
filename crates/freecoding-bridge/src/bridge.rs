//! The bridge session: one backend process, one channel, one loop.
//!
//! All protocol state (decoder, channel, router) is owned by the loop and
//! touched from nowhere else. Each stdout chunk is decoded, routed and
//! delivered completely before the next event is handled.

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use freecoding_protocol::{DOCUMENT_LOAD_EVENT, FrameDecoder, UiCommand, UiEvent};

use crate::backend::{
    BackendProcess, spawn_question_writer, spawn_stderr_forwarder,
};
use crate::channel::Channel;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::router::EventRouter;
use crate::signals::ShutdownSignal;

/// Size of a single read from the backend's stdout.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// How long to wait for the stderr forwarder after the backend is gone.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeExit {
    /// The backend closed its stdout and exited with this code.
    BackendExited(Option<i32>),
    /// A shutdown was requested; the backend was killed.
    Shutdown,
    /// The UI command stream closed; the backend was killed.
    UiClosed,
}

/// A question/answer session with one backend process.
#[derive(Debug)]
pub struct Bridge {
    config: BridgeConfig,
    channel: Channel,
    decoder: FrameDecoder,
    router: EventRouter,
}

impl Bridge {
    /// Creates a session. Nothing is spawned until [`run`](Self::run).
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        let channel = Channel::new(config.default_language.clone());
        let decoder = FrameDecoder::with_max_frame_size(config.max_frame_size);
        Ok(Self {
            config,
            channel,
            decoder,
            router: EventRouter::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Returns the channel for registering listeners before `run`.
    pub fn channel_mut(&mut self) -> &mut Channel {
        &mut self.channel
    }

    /// Asks a question ahead of `run`. It is buffered and written as soon
    /// as the backend is up.
    pub fn ask<F>(&mut self, text: impl Into<String>, on_answer: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.channel.ask(text, on_answer);
    }

    /// Spawns the backend and runs the session until the backend exits, the
    /// UI goes away, or `shutdown` fires.
    ///
    /// UI commands come in through `commands`; everything the UI should show
    /// goes out through `events`.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<UiCommand>,
        events: mpsc::UnboundedSender<UiEvent>,
        shutdown: ShutdownSignal,
    ) -> BridgeResult<BridgeExit> {
        let mut backend = BackendProcess::spawn(&self.config.backend)?;
        let stdin = backend.take_stdin()?;
        let mut stdout = backend.take_stdout()?;
        let stderr = backend.take_stderr()?;

        let (questions, writer_task) = spawn_question_writer(stdin);
        let stderr_events = self.config.forward_stderr.then(|| events.clone());
        let stderr_task = spawn_stderr_forwarder(stderr, stderr_events);

        self.channel.attach_question_listener(move |question| {
            if questions.send(question).is_err() {
                warn!("Backend writer has stopped, dropping question");
            }
        });

        let documents = events.clone();
        self.channel
            .subscribe(DOCUMENT_LOAD_EVENT, move |payload: &str| {
                let _ = documents.send(UiEvent::document_loaded(payload));
            });

        let shutdown = shutdown.wait();
        tokio::pin!(shutdown);
        let mut buf = vec![0u8; READ_CHUNK_SIZE];

        let exit = loop {
            tokio::select! {
                read = stdout.read(&mut buf) => match read {
                    Ok(0) => break None,
                    Ok(n) => self.on_output(&buf[..n], &events),
                    Err(e) => {
                        error!(error = %e, "Failed to read backend output");
                        backend.kill().await?;
                        break None;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command, &events),
                    None => {
                        info!("UI closed, stopping backend");
                        break Some(BridgeExit::UiClosed);
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping backend");
                    break Some(BridgeExit::Shutdown);
                }
            }
        };

        let exit = match exit {
            Some(exit) => {
                backend.kill().await?;
                exit
            }
            // Stdout closed; the process may still linger.
            None => tokio::select! {
                status = backend.wait() => {
                    let code = status?.code();
                    let _ = events.send(UiEvent::BackendExited { code });
                    BridgeExit::BackendExited(code)
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested while waiting for backend exit");
                    backend.kill().await?;
                    BridgeExit::Shutdown
                }
            },
        };

        self.decoder.reset();
        writer_task.abort();
        if tokio::time::timeout(STDERR_DRAIN_TIMEOUT, stderr_task)
            .await
            .is_err()
        {
            debug!("Backend stderr still open after exit");
        }

        if self.channel.has_answer_listener() {
            debug!("Session ended with a question still unanswered");
        }
        Ok(exit)
    }

    fn on_output(&mut self, chunk: &[u8], events: &mpsc::UnboundedSender<UiEvent>) {
        trace!(bytes = chunk.len(), "Backend output");
        let mut frames = self.decoder.feed(chunk);
        while let Err((e, rest)) = self.router.route_all(&mut self.channel, frames) {
            report(&e, events);
            frames = rest;
        }
    }

    fn on_command(&mut self, command: UiCommand, events: &mpsc::UnboundedSender<UiEvent>) {
        match command {
            UiCommand::SendMessage(text) => {
                let answers = events.clone();
                self.channel.ask(text, move |answer| {
                    let _ = answers.send(UiEvent::answer(answer));
                });
            }
            UiCommand::ChangeLanguage(code) => self.channel.set_language(code),
            UiCommand::Unknown(kind) => debug!(kind = %kind, "Ignoring unknown UI command"),
        }
    }
}

/// Reports a routing failure to the operator and the UI.
fn report(e: &BridgeError, events: &mpsc::UnboundedSender<UiEvent>) {
    if e.is_contract_violation() {
        error!(error = %e, "Internal error while routing backend output");
    } else {
        warn!(error = %e, "Failed to route backend output");
    }
    let _ = events.send(UiEvent::InternalError {
        message: e.to_string(),
    });
}
