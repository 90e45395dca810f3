//! Bridge between a chat front-end and an answering backend process.
//!
//! This crate provides:
//! - A [`Channel`] that buffers questions until a writer is attached, holds
//!   the single pending answer listener and keeps event subscriptions
//! - An [`EventRouter`] that hands decoded frames to the channel
//! - Supervision of the backend process and its stdio pipes
//! - The [`Bridge`] loop tying them together
//!
//! # Example
//!
//! ```rust,no_run
//! use freecoding_bridge::{BackendCommand, Bridge, BridgeConfig, ShutdownSignal};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BridgeConfig::new(BackendCommand::new("jbang").arg("freecoding.java"));
//!     let mut bridge = Bridge::new(config)?;
//!     bridge.ask("What does this repository do?", |answer| println!("{answer}"));
//!
//!     let (_commands_tx, commands) = mpsc::channel(16);
//!     let (events, _events_rx) = mpsc::unbounded_channel();
//!     bridge.run(commands, events, ShutdownSignal::never()).await?;
//!     Ok(())
//! }
//! ```

mod backend;
mod bridge;
mod channel;
mod config;
mod error;
mod router;
mod signals;

pub use backend::{BackendProcess, spawn_question_writer, spawn_stderr_forwarder};
pub use bridge::{Bridge, BridgeExit};
pub use channel::{AnswerListener, Channel, EventListener, QuestionListener, Session};
pub use config::{BackendCommand, BridgeConfig, DEFAULT_BACKEND_PROGRAM};
pub use error::{BridgeError, BridgeResult};
pub use router::{EventRouter, Inbound, Routed};
pub use signals::{ShutdownHandle, ShutdownSignal, SignalHandler};
