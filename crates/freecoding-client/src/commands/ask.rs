//! One-shot question.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use freecoding_bridge::{Bridge, BridgeExit, SignalHandler};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Asks `question`, prints the answer and stops the backend.
///
/// The question is queued before the backend starts and is written as soon
/// as its stdin is attached.
pub async fn run(config: &ClientConfig, question: String) -> ClientResult<()> {
    let mut bridge = Bridge::new(config.to_bridge_config())?;
    let signals = SignalHandler::new();
    signals.spawn_listener()?;

    let (answer_tx, mut answer_rx) = oneshot::channel();
    let done = signals.shutdown_handle();
    bridge.ask(question, move |answer| {
        let _ = answer_tx.send(answer);
        done.trigger();
    });

    let (_commands_tx, commands) = mpsc::channel(1);
    let (events_tx, _events) = mpsc::unbounded_channel();
    let exit = bridge.run(commands, events_tx, signals.shutdown()).await?;
    debug!(?exit, "Ask session ended");

    if let Ok(answer) = answer_rx.try_recv() {
        println!("{}", answer);
        return Ok(());
    }

    match exit {
        BridgeExit::BackendExited(code) => Err(ClientError::BackendExited(code)),
        BridgeExit::Shutdown | BridgeExit::UiClosed => Err(ClientError::Interrupted),
    }
}
