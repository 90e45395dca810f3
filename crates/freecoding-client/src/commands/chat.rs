//! JSON-lines chat console.
//!
//! Each stdin line is one UI command such as
//! `{"type":"sendMessage","data":"What does main do?"}`; each stdout line is
//! one UI event. Sent messages are echoed back as user messages so the
//! transcript on stdout is complete.

use std::io::{self, BufRead};
use std::thread;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use freecoding_bridge::{Bridge, BridgeExit, SignalHandler};
use freecoding_protocol::{UiCommand, UiEvent};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Commands read ahead of the bridge loop.
const COMMAND_QUEUE: usize = 32;

/// Runs an interactive session until stdin closes, the backend exits, or a
/// termination signal arrives.
pub async fn run(config: &ClientConfig) -> ClientResult<()> {
    let bridge = Bridge::new(config.to_bridge_config())?;
    let signals = SignalHandler::new();
    signals.spawn_listener()?;

    let (commands_tx, commands) = mpsc::channel(COMMAND_QUEUE);
    let (events_tx, events) = mpsc::unbounded_channel();

    // Stdin reads block; a plain thread keeps them off the runtime and does
    // not hold up process exit.
    spawn_stdin_reader(commands_tx, events_tx.downgrade())?;
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        write_events(&mut stdout, events).await
    });

    let exit = bridge.run(commands, events_tx, signals.shutdown()).await;

    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to write UI events"),
        Err(e) => warn!(error = %e, "Event writer panicked"),
    }

    match exit? {
        BridgeExit::BackendExited(Some(0)) => Ok(()),
        BridgeExit::BackendExited(code) => Err(ClientError::BackendExited(code)),
        BridgeExit::Shutdown | BridgeExit::UiClosed => {
            info!("Chat session closed");
            Ok(())
        }
    }
}

fn spawn_stdin_reader(
    commands: mpsc::Sender<UiCommand>,
    events: mpsc::WeakUnboundedSender<UiEvent>,
) -> io::Result<()> {
    thread::Builder::new()
        .name("freecoding-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                };
                match interpret(&line) {
                    None => continue,
                    Some(Ok(command)) => {
                        if let Some(echo) = echo(&command) {
                            post(&events, echo);
                        }
                        if commands.blocking_send(command).is_err() {
                            break;
                        }
                    }
                    Some(Err(report)) => post(&events, report),
                }
            }
            debug!("Stdin reader stopped");
        })?;
    Ok(())
}

/// Parses one input line. Blank lines yield nothing; malformed lines yield
/// an error event for the UI.
fn interpret(line: &str) -> Option<Result<UiCommand, UiEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(UiCommand::from_json(line).map_err(|e| {
        warn!(error = %e, "Ignoring malformed UI command");
        UiEvent::InternalError {
            message: format!("malformed command: {}", e),
        }
    }))
}

/// The transcript entry shown for a command, if any.
fn echo(command: &UiCommand) -> Option<UiEvent> {
    match command {
        UiCommand::SendMessage(text) => Some(UiEvent::user_message(text.clone())),
        UiCommand::ChangeLanguage(_) | UiCommand::Unknown(_) => None,
    }
}

fn post(events: &mpsc::WeakUnboundedSender<UiEvent>, event: UiEvent) {
    if let Some(events) = events.upgrade() {
        let _ = events.send(event);
    }
}

/// Writes events as JSON lines until every sender is gone.
async fn write_events<W>(out: &mut W, mut events: mpsc::UnboundedReceiver<UiEvent>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        let mut line = match event.to_json() {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to serialize UI event");
                continue;
            }
        };
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}
