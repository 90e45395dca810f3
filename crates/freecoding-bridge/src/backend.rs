//! Backend process supervision.
//!
//! The backend is spawned with all three stdio streams piped. Its stdin is
//! fed by a writer task, its stderr is drained by a forwarder task, and its
//! stdout is read by the bridge loop itself.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use freecoding_protocol::{FrameWriter, OutboundQuestion, ProtocolError, UiEvent};

use crate::config::BackendCommand;
use crate::error::{BridgeError, BridgeResult};

/// A running backend process.
#[derive(Debug)]
pub struct BackendProcess {
    child: Child,
    program: String,
}

impl BackendProcess {
    /// Spawns the backend with piped stdio.
    ///
    /// The process is killed if this handle is dropped while it still runs.
    pub fn spawn(command: &BackendCommand) -> BridgeResult<Self> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = command.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd
            .spawn()
            .map_err(|e| BridgeError::spawn(&command.program, e))?;

        info!(
            program = %command.program,
            args = ?command.args,
            pid = ?child.id(),
            "Backend spawned"
        );

        Ok(Self {
            child,
            program: command.program.clone(),
        })
    }

    /// Returns the OS process id while the process runs.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Returns the program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Takes the stdin pipe.
    pub fn take_stdin(&mut self) -> BridgeResult<ChildStdin> {
        self.child
            .stdin
            .take()
            .ok_or(BridgeError::MissingPipe { stream: "stdin" })
    }

    /// Takes the stdout pipe.
    pub fn take_stdout(&mut self) -> BridgeResult<ChildStdout> {
        self.child
            .stdout
            .take()
            .ok_or(BridgeError::MissingPipe { stream: "stdout" })
    }

    /// Takes the stderr pipe.
    pub fn take_stderr(&mut self) -> BridgeResult<ChildStderr> {
        self.child
            .stderr
            .take()
            .ok_or(BridgeError::MissingPipe { stream: "stderr" })
    }

    /// Waits for the process to exit.
    pub async fn wait(&mut self) -> BridgeResult<ExitStatus> {
        let status = self.child.wait().await?;
        if status.success() {
            info!(program = %self.program, "Backend exited");
        } else {
            warn!(program = %self.program, status = %status, "Backend exited abnormally");
        }
        Ok(status)
    }

    /// Terminates the process and reaps it. A process that already exited
    /// is left alone.
    pub async fn kill(&mut self) -> BridgeResult<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        debug!(program = %self.program, "Killing backend");
        self.child.kill().await?;
        Ok(())
    }
}

/// Spawns the task that writes questions to the backend's stdin.
///
/// The task ends when every sender is dropped or the pipe breaks. Questions
/// that cannot be framed are logged and skipped.
pub fn spawn_question_writer(
    stdin: ChildStdin,
) -> (mpsc::UnboundedSender<OutboundQuestion>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundQuestion>();

    let task = tokio::spawn(async move {
        let mut writer = FrameWriter::new(stdin);
        while let Some(question) = rx.recv().await {
            match writer.write_question(&question).await {
                Ok(()) => {}
                Err(ProtocolError::Io(e)) => {
                    error!(error = %e, "Failed to write question to backend");
                    break;
                }
                // Nothing was written; the stream is still in sync.
                Err(e) => warn!(error = %e, "Dropping question that cannot be framed"),
            }
        }
        debug!("Question writer stopped");
    });

    (tx, task)
}

/// Spawns the task that drains the backend's stderr line by line.
///
/// Every line is logged; when `events` is set it is also posted to the UI.
pub fn spawn_stderr_forwarder(
    stderr: ChildStderr,
    events: Option<mpsc::UnboundedSender<UiEvent>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    warn!(line = %line, "Backend stderr");
                    if let Some(ref events) = events {
                        let _ = events.send(UiEvent::BackendError { text: line });
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "Backend stderr closed");
                    break;
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn sh(script: &str) -> BackendCommand {
        BackendCommand::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn spawn_missing_program_fails() {
        let result = BackendProcess::spawn(&BackendCommand::new("freecoding-no-such-binary"));
        assert!(matches!(result, Err(BridgeError::Spawn { .. })));
    }

    #[tokio::test]
    async fn pipes_can_be_taken_once() {
        let mut backend = BackendProcess::spawn(&sh("exit 0")).unwrap();
        assert!(backend.take_stdin().is_ok());
        assert!(matches!(
            backend.take_stdin(),
            Err(BridgeError::MissingPipe { stream: "stdin" })
        ));
        backend.wait().await.unwrap();
    }

    #[tokio::test]
    async fn wait_reports_exit_code() {
        let mut backend = BackendProcess::spawn(&sh("exit 3")).unwrap();
        let status = backend.wait().await.unwrap();
        assert_eq!(status.code(), Some(3));
        // Already reaped: killing is a no-op.
        backend.kill().await.unwrap();
    }

    #[tokio::test]
    async fn kill_stops_a_running_backend() {
        let mut backend = BackendProcess::spawn(&sh("sleep 30")).unwrap();
        backend.kill().await.unwrap();
        let status = backend.wait().await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn writer_skips_unframeable_questions() {
        let mut backend = BackendProcess::spawn(&sh("cat")).unwrap();
        let stdin = backend.take_stdin().unwrap();
        let mut stdout = backend.take_stdout().unwrap();

        let (tx, task) = spawn_question_writer(stdin);
        tx.send(OutboundQuestion::new("FREECODING_QUESTION END", "de".into()))
            .unwrap();
        tx.send(OutboundQuestion::new("ping", "de".into())).unwrap();
        drop(tx);
        task.await.unwrap();

        let mut echoed = String::new();
        stdout.read_to_string(&mut echoed).await.unwrap();
        assert_eq!(
            echoed,
            "SELECT_LANGUAGE START\nde\nSELECT_LANGUAGE END\n\
             FREECODING_QUESTION START\nping\nFREECODING_QUESTION END\n"
        );
        backend.wait().await.unwrap();
    }

    #[tokio::test]
    async fn stderr_lines_are_forwarded() {
        let mut backend = BackendProcess::spawn(&sh("echo oops >&2; echo again >&2")).unwrap();
        let stderr = backend.take_stderr().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_stderr_forwarder(stderr, Some(tx)).await.unwrap();
        backend.wait().await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(UiEvent::BackendError {
                text: "oops".into()
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(UiEvent::BackendError {
                text: "again".into()
            })
        );
    }
}
