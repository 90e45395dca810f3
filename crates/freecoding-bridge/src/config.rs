//! Bridge configuration.

use std::path::PathBuf;

use freecoding_core::Language;
use freecoding_protocol::DEFAULT_MAX_FRAME_SIZE;

use crate::error::{BridgeError, BridgeResult};

/// Default backend launcher.
pub const DEFAULT_BACKEND_PROGRAM: &str = "jbang";

/// How to launch the backend process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    /// Executable to run.
    pub program: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Working directory; inherits ours when unset.
    pub working_dir: Option<PathBuf>,
}

impl Default for BackendCommand {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_PROGRAM)
    }
}

impl BackendCommand {
    /// Creates a command for the given program with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Builder: append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Builder: append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Builder: set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Backend launch command.
    pub backend: BackendCommand,

    /// Language selected at session start.
    pub default_language: Language,

    /// Largest accepted inbound frame payload; `None` disables the limit.
    pub max_frame_size: Option<usize>,

    /// Whether backend stderr lines are forwarded to the UI.
    pub forward_stderr: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            backend: BackendCommand::default(),
            default_language: Language::default(),
            max_frame_size: Some(DEFAULT_MAX_FRAME_SIZE),
            forward_stderr: true,
        }
    }
}

impl BridgeConfig {
    /// Creates a new bridge configuration for the given backend.
    pub fn new(backend: BackendCommand) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    /// Builder: set the session's initial language.
    pub fn with_language(mut self, language: impl Into<Language>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Builder: set the frame size limit.
    pub fn with_max_frame_size(mut self, max: Option<usize>) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Builder: set stderr forwarding.
    pub fn with_forward_stderr(mut self, forward: bool) -> Self {
        self.forward_stderr = forward;
        self
    }

    /// Checks the configuration before anything is spawned.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.backend.program.trim().is_empty() {
            return Err(BridgeError::config("backend program must not be empty"));
        }
        if !self.default_language.is_well_formed() {
            return Err(BridgeError::config(format!(
                "invalid language code: {:?}",
                self.default_language.code()
            )));
        }
        if self.max_frame_size == Some(0) {
            return Err(BridgeError::config("max_frame_size must be positive"));
        }
        Ok(())
    }
}
