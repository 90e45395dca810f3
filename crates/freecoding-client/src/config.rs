//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/freecoding/config.toml` by default:
//!
//! ```toml
//! language = "es"
//! debug = false
//!
//! [backend]
//! program = "jbang"
//! args = ["freecoding.java"]
//! working_dir = "/home/me/project"
//! forward_stderr = true
//!
//! [limits]
//! max_frame_size = 16777216  # 0 disables the limit
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use freecoding_bridge::{BackendCommand, BridgeConfig, DEFAULT_BACKEND_PROGRAM};
use freecoding_core::Language;
use freecoding_protocol::DEFAULT_MAX_FRAME_SIZE;

/// Configuration for the freecoding client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Language selected at session start.
    pub language: Language,

    /// Debug mode.
    pub debug: bool,

    /// Backend launch settings.
    pub backend: BackendSettings,

    /// Protocol limits.
    pub limits: LimitSettings,
}

/// How to launch the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Program to run.
    pub program: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Working directory; inherited when unset.
    pub working_dir: Option<PathBuf>,

    /// Whether backend stderr lines are shown in the UI.
    pub forward_stderr: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_BACKEND_PROGRAM.to_string(),
            args: Vec::new(),
            working_dir: None,
            forward_stderr: true,
        }
    }
}

/// Protocol limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Largest accepted frame payload in bytes; 0 disables the limit.
    pub max_frame_size: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("freecoding")
    }

    /// Applies command-line overrides on top of the file.
    ///
    /// A non-empty `backend` replaces both program and arguments.
    pub fn apply_overrides(&mut self, language: Option<&str>, debug: bool, backend: &[String]) {
        if let Some(language) = language {
            self.language = Language::from(language);
        }
        self.debug |= debug;
        if let Some((program, args)) = backend.split_first() {
            self.backend.program = program.clone();
            self.backend.args = args.to_vec();
        }
    }

    /// Builds the bridge configuration.
    pub fn to_bridge_config(&self) -> BridgeConfig {
        let mut command = BackendCommand::new(&self.backend.program).args(&self.backend.args);
        if let Some(ref dir) = self.backend.working_dir {
            command = command.working_dir(dir);
        }
        let max_frame_size = match self.limits.max_frame_size {
            0 => None,
            n => Some(n),
        };
        BridgeConfig::new(command)
            .with_language(self.language.clone())
            .with_max_frame_size(max_frame_size)
            .with_forward_stderr(self.backend.forward_stderr)
    }

    /// Checks the configuration without starting anything.
    pub fn validate(&self) -> Result<(), String> {
        self.to_bridge_config()
            .validate()
            .map_err(|e| e.to_string())?;
        if let Some(ref dir) = self.backend.working_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "backend working_dir {} is not a directory",
                    dir.display()
                ));
            }
        }
        Ok(())
    }
}
