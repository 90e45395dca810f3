//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// freecoding - Ask questions about your code from the terminal
#[derive(Debug, Parser)]
#[command(name = "freecoding")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "FREECODING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Emit logs as JSON on stderr
    #[arg(long)]
    pub json_logs: bool,

    /// Language for questions (e.g. en, es, pt-BR)
    #[arg(long, short)]
    pub language: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a JSON-lines chat session on stdin/stdout (default)
    Chat {
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Backend command line override.
#[derive(Debug, Default, Args)]
pub struct BackendArgs {
    /// Backend command, replacing the configured one (after `--`)
    #[arg(last = true, value_name = "BACKEND")]
    pub command: Vec<String>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

impl Cli {
    /// Returns the backend override of the selected command, if any.
    pub fn backend_override(&self) -> &[String] {
        match self.command {
            Some(Command::Chat { ref backend }) | Some(Command::Ask { ref backend, .. }) => {
                backend.command.as_slice()
            }
            _ => &[],
        }
    }
}
