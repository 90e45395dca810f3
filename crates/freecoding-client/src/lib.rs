//! CLI, configuration and the JSON-lines console front-end.
//!
//! This crate provides the `freecoding` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
