//! freecoding CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use freecoding_client::cli::{Cli, Command, ConfigAction};
use freecoding_client::config::ClientConfig;
use freecoding_client::error::{ClientError, ClientResult};
use freecoding_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };
    config.apply_overrides(cli.language.as_deref(), cli.debug, cli.backend_override());

    // Initialize tracing
    let mut logging = if cli.json_logs {
        TracingConfig::daemon()
    } else if config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if cli.json_logs && config.debug {
        logging = logging.with_level(Level::DEBUG);
    }
    if let Err(e) = init_tracing(logging) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match cli.command {
        None | Some(Command::Chat { .. }) => freecoding_client::commands::chat::run(&config).await,
        Some(Command::Ask { question, .. }) => {
            freecoding_client::commands::ask::run(&config, question).await
        }
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => freecoding_client::commands::config::dump(&config, &config_path),
            ConfigAction::Validate => freecoding_client::commands::config::validate(&config),
            ConfigAction::Path => freecoding_client::commands::config::path(&config_path),
        },
    }
}
