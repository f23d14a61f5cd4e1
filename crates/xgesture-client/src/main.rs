//! xgesture CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::warn;

use xgesture_client::cli::{Cli, Command, ConfigAction};
use xgesture_client::commands;
use xgesture_client::config::ClientConfig;
use xgesture_client::error::{GestureError, GestureResult};
use xgesture_client::tracing::{init_tracing, TracingConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> GestureResult<()> {
    let (config, load_error) = if let Some(ref path) = cli.config {
        (ClientConfig::load_from(path).map_err(GestureError::Config)?, None)
    } else {
        match ClientConfig::load() {
            Ok(config) => (config, None),
            Err(e) => (ClientConfig::default(), Some(e)),
        }
    };

    let tracing = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: {}", e);
    }
    if let Some(e) = load_error {
        warn!(
            path = %ClientConfig::default_path().display(),
            error = %e,
            "Ignoring config file, using defaults"
        );
    }

    match cli.command {
        Command::Decode { hex, codec } => {
            commands::codec::decode(&hex, &codec.resolve(&config.codec)?)
        }
        Command::Encode { file, codec } => {
            commands::codec::encode(file.as_deref(), &codec.resolve(&config.codec)?)
        }
        Command::Error { code, codec } => {
            commands::codec::error(code, &codec.resolve(&config.codec)?)
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
