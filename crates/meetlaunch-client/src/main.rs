//! meetlaunch CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use meetlaunch_client::cli::{Cli, Command, ConfigAction};
use meetlaunch_client::commands;
use meetlaunch_client::commands::next::OutputMode;
use meetlaunch_client::config::ClientConfig;
use meetlaunch_client::error::ClientResult;
use meetlaunch_core::{TracingConfig, init_tracing};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    }
    .with_format(cli.log_format);
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: logging unavailable: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path)?
    } else {
        ClientConfig::load()?
    };
    cli.apply_to(&mut config);

    match cli.command {
        Some(Command::Auth) => commands::auth::google(&config).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        None => {
            let mode = if cli.json {
                OutputMode::Json
            } else if cli.print_only {
                OutputMode::PrintOnly
            } else {
                OutputMode::Launch
            };
            commands::next::run(&config, mode).await
        }
    }
}
