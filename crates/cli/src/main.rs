use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rd_cli::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to the interactive prompt when no subcommand is given.
        None | Some(Command::Run) => {
            init_tracing("info");
            let (config, config_path) = cli::load_config()?;
            tracing::info!(config = %config_path, target_ip = %config.target_ip, "remote-deck starting");
            cli::run::run(config).await
        }
        Some(Command::Action {
            id,
            options,
            timeout_secs,
        }) => {
            init_tracing("warn");
            let (config, _) = cli::load_config()?;
            cli::action::action(config, id, options, Duration::from_secs(timeout_secs)).await
        }
        Some(Command::Actions { json }) => cli::catalog::actions(json),
        Some(Command::Feedbacks { json }) => cli::catalog::feedbacks(json),
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _) = cli::load_config()?;
            cli::config::show(&config)
        }
        Some(Command::Version) => {
            println!("remote-deck {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Compact stderr-only tracing so stdout stays clean for command output.
///
/// `RUST_LOG` wins over `default_level`.
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
