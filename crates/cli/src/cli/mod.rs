pub mod action;
pub mod catalog;
pub mod config;
pub mod run;

use clap::{Parser, Subcommand};
use rd_domain::Config;

/// remote-deck: drive a communication client and a channel device from
/// the terminal.
#[derive(Debug, Parser)]
#[command(name = "remote-deck", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect and read actions from an interactive prompt (default).
    Run,
    /// Run a single action and exit.
    Action {
        /// Action id, e.g. "muteMicrophone" or "setChannel".
        id: String,
        /// Action options as a JSON object, e.g. '{"selectedChannel": 3}'.
        #[arg(long)]
        options: Option<String>,
        /// Seconds to wait for the WebSocket session to connect.
        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
    /// List the available actions.
    Actions {
        /// Print definitions as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the available feedbacks.
    Feedbacks {
        #[arg(long)]
        json: bool,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from `RD_CONFIG` (or `remote-deck.toml`), then
/// apply `RD_TARGET_IP` / `RD_TARGET_PORT` / `RD_API_TOKEN` overrides.
/// Returns the config and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("RD_CONFIG").unwrap_or_else(|_| "remote-deck.toml".into());
    let config = load_config_from(&config_path, |key| std::env::var(key).ok())?;
    Ok((config, config_path))
}

/// Read `config_path` if it exists (defaults otherwise) and apply env
/// overrides looked up through `env`.
pub fn load_config_from(
    config_path: &str,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let mut config = if std::path::Path::new(config_path).exists() {
        let raw = std::fs::read_to_string(config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        Config::from_toml_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    if let Some(ip) = env("RD_TARGET_IP") {
        config.target_ip = ip;
    }
    if let Some(port) = env("RD_TARGET_PORT") {
        config.target_port = port
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("RD_TARGET_PORT: invalid port {port:?}"))?;
    }
    if let Some(token) = env("RD_API_TOKEN") {
        config.api_token = token;
    }

    Ok(config)
}
