use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Port the communication client's remote-apps WebSocket listens on.
pub const DEFAULT_WS_PORT: u16 = 5899;

/// Fixed delay between a disconnect and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection settings for both controlled devices.
///
/// The WebSocket client and the HTTP channel device share `target_ip`.
/// Any change to this struct replaces the live session wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "d_target_ip")]
    pub target_ip: String,
    /// Port of the HTTP-controlled channel device.
    #[serde(default = "d_target_port")]
    pub target_port: u16,
    #[serde(default = "d_ws_port")]
    pub ws_port: u16,
    /// Advisory seed for the handshake token. The token handed out by the
    /// client during the handshake always wins.
    #[serde(default)]
    pub api_token: String,
    /// Reconnect after any disconnect (fixed delay, unlimited attempts).
    #[serde(default = "d_true")]
    pub reconnect: bool,
    #[serde(default = "d_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "d_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_ip: d_target_ip(),
            target_port: d_target_port(),
            ws_port: d_ws_port(),
            api_token: String::new(),
            reconnect: true,
            reconnect_delay_ms: d_reconnect_delay_ms(),
            http_timeout_ms: d_http_timeout_ms(),
        }
    }
}

impl Config {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Check the target address before a connection attempt.
    pub fn target_addr(&self) -> Result<Ipv4Addr> {
        let ip = self.target_ip.trim();
        if ip.is_empty() {
            return Err(Error::Config("IP is missing".into()));
        }
        ip.parse::<Ipv4Addr>()
            .map_err(|_| Error::Config(format!("invalid IPv4 address: {ip}")))
    }

    /// `ws://{target_ip}:{ws_port}`; no TLS, no path.
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.target_ip.trim(), self.ws_port)
    }

    /// Base URL of the channel device's state API.
    pub fn http_base_url(&self) -> String {
        format!(
            "http://{}:{}/api/state",
            self.target_ip.trim(),
            self.target_port
        )
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_target_ip() -> String {
    "127.0.0.1".into()
}
fn d_target_port() -> u16 {
    9000
}
fn d_ws_port() -> u16 {
    DEFAULT_WS_PORT
}
fn d_true() -> bool {
    true
}
fn d_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}
fn d_http_timeout_ms() -> u64 {
    5000
}

/// Mask a token for logging, keeping only the first four characters.
pub fn redact_token(token: &str) -> String {
    match token.char_indices().nth(4) {
        _ if token.is_empty() => "<empty>".into(),
        Some((idx, _)) => format!("{}…", &token[..idx]),
        None => "****".into(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Err(Error::Config(message)) = self.target_addr() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "target_ip".into(),
                message,
            });
        }

        if self.target_port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "target_port".into(),
                message: "port must be between 1 and 65535".into(),
            });
        }

        if self.ws_port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "ws_port".into(),
                message: "port must be between 1 and 65535".into(),
            });
        }

        if self.reconnect && self.reconnect_delay_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "reconnect_delay_ms".into(),
                message: "a zero delay reconnects in a tight loop".into(),
            });
        }

        if self.http_timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "http_timeout_ms".into(),
                message: "zero timeout makes every HTTP command fail".into(),
            });
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
