use std::fmt;

use serde::Serialize;

/// Reason reported when the client drops the connection abnormally or
/// rejects the upgrade; usually a stale token or the client is not running.
pub const REJECTED_REASON: &str = "Invalid API token or Teamspeak not running";

/// Connection status as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Connecting,
    /// Transport is open. Authentication may still be pending.
    Connected,
    /// The configuration cannot produce a connection attempt.
    BadConfig { reason: String },
}

impl ConnectionStatus {
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected {
            reason: Some(reason.into()),
        }
    }

    /// Map a WebSocket close code to the disconnected status it produces.
    pub fn from_close_code(code: u16) -> Self {
        if code == 1006 {
            Self::disconnected(REJECTED_REASON)
        } else {
            Self::disconnected(format!("Connection closed with code {code}"))
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::Disconnected { reason: None }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { reason: None } => f.write_str("disconnected"),
            Self::Disconnected {
                reason: Some(reason),
            } => write!(f, "disconnected ({reason})"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::BadConfig { reason } => write!(f, "bad config ({reason})"),
        }
    }
}
