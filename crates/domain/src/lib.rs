//! Shared types for remote-deck: configuration, the error taxonomy,
//! connection status, and the last-known device state.

pub mod config;
pub mod error;
pub mod state;
pub mod status;

pub use config::{Config, ConfigError, ConfigSeverity};
pub use error::{Error, Result};
pub use state::{ChannelDisplay, DeviceState, SelfFlag};
pub use status::{ConnectionStatus, REJECTED_REASON};
