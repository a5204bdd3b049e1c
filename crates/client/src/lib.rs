//! `rd-client`: drives the communication client over its remote-apps
//! WebSocket and the channel device over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Host (CLI / automation surface)                             │
//! │                                                              │
//! │   let instance = Instance::new()?;                           │
//! │   instance.init(config).await?;                              │
//! │   instance.watch(observer);                                  │
//! │   instance.run_action("muteMicrophone", &json!({})).await?;  │
//! │   instance.check_feedback("isMuted", &json!({}))?;           │
//! └──────────────┬──────────────────────────────┬────────────────┘
//!                │ actions                      │ status / state
//!        ┌───────▼──────────┐          ┌────────┴────────┐
//!        │ CommandDispatcher│          │  SessionActor   │◀── ReconnectTimer
//!        └───┬──────────┬───┘  send ──▶│  (one task)     │
//!            │          └──────────────┤                 │◀── connection task
//!            ▼                         └─────────────────┘     (per generation)
//!     HttpCommandClient                         │
//!   GET /api/state/{route}/{value}      ws://ip:5899
//! ```
//!
//! # Session flow
//!
//! 1. `open(config)`: validate the target, report `Connecting`, replace any
//!    prior connection, start a new one.
//! 2. On open: report `Connected` and send one `auth` envelope with the
//!    current token (empty on first contact).
//! 3. An `auth` reply with a non-empty `apiKey` replaces the token.
//! 4. Other frames update [`DeviceState`](rd_domain::DeviceState) and notify
//!    observers.
//! 5. On close: report `Disconnected` and, if enabled, reconnect once after
//!    the fixed delay.

pub mod commands;
pub mod feedback;
pub mod http;
pub mod instance;
pub mod reconnect;
pub mod schema;
pub mod session;
pub mod transport;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use commands::{Action, CommandDispatcher, Wire};
pub use feedback::{Feedback, FeedbackValue};
pub use http::HttpCommandClient;
pub use instance::{Instance, InstanceObserver};
pub use reconnect::ReconnectTimer;
pub use schema::{Definition, OptionField};
pub use session::SessionHandle;
pub use transport::TransportFailure;

pub use rd_domain::{Config, ConnectionStatus, DeviceState, Error, Result};
pub use rd_protocol::ClientMessage;
