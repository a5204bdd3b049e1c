//! Host adapter: one configured integration instance.
//!
//! A host creates an [`Instance`], calls [`init`](Instance::init) with its
//! configuration, runs actions and evaluates feedbacks against it, and
//! implements [`InstanceObserver`] to hear about status and state changes.

use std::sync::Arc;

use parking_lot::RwLock;
use rd_domain::{Config, ConnectionStatus, DeviceState, Result};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::commands::{self, CommandDispatcher};
use crate::feedback::{self, Feedback, FeedbackValue};
use crate::schema::{self, Definition, OptionField};
use crate::session::SessionHandle;

/// Receives instance notifications.
///
/// `feedbacks_changed` fires after inbound events; re-evaluate feedbacks
/// against the state passed in.  Rapid updates may be coalesced into one
/// call carrying the latest state.
///
/// ```rust,no_run
/// # use rd_client::InstanceObserver;
/// # use rd_domain::{ConnectionStatus, DeviceState};
/// struct Printer;
///
/// #[async_trait::async_trait]
/// impl InstanceObserver for Printer {
///     async fn status_changed(&self, status: &ConnectionStatus) {
///         println!("status: {status}");
///     }
///     async fn feedbacks_changed(&self, state: &DeviceState) {
///         println!("muted: {}", state.input_muted(false));
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait InstanceObserver: Send + Sync + 'static {
    async fn status_changed(&self, status: &ConnectionStatus);

    async fn feedbacks_changed(&self, state: &DeviceState);
}

pub struct Instance {
    id: Uuid,
    session: SessionHandle,
    dispatcher: CommandDispatcher,
    config: RwLock<Config>,
    shutdown: CancellationToken,
}

impl Instance {
    /// Create an idle instance.  Must be called inside a Tokio runtime.
    pub fn new() -> Result<Self> {
        let config = Config::default();
        let session = SessionHandle::spawn();
        let dispatcher = CommandDispatcher::new(session.clone(), &config)?;
        Ok(Self {
            id: Uuid::new_v4(),
            session,
            dispatcher,
            config: RwLock::new(config),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Apply the initial configuration and connect.
    pub async fn init(&self, config: Config) -> Result<()> {
        tracing::info!(instance = %self.id, target_ip = %config.target_ip, "init");
        self.apply(config).await
    }

    /// Replace the configuration.  The live session is torn down and a new
    /// one started, even if nothing changed.
    pub async fn config_updated(&self, config: Config) -> Result<()> {
        tracing::info!(instance = %self.id, target_ip = %config.target_ip, "config updated");
        self.apply(config).await
    }

    async fn apply(&self, config: Config) -> Result<()> {
        self.dispatcher.reconfigure(&config)?;
        *self.config.write() = config.clone();
        self.session.open(config).await
    }

    /// Close the session, cancel any pending reconnect and stop observers.
    pub async fn destroy(&self) {
        tracing::info!(instance = %self.id, "destroy");
        self.shutdown.cancel();
        self.session.close().await;
    }

    pub async fn run_action(&self, id: &str, options: &Value) -> Result<()> {
        self.dispatcher.run(id, options).await.inspect_err(|e| {
            tracing::warn!(instance = %self.id, action = id, error = %e, "action failed");
        })
    }

    pub fn check_feedback(&self, id: &str, options: &Value) -> Result<FeedbackValue> {
        let feedback = Feedback::parse(id, options)?;
        Ok(feedback.evaluate(&self.session.device_state()))
    }

    pub fn action_definitions(&self) -> Vec<Definition> {
        commands::definitions()
    }

    pub fn feedback_definitions(&self) -> Vec<Definition> {
        feedback::definitions()
    }

    pub fn config_fields(&self) -> Vec<OptionField> {
        schema::config_fields()
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.session.status()
    }

    pub fn device_state(&self) -> DeviceState {
        self.session.device_state()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Forward status and state notifications to `observer` until
    /// [`destroy`](Self::destroy) is called.
    pub fn watch(&self, observer: Arc<dyn InstanceObserver>) -> JoinHandle<()> {
        let mut status_rx = self.session.subscribe_status();
        let mut state_rx = self.session.subscribe_state();
        let shutdown = self.shutdown.clone();
        let id = self.id;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = status_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = status_rx.borrow_and_update().clone();
                        observer.status_changed(&status).await;
                    }
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = state_rx.borrow_and_update().clone();
                        observer.feedbacks_changed(&state).await;
                    }
                }
            }
            tracing::debug!(instance = %id, "observer stopped");
        })
    }
}
