//! Connection manager: owns the WebSocket session lifecycle.
//!
//! All lifecycle mutation happens inside one actor task.  Callers talk to it
//! through a cloneable [`SessionHandle`]; connection tasks and the reconnect
//! timer report back over channels.  Because the actor handles one message at
//! a time, replacing the live session or the pending timer is atomic with
//! respect to every other event.
//!
//! ```text
//!  SessionHandle ──control──▶ ┌──────────────┐ ◀──transport events── connection task (gen N)
//!                             │ SessionActor │
//!  watch::Receiver ◀─status── │              │ ◀──timer fires──────── ReconnectTimer
//!                  ◀─state─── └──────────────┘
//! ```

use rd_domain::config::redact_token;
use rd_domain::{Config, ConnectionStatus, DeviceState, Error, Result, REJECTED_REASON};
use rd_protocol::{ClientMessage, Frame, ServerMessage};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::reconnect::ReconnectTimer;
use crate::transport::{self, Outgoing, TransportEvent, TransportEventKind, TransportFailure};

enum Control {
    Open {
        config: Config,
        reply: oneshot::Sender<Result<()>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
    Send(Vec<ClientMessage>),
}

/// Cloneable handle to the session actor.
///
/// The actor stops (closing any live connection) once every handle is
/// dropped.
#[derive(Clone)]
pub struct SessionHandle {
    control: mpsc::UnboundedSender<Control>,
    status: watch::Receiver<ConnectionStatus>,
    state: watch::Receiver<DeviceState>,
    token: watch::Receiver<String>,
}

impl SessionHandle {
    /// Spawn the session actor on the current Tokio runtime.
    pub fn spawn() -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let (state_tx, state_rx) = watch::channel(DeviceState::default());
        let (token_tx, token_rx) = watch::channel(String::new());

        let actor = SessionActor {
            id: Uuid::new_v4(),
            config: None,
            active: false,
            generation: 0,
            socket: None,
            timer: ReconnectTimer::new(),
            transport_tx,
            timer_tx,
            status: status_tx,
            state: state_tx,
            token: token_tx,
        };
        tokio::spawn(actor.run(control_rx, transport_rx, timer_rx));

        Self {
            control: control_tx,
            status: status_rx,
            state: state_rx,
            token: token_rx,
        }
    }

    /// Apply `config` and start a new session, replacing any existing one.
    ///
    /// Fails with [`Error::Config`] when the target address is missing or
    /// invalid; the status then reads `BadConfig` and no attempt is made.
    pub async fn open(&self, config: Config) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.control
            .send(Control::Open { config, reply })
            .map_err(|_| Error::Shutdown)?;
        rx.await.map_err(|_| Error::Shutdown)?
    }

    /// Cancel any pending reconnect and close the session.  Idempotent.
    ///
    /// Returns once the actor has torn the session down; no event from the
    /// closed connection has any effect afterwards.
    pub async fn close(&self) {
        let (reply, rx) = oneshot::channel();
        if self.control.send(Control::Close { reply }).is_ok() {
            let _ = rx.await;
        }
    }

    /// Queue messages on the live session, in order.  Fire-and-forget:
    /// messages sent while no session is connected are dropped.
    pub fn send(&self, messages: impl IntoIterator<Item = ClientMessage>) -> Result<()> {
        self.control
            .send(Control::Send(messages.into_iter().collect()))
            .map_err(|_| Error::Shutdown)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Latest device state snapshot.
    pub fn device_state(&self) -> DeviceState {
        self.state.borrow().clone()
    }

    /// Notified after every non-auth inbound frame, changed or not.
    pub fn subscribe_state(&self) -> watch::Receiver<DeviceState> {
        self.state.clone()
    }

    /// Token presented in the next handshake.
    pub fn token(&self) -> String {
        self.token.borrow().clone()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Actor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct LiveSocket {
    generation: u64,
    outbound: mpsc::UnboundedSender<Outgoing>,
    task: JoinHandle<()>,
    open: bool,
}

struct SessionActor {
    id: Uuid,
    config: Option<Config>,
    /// Cleared by `close()`; no reconnects while false.
    active: bool,
    generation: u64,
    socket: Option<LiveSocket>,
    timer: ReconnectTimer,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    timer_tx: mpsc::UnboundedSender<u64>,
    status: watch::Sender<ConnectionStatus>,
    state: watch::Sender<DeviceState>,
    token: watch::Sender<String>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut control_rx: mpsc::UnboundedReceiver<Control>,
        mut transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
        mut timer_rx: mpsc::UnboundedReceiver<u64>,
    ) {
        tracing::debug!(session = %self.id, "session actor started");
        loop {
            tokio::select! {
                control = control_rx.recv() => match control {
                    Some(control) => self.handle_control(control),
                    None => break,
                },
                Some(event) = transport_rx.recv() => self.handle_transport(event),
                Some(id) = timer_rx.recv() => self.handle_timer(id),
            }
        }
        self.active = false;
        self.timer.cancel();
        self.drop_socket();
        tracing::debug!(session = %self.id, "session actor stopped");
    }

    fn handle_control(&mut self, control: Control) {
        match control {
            Control::Open { config, reply } => {
                let _ = reply.send(self.open(config));
            }
            Control::Close { reply } => {
                self.close();
                let _ = reply.send(());
            }
            Control::Send(messages) => {
                for message in messages {
                    self.transmit(&message);
                }
            }
        }
    }

    fn open(&mut self, config: Config) -> Result<()> {
        self.active = true;
        if !config.api_token.is_empty() {
            self.token.send_replace(config.api_token.clone());
        }
        self.config = Some(config);
        self.connect()
    }

    fn close(&mut self) {
        self.active = false;
        self.timer.cancel();
        if self.socket.is_some() {
            tracing::info!(session = %self.id, "closing session");
        }
        self.drop_socket();
        self.set_status(ConnectionStatus::default());
    }

    /// Start a fresh connection for the current config.
    fn connect(&mut self) -> Result<()> {
        self.timer.cancel();

        let target = match &self.config {
            Some(config) => config.target_addr().map(|_| config.ws_url()),
            None => Err(Error::Config("no configuration applied".into())),
        };
        let url = match target {
            Ok(url) => url,
            Err(e) => {
                self.drop_socket();
                let reason = match &e {
                    Error::Config(message) => message.clone(),
                    other => other.to_string(),
                };
                tracing::warn!(session = %self.id, reason = %reason, "bad configuration");
                self.set_status(ConnectionStatus::BadConfig { reason });
                return Err(e);
            }
        };

        self.set_status(ConnectionStatus::Connecting);
        self.drop_socket();

        self.generation += 1;
        let generation = self.generation;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(transport::run_connection(
            url.clone(),
            generation,
            outbound_rx,
            self.transport_tx.clone(),
        ));
        self.socket = Some(LiveSocket {
            generation,
            outbound: outbound_tx,
            task,
            open: false,
        });
        tracing::info!(session = %self.id, url = %url, generation, "connecting");
        Ok(())
    }

    /// Detach the live socket.  Its later events become stale.
    fn drop_socket(&mut self) {
        let Some(socket) = self.socket.take() else {
            return;
        };
        if socket.open {
            let _ = socket.outbound.send(Outgoing::Close);
        } else {
            socket.task.abort();
        }
        self.generation += 1;
    }

    fn maybe_reconnect(&mut self) {
        let Some(config) = &self.config else {
            return;
        };
        if !(self.active && config.reconnect) {
            return;
        }
        let delay = config.reconnect_delay();
        self.timer.schedule(delay, &self.timer_tx);
        tracing::info!(
            session = %self.id,
            delay_ms = delay.as_millis() as u64,
            "reconnect scheduled"
        );
    }

    fn handle_timer(&mut self, id: u64) {
        if !self.timer.claim(id) {
            tracing::trace!(session = %self.id, id, "ignoring stale reconnect timer");
            return;
        }
        if !self.active {
            return;
        }
        tracing::info!(session = %self.id, "reconnecting");
        if let Err(e) = self.connect() {
            tracing::warn!(session = %self.id, error = %e, "reconnect aborted");
        }
    }

    fn handle_transport(&mut self, event: TransportEvent) {
        let live = matches!(&self.socket, Some(s) if s.generation == event.generation);
        if !live {
            tracing::trace!(
                session = %self.id,
                generation = event.generation,
                "dropping event from replaced connection"
            );
            return;
        }

        match event.kind {
            TransportEventKind::Opened => {
                if let Some(socket) = self.socket.as_mut() {
                    socket.open = true;
                }
                self.set_status(ConnectionStatus::Connected);
                let token = self.token.borrow().clone();
                tracing::info!(
                    session = %self.id,
                    token = %redact_token(&token),
                    "connected, sending auth"
                );
                self.transmit(&ClientMessage::auth(token));
            }
            TransportEventKind::Text(text) => self.handle_frame(&text),
            TransportEventKind::Failed(TransportFailure::Rejected(detail)) => {
                tracing::warn!(session = %self.id, detail = %detail, "handshake rejected");
                self.set_status(ConnectionStatus::disconnected(REJECTED_REASON));
            }
            TransportEventKind::Failed(TransportFailure::Other(detail)) => {
                tracing::error!(session = %self.id, "WebSocket error: {detail}");
            }
            TransportEventKind::Closed(code) => {
                self.socket = None;
                tracing::info!(session = %self.id, code, "connection closed");
                self.set_status(ConnectionStatus::from_close_code(code));
                self.maybe_reconnect();
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        match rd_protocol::decode(text) {
            Frame::Event(message @ ServerMessage::Auth(_)) => {
                // Auth replies update the token only; observers are not notified.
                if let Some(token) = message.granted_token() {
                    tracing::info!(
                        session = %self.id,
                        token = %redact_token(token),
                        "client issued API key"
                    );
                    self.token.send_replace(token.to_owned());
                }
            }
            Frame::Event(message) => {
                tracing::debug!(session = %self.id, ?message, "inbound event");
                self.state.send_modify(|state| {
                    if message.apply_to(state) {
                        state.touch();
                    }
                });
            }
            Frame::Unrecognized(value) => {
                tracing::debug!(session = %self.id, %value, "unrecognized envelope");
                self.state.send_modify(|_| {});
            }
            Frame::Opaque(raw) => {
                tracing::debug!(session = %self.id, raw = %raw, "non-JSON frame");
                self.state.send_modify(|_| {});
            }
        }
    }

    /// Fire-and-forget send on the live socket.
    fn transmit(&self, message: &ClientMessage) {
        let Some(socket) = self.socket.as_ref().filter(|s| s.open) else {
            tracing::warn!(session = %self.id, ?message, "not connected, dropping message");
            return;
        };
        match message.to_json() {
            Ok(json) => {
                let _ = socket.outbound.send(Outgoing::Text(json));
            }
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "failed to serialize outbound message");
            }
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        tracing::debug!(session = %self.id, status = %status, "status");
        self.status.send_replace(status);
    }
}
