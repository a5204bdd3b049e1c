//! One WebSocket connection: connect, then shuttle frames between the
//! socket and the session actor until either side closes.
//!
//! The task never touches session state.  It reports everything back as
//! [`TransportEvent`]s tagged with the generation it was started for, so the
//! actor can discard events from connections it has already replaced.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close frame arrived without a status code.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Connection ended without a close frame (reset, EOF, failed connect).
pub const CLOSE_ABNORMAL: u16 = 1006;

#[derive(Debug)]
pub(crate) struct TransportEvent {
    pub generation: u64,
    pub kind: TransportEventKind,
}

#[derive(Debug)]
pub(crate) enum TransportEventKind {
    Opened,
    Text(String),
    Failed(TransportFailure),
    Closed(u16),
}

/// Classified transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The upgrade was refused with HTTP 403: bad token or client not ready.
    Rejected(String),
    Other(String),
}

impl TransportFailure {
    pub fn classify(err: &WsError) -> Self {
        match err {
            WsError::Http(response) if response.status().as_u16() == 403 => {
                Self::Rejected(format!("unexpected server response: {}", response.status()))
            }
            other => Self::Other(other.to_string()),
        }
    }
}

/// Commands from the actor to the connection task.
#[derive(Debug)]
pub(crate) enum Outgoing {
    Text(String),
    /// Graceful close with code 1000.
    Close,
}

/// Close code carried by a close frame; 1005 when the frame has none.
pub fn close_code(frame: Option<&CloseFrame<'_>>) -> u16 {
    frame.map(|f| u16::from(f.code)).unwrap_or(CLOSE_NO_STATUS)
}

pub(crate) async fn run_connection(
    url: String,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<Outgoing>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let emit = |kind: TransportEventKind| {
        let _ = events.send(TransportEvent { generation, kind });
    };

    tracing::debug!(url = %url, generation, "connecting");
    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            emit(TransportEventKind::Failed(TransportFailure::classify(&e)));
            emit(TransportEventKind::Closed(CLOSE_ABNORMAL));
            return;
        }
    };
    emit(TransportEventKind::Opened);

    let (mut sink, mut stream) = ws.split();

    let code = loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(Outgoing::Text(json)) => {
                    if let Err(e) = sink.send(Message::Text(json)).await {
                        emit(TransportEventKind::Failed(TransportFailure::Other(e.to_string())));
                        break CLOSE_ABNORMAL;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "".into(),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    break CLOSE_NORMAL;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => emit(TransportEventKind::Text(text)),
                Some(Ok(Message::Close(frame))) => {
                    // tungstenite queues the close reply; push it out before dropping the socket.
                    let code = close_code(frame.as_ref());
                    let _ = sink.flush().await;
                    break code;
                }
                // Pings are answered by tungstenite; binary frames are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(TransportEventKind::Failed(TransportFailure::Other(e.to_string())));
                    break CLOSE_ABNORMAL;
                }
                None => break CLOSE_ABNORMAL,
            },
        }
    };

    tracing::debug!(generation, code, "connection finished");
    emit(TransportEventKind::Closed(code));
}
