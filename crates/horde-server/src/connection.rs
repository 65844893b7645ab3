use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use horde_common::lobby::{RoomCode, Side};
use horde_common::protocol::{serialize_message, ServerMessage};

use crate::handler;
use crate::server::SharedState;

/// A frame queued for one connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(ServerMessage),
    /// A peer's payload, forwarded without being re-encoded.
    Relay(String),
}

impl Outbound {
    pub fn into_text(self) -> Result<String, serde_json::Error> {
        match self {
            Outbound::Message(msg) => serialize_message(&msg),
            Outbound::Relay(text) => Ok(text),
        }
    }
}

pub type OutboundTx = mpsc::UnboundedSender<Outbound>;

pub struct ConnectionHandle {
    pub conn_id: Uuid,
    pub tx: OutboundTx,
    pub room_code: Option<RoomCode>,
    pub side: Option<Side>,
}

impl ConnectionHandle {
    pub fn new(conn_id: Uuid, tx: OutboundTx) -> Self {
        Self {
            conn_id,
            tx,
            room_code: None,
            side: None,
        }
    }

    pub fn bind(&mut self, code: RoomCode, side: Side) {
        self.room_code = Some(code);
        self.side = Some(side);
    }

    pub fn unbind(&mut self) {
        self.room_code = None;
        self.side = None;
    }

    pub fn send(&self, msg: ServerMessage) {
        let _ = self.tx.send(Outbound::Message(msg));
    }
}

pub async fn handle_connection(socket: WebSocket, peer_addr: SocketAddr, state: SharedState) {
    let conn_id = Uuid::new_v4();

    // Outbound queue, drained by the writer task
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    state
        .connections
        .write()
        .await
        .insert(conn_id, ConnectionHandle::new(conn_id, tx));

    let (mut sink, mut stream) = socket.split();

    let write_task = tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            match out.into_text() {
                Ok(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Err(e) = handler::handle_frame(conn_id, text.as_str(), &state).await {
                    tracing::error!("Handler error for {}: {}", peer_addr, e);
                }
            }
            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    if let Err(e) = handler::handle_frame(conn_id, text, &state).await {
                        tracing::error!("Handler error for {}: {}", peer_addr, e);
                    }
                }
                Err(_) => tracing::debug!("Dropping non-UTF-8 frame from {}", peer_addr),
            },
            Some(Ok(Message::Close(_))) | None => {
                tracing::info!("Connection {} ({}) closed", conn_id, peer_addr);
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::warn!("Read error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    // Cleanup
    handler::handle_disconnect(conn_id, &state).await;
    write_task.abort();
}
