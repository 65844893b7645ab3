use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::connection::{self, ConnectionHandle};
use crate::lobby::RoomStore;

/// Lock order is always `lobby` before `connections`.
pub struct ServerState {
    pub lobby: RwLock<RoomStore>,
    pub connections: RwLock<HashMap<Uuid, ConnectionHandle>>,
    pub max_connections: usize,
    /// One permit per live connection, held by its connection task.
    connection_slots: Arc<Semaphore>,
    pub config: GameConfig,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(config: GameConfig, max_connections: usize) -> SharedState {
        Arc::new(ServerState {
            lobby: RwLock::new(RoomStore::new()),
            connections: RwLock::new(HashMap::new()),
            max_connections,
            connection_slots: Arc::new(Semaphore::new(max_connections)),
            config,
        })
    }

    /// Claims a connection slot, or `None` when the server is full. The slot
    /// is released when the permit is dropped.
    pub fn reserve_slot(&self) -> Option<OwnedSemaphorePermit> {
        self.connection_slots.clone().try_acquire_owned().ok()
    }

    pub fn live_connections(&self) -> usize {
        self.max_connections - self.connection_slots.available_permits()
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(ws_upgrade))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run(addr: SocketAddr, state: SharedState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<SharedState>,
) -> Response {
    // Enforce max connections
    let Some(slot) = state.reserve_slot() else {
        tracing::warn!(
            "Rejecting connection from {} (max {} reached)",
            peer_addr,
            state.max_connections
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    tracing::info!(
        "New connection from {} ({}/{})",
        peer_addr,
        state.live_connections(),
        state.max_connections
    );

    ws.on_upgrade(move |socket| async move {
        connection::handle_connection(socket, peer_addr, state).await;
        drop(slot);
    })
}

async fn health() -> &'static str {
    "OK"
}
