use std::collections::HashMap;

use uuid::Uuid;

use horde_common::lobby::{LobbyError, RoomCode, Side};
use horde_common::protocol::{
    self, ClientMessage, GameEvent, GameSignal, ServerMessage,
};

use crate::connection::ConnectionHandle;
use crate::lobby::RoomStore;
use crate::room::{PeerLink, Room};
use crate::scheduler;
use crate::server::SharedState;

/// Entry point for every inbound text frame. Anything that does not parse
/// as a known envelope is dropped without an error.
pub async fn handle_frame(conn_id: Uuid, text: &str, state: &SharedState) -> anyhow::Result<()> {
    match protocol::deserialize_message::<ClientMessage>(text) {
        Ok(msg) => handle_message(conn_id, msg, text, state).await,
        Err(e) => {
            tracing::debug!("Dropping unparseable message from {}: {}", conn_id, e);
            Ok(())
        }
    }
}

pub async fn handle_message(
    conn_id: Uuid,
    msg: ClientMessage,
    raw: &str,
    state: &SharedState,
) -> anyhow::Result<()> {
    match msg {
        ClientMessage::Create => handle_create(conn_id, state).await?,

        ClientMessage::Join { code } => {
            handle_join(conn_id, RoomCode::from_json(&code), state).await
        }

        ClientMessage::StartRequest { data } => {
            let mut lobby = state.lobby.write().await;
            let Some(room) = hosted_room(&mut lobby, conn_id, state).await else {
                tracing::debug!("Ignoring start_request from non-host {}", conn_id);
                return Ok(());
            };
            room.map = data.map;
            room.broadcast(&ServerMessage::game(GameEvent::Start { map: data.map }));
            scheduler::start_wave(room, 1, state);
        }

        ClientMessage::Restart => {
            let mut lobby = state.lobby.write().await;
            let Some(room) = hosted_room(&mut lobby, conn_id, state).await else {
                tracing::debug!("Ignoring restart from non-host {}", conn_id);
                return Ok(());
            };
            tracing::info!("Room {}: restarting", room.code);
            room.broadcast(&ServerMessage::game(GameEvent::Restart { map: room.map }));
            scheduler::start_wave(room, 1, state);
        }

        ClientMessage::Game { data } => {
            let mut lobby = state.lobby.write().await;
            let Some(code) = bound_room_code(conn_id, state).await else {
                return Ok(());
            };
            let Some(room) = lobby.get_room_mut(&code) else {
                return Ok(());
            };

            if !room.relay(conn_id, raw) {
                tracing::debug!("Room {}: no open counterpart for {}", code, conn_id);
            }

            match GameSignal::of(&data) {
                GameSignal::ZombieKilled => scheduler::record_kill(room, state),
                GameSignal::Pause => scheduler::set_active(room, false),
                GameSignal::Resume => scheduler::set_active(room, true),
                GameSignal::Other => {}
            }
        }
    }

    Ok(())
}

async fn handle_create(conn_id: Uuid, state: &SharedState) -> anyhow::Result<()> {
    let mut lobby = state.lobby.write().await;
    let mut conns = state.connections.write().await;

    let (host, previous) = match conns.get(&conn_id) {
        Some(conn) => (
            PeerLink::new(conn_id, conn.tx.clone()),
            conn.room_code.clone(),
        ),
        None => return Ok(()),
    };

    if let Some(previous) = previous {
        close_room(&mut lobby, &mut conns, &previous, conn_id);
    }

    let code = lobby.create_room(host, &mut rand::thread_rng())?;

    if let Some(conn) = conns.get_mut(&conn_id) {
        conn.bind(code.clone(), Side::Host);
        conn.send(ServerMessage::Created { code: code.clone() });
    }

    tracing::info!("Room created: {} ({} live)", code, lobby.len());
    Ok(())
}

async fn handle_join(conn_id: Uuid, code: Option<RoomCode>, state: &SharedState) {
    let mut lobby = state.lobby.write().await;
    let mut conns = state.connections.write().await;

    let (tx, previous) = match conns.get(&conn_id) {
        Some(conn) => (conn.tx.clone(), conn.room_code.clone()),
        None => return,
    };

    let admissible = code
        .as_ref()
        .ok_or(LobbyError::InvalidCode)
        .and_then(|code| lobby.get_room(code).ok_or(LobbyError::InvalidCode))
        .and_then(|room| room.can_admit(conn_id));

    let code = match (admissible, code) {
        (Ok(()), Some(code)) => code,
        (Err(e), code) => {
            tracing::debug!("Rejected join to {:?} from {}: {}", code, conn_id, e);
            if let Some(conn) = conns.get(&conn_id) {
                conn.send(ServerMessage::Error { msg: e.to_string() });
            }
            return;
        }
        (Ok(()), None) => return,
    };

    if let Some(previous) = previous {
        close_room(&mut lobby, &mut conns, &previous, conn_id);
    }

    let Some(room) = lobby.get_room_mut(&code) else {
        return;
    };
    if room.admit_guest(PeerLink::new(conn_id, tx)).is_err() {
        return;
    }

    if let Some(guest) = room.peer(Side::Guest) {
        guest.send(ServerMessage::Joined { side: Side::Guest });
    }
    room.host.send(ServerMessage::Joined { side: Side::Host });

    if let Some(conn) = conns.get_mut(&conn_id) {
        conn.bind(code.clone(), Side::Guest);
    }

    tracing::info!(
        "Joined room: {} ({} of {} rooms paired)",
        code,
        lobby.full_rooms(),
        lobby.len()
    );
}

pub async fn handle_disconnect(conn_id: Uuid, state: &SharedState) {
    let mut lobby = state.lobby.write().await;
    let mut conns = state.connections.write().await;

    if let Some(code) = conns.get(&conn_id).and_then(|c| c.room_code.clone()) {
        close_room(&mut lobby, &mut conns, &code, conn_id);
    }

    if let Some(conn) = conns.remove(&conn_id) {
        tracing::debug!("Connection {} unregistered ({} remaining)", conn.conn_id, conns.len());
    }
}

/// Tears a room down because `leaver` is gone: timers stop, the other member
/// is told once and unbound, and the code becomes free.
fn close_room(
    lobby: &mut RoomStore,
    conns: &mut HashMap<Uuid, ConnectionHandle>,
    code: &RoomCode,
    leaver: Uuid,
) {
    let Some(mut room) = lobby.remove_room(code) else {
        return;
    };
    room.cancel_timers();

    for peer in room.peers().filter(|p| p.conn_id != leaver) {
        peer.send(ServerMessage::Disconnect);
        if let Some(conn) = conns.get_mut(&peer.conn_id) {
            tracing::debug!("Room {}: {:?} {} left alone", code, conn.side, peer.conn_id);
            conn.unbind();
        }
    }
    if let Some(conn) = conns.get_mut(&leaver) {
        conn.unbind();
    }

    tracing::info!("Room closed: {} ({} live)", code, lobby.len());
}

async fn bound_room_code(conn_id: Uuid, state: &SharedState) -> Option<RoomCode> {
    state
        .connections
        .read()
        .await
        .get(&conn_id)
        .and_then(|c| c.room_code.clone())
}

/// The room `conn_id` is bound to, but only if it is that room's host.
async fn hosted_room<'a>(
    lobby: &'a mut RoomStore,
    conn_id: Uuid,
    state: &SharedState,
) -> Option<&'a mut Room> {
    let code = bound_room_code(conn_id, state).await?;
    lobby
        .get_room_mut(&code)
        .filter(|room| room.side_of(conn_id) == Some(Side::Host))
}
