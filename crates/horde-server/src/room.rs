use tokio::task::JoinHandle;
use uuid::Uuid;

use horde_common::lobby::{LobbyError, RoomCode, Side};
use horde_common::protocol::ServerMessage;
use horde_common::wave::WaveProgress;

use crate::connection::{Outbound, OutboundTx};

/// One side of a room: the connection id plus its outbound queue.
#[derive(Debug, Clone)]
pub struct PeerLink {
    pub conn_id: Uuid,
    tx: OutboundTx,
}

impl PeerLink {
    pub fn new(conn_id: Uuid, tx: OutboundTx) -> Self {
        Self { conn_id, tx }
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn send(&self, msg: ServerMessage) {
        let _ = self.tx.send(Outbound::Message(msg));
    }

    pub fn send_raw(&self, text: &str) -> bool {
        self.tx.send(Outbound::Relay(text.to_string())).is_ok()
    }
}

/// Owned handle to a room timer task.
#[derive(Debug)]
pub struct TimerHandle(JoinHandle<()>);

impl TimerHandle {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }

    pub fn cancel(self) {
        self.0.abort();
    }
}

pub struct Room {
    pub code: RoomCode,
    pub host: PeerLink,
    pub guest: Option<PeerLink>,
    /// Whether spawn ticks have any effect.
    pub active: bool,
    pub map: u8,
    pub progress: WaveProgress,
    /// Bumped on every wave start; timers installed under an older epoch are stale.
    pub epoch: u64,
    pub spawn_timer: Option<TimerHandle>,
    pub advance_timer: Option<TimerHandle>,
}

impl Room {
    pub fn new(code: RoomCode, host: PeerLink) -> Self {
        Self {
            code,
            host,
            guest: None,
            active: false,
            map: 0,
            progress: WaveProgress::default(),
            epoch: 0,
            spawn_timer: None,
            advance_timer: None,
        }
    }

    pub fn side_of(&self, conn_id: Uuid) -> Option<Side> {
        if self.host.conn_id == conn_id {
            Some(Side::Host)
        } else if self.guest.as_ref().is_some_and(|g| g.conn_id == conn_id) {
            Some(Side::Guest)
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        self.guest.is_some()
    }

    pub fn can_admit(&self, conn_id: Uuid) -> Result<(), LobbyError> {
        if self.is_full() || self.host.conn_id == conn_id {
            return Err(LobbyError::InvalidCode);
        }
        Ok(())
    }

    pub fn admit_guest(&mut self, guest: PeerLink) -> Result<(), LobbyError> {
        self.can_admit(guest.conn_id)?;
        self.guest = Some(guest);
        Ok(())
    }

    pub fn peer(&self, side: Side) -> Option<&PeerLink> {
        match side {
            Side::Host => Some(&self.host),
            Side::Guest => self.guest.as_ref(),
        }
    }

    /// The other member of the room, if `conn_id` is a member and the other seat is taken.
    pub fn counterpart(&self, conn_id: Uuid) -> Option<&PeerLink> {
        self.side_of(conn_id)
            .and_then(|side| self.peer(side.opposite()))
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerLink> {
        std::iter::once(&self.host).chain(self.guest.as_ref())
    }

    pub fn broadcast(&self, msg: &ServerMessage) {
        for peer in self.peers() {
            peer.send(msg.clone());
        }
    }

    /// Forwards `raw` to the sender's counterpart. Returns false when there is
    /// nobody open to receive it.
    pub fn relay(&self, from: Uuid, raw: &str) -> bool {
        match self.counterpart(from) {
            Some(target) if target.is_open() => target.send_raw(raw),
            _ => false,
        }
    }

    pub fn cancel_timers(&mut self) {
        if let Some(timer) = self.spawn_timer.take() {
            timer.cancel();
        }
        if let Some(timer) = self.advance_timer.take() {
            timer.cancel();
        }
    }
}
