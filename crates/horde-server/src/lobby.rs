use std::collections::HashMap;

use rand::Rng;

use horde_common::lobby::{LobbyError, RoomCode, CODE_CAPACITY};

use crate::room::{PeerLink, Room};

pub struct RoomStore {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Opens a room hosted by `host` under a fresh code, redrawing on collision.
    pub fn create_room(
        &mut self,
        host: PeerLink,
        rng: &mut impl Rng,
    ) -> Result<RoomCode, LobbyError> {
        if self.rooms.len() >= CODE_CAPACITY {
            return Err(LobbyError::Exhausted);
        }
        let code = loop {
            let candidate = RoomCode::random(rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        self.rooms.insert(code.clone(), Room::new(code.clone(), host));
        Ok(code)
    }

    pub fn get_room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn remove_room(&mut self, code: &RoomCode) -> Option<Room> {
        self.rooms.remove(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn full_rooms(&self) -> usize {
        self.rooms.values().filter(|r| r.is_full()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn host() -> PeerLink {
        let (tx, _rx) = mpsc::unbounded_channel();
        PeerLink::new(Uuid::new_v4(), tx)
    }

    #[test]
    fn test_codes_are_unique_while_live() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut store = RoomStore::new();
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            let code = store.create_room(host(), &mut rng).unwrap();
            assert_eq!(code.as_str().len(), 4);
            assert!(seen.insert(code));
        }
        assert_eq!(store.len(), 2000);
    }

    #[test]
    fn test_remove_frees_the_code() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        let mut store = RoomStore::new();
        let code = store.create_room(host(), &mut rng).unwrap();
        assert!(store.get_room(&code).is_some());
        assert!(store.remove_room(&code).is_some());
        assert!(store.get_room(&code).is_none());
        assert!(store.remove_room(&code).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_store_reports_exhaustion() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let mut store = RoomStore::new();
        for _ in 0..CODE_CAPACITY {
            store.create_room(host(), &mut rng).unwrap();
        }
        assert_eq!(
            store.create_room(host(), &mut rng),
            Err(LobbyError::Exhausted)
        );
    }
}
