use serde::{Deserialize, Serialize};

use crate::lobby::{RoomCode, Side};
use crate::spawn::SpawnEvent;

// -- Client -> Server Messages --

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    // Lobby
    Create,
    Join {
        /// String or number; anything else is answered with an invalid-code error.
        #[serde(default)]
        code: serde_json::Value,
    },

    // Session
    StartRequest {
        data: StartData,
    },
    Restart,

    // Relay envelope
    Game {
        /// Opaque payload; only `data.subtype` is ever inspected.
        #[serde(default)]
        data: serde_json::Value,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartData {
    pub map: u8,
}

/// Gameplay subtypes the server acts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSignal {
    ZombieKilled,
    Pause,
    Resume,
    #[default]
    #[serde(other)]
    Other,
}

impl GameSignal {
    /// Reads `subtype` from a relayed payload of any shape. Anything that is
    /// not one of the recognized strings is `Other`.
    pub fn of(data: &serde_json::Value) -> Self {
        data.get("subtype")
            .and_then(|subtype| GameSignal::deserialize(subtype).ok())
            .unwrap_or_default()
    }
}

// -- Server -> Client Messages --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Created { code: RoomCode },
    Joined { side: Side },
    Error { msg: String },
    Disconnect,
    Game { data: GameEvent },
}

impl ServerMessage {
    pub fn game(event: GameEvent) -> Self {
        ServerMessage::Game { data: event }
    }
}

/// Server-authored `game` payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum GameEvent {
    Start { map: u8 },
    Restart { map: u8 },
    NewWave { wave: u32, map: u8 },
    ServerSpawn(SpawnEvent),
}

// -- Serialization helpers --

pub fn serialize_message<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

pub fn deserialize_message<T: for<'de> Deserialize<'de>>(
    text: &str,
) -> Result<T, serde_json::Error> {
    serde_json::from_str(text)
}
