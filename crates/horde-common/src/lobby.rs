use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CODE_MIN: u16 = 1000;
pub const CODE_MAX: u16 = 9999;

/// Number of distinct room codes that can be live at the same time.
pub const CODE_CAPACITY: usize = (CODE_MAX - CODE_MIN + 1) as usize;

/// Short numeric code that identifies a live room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self(rng.gen_range(CODE_MIN..=CODE_MAX).to_string())
    }

    /// Accepts exactly four ASCII digits.
    pub fn parse(input: &str) -> Option<Self> {
        if input.len() == 4 && input.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(input.to_string()))
        } else {
            None
        }
    }

    /// Peers send the code either as a string or as a bare JSON number.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::parse(s.trim()),
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| Self::parse(&n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Host,
    Guest,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Host => Side::Guest,
            Side::Guest => Side::Host,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// Unknown code, or the room already has a guest.
    #[error("Invalid Code")]
    InvalidCode,
    #[error("all room codes are in use")]
    Exhausted,
}
