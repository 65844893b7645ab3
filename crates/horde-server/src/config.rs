use std::time::Duration;

use horde_common::spawn::{Arena, SpawnTable};

pub const DEFAULT_SPAWN_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_WAVE_DELAY_MS: u64 = 3000;

/// Gameplay tuning shared by every room.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub spawn_interval: Duration,
    /// Grace period between the last kill of a wave and the next `new_wave`.
    pub wave_clear_delay: Duration,
    pub arena: Arena,
    pub spawn_table: SpawnTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spawn_interval: Duration::from_millis(DEFAULT_SPAWN_INTERVAL_MS),
            wave_clear_delay: Duration::from_millis(DEFAULT_WAVE_DELAY_MS),
            arena: Arena::default(),
            spawn_table: SpawnTable::default(),
        }
    }
}
