use rand::Rng;
use tokio::time::{self, Instant, MissedTickBehavior};

use horde_common::lobby::RoomCode;
use horde_common::protocol::{GameEvent, ServerMessage};
use horde_common::spawn::{self, SpawnEvent};
use horde_common::wave::WaveProgress;

use crate::config::GameConfig;
use crate::room::{Room, TimerHandle};
use crate::server::SharedState;

// -- Wave lifecycle --

/// Resets the room to the start of `wave` and installs a fresh spawn timer.
///
/// Any spawn or advance timer from an earlier wave is cancelled first, and the
/// epoch bump makes a tick that already slipped past cancellation a no-op.
pub fn start_wave(room: &mut Room, wave: u32, state: &SharedState) {
    room.cancel_timers();
    room.epoch += 1;
    room.progress = WaveProgress::new(wave);
    room.active = true;

    tracing::info!(
        "Room {}: wave {} started (quota {}, map {})",
        room.code,
        wave,
        room.progress.quota,
        room.map
    );

    room.broadcast(&ServerMessage::game(GameEvent::NewWave {
        wave,
        map: room.map,
    }));
    room.spawn_timer = Some(spawn_timer(room.code.clone(), room.epoch, state.clone()));
}

fn spawn_timer(code: RoomCode, epoch: u64, state: SharedState) -> TimerHandle {
    let period = state.config.spawn_interval;
    TimerHandle::new(tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut lobby = state.lobby.write().await;
            let Some(room) = lobby.get_room_mut(&code).filter(|r| r.epoch == epoch) else {
                break;
            };
            spawn_tick(room, &state.config, &mut rand::thread_rng());
        }
    }))
}

/// One spawn-timer firing. Past the quota, or while paused, this does nothing.
pub fn spawn_tick(room: &mut Room, config: &GameConfig, rng: &mut impl Rng) -> Option<SpawnEvent> {
    if !room.active || !room.progress.try_spawn() {
        return None;
    }
    let event = spawn::synthesize(&config.spawn_table, &config.arena, room.map, rng);
    room.broadcast(&ServerMessage::game(GameEvent::ServerSpawn(event.clone())));
    if room.progress.remaining_spawns() == 0 {
        tracing::debug!(
            "Room {}: wave {} fully spawned ({} issued)",
            room.code,
            room.progress.wave,
            room.progress.spawned
        );
    }
    Some(event)
}

// -- Kill reports --

pub fn record_kill(room: &mut Room, state: &SharedState) {
    if !room.progress.record_kill() {
        return;
    }
    tracing::info!(
        "Room {}: wave {} cleared, next wave in {:?}",
        room.code,
        room.progress.wave,
        state.config.wave_clear_delay
    );
    schedule_advance(room, state);
}

fn schedule_advance(room: &mut Room, state: &SharedState) {
    if let Some(pending) = room.advance_timer.take() {
        pending.cancel();
    }

    let code = room.code.clone();
    let epoch = room.epoch;
    let next_wave = room.progress.wave.saturating_add(1);
    let delay = state.config.wave_clear_delay;
    let state = state.clone();

    room.advance_timer = Some(TimerHandle::new(tokio::spawn(async move {
        time::sleep(delay).await;
        let mut lobby = state.lobby.write().await;
        let Some(room) = lobby.get_room_mut(&code).filter(|r| r.epoch == epoch) else {
            return;
        };
        // This task is finishing; detach its own handle so start_wave does not abort it.
        room.advance_timer = None;
        if room.progress.is_cleared() {
            start_wave(room, next_wave, &state);
        }
    })));
}

// -- Pause / resume --

pub fn set_active(room: &mut Room, active: bool) {
    if room.active != active {
        tracing::debug!(
            "Room {}: spawning {}",
            room.code,
            if active { "resumed" } else { "paused" }
        );
    }
    room.active = active;
}
