use serde::{Deserialize, Serialize};

pub const FIRST_WAVE: u32 = 1;
pub const BASE_QUOTA: u32 = 10;
pub const QUOTA_PER_WAVE: u32 = 5;

/// Number of enemies the server spawns during `wave`.
pub fn quota_for(wave: u32) -> u32 {
    BASE_QUOTA.saturating_add(QUOTA_PER_WAVE.saturating_mul(wave))
}

// -- Per-wave counters --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveProgress {
    pub wave: u32,
    pub quota: u32,
    pub spawned: u32,
    pub killed: u32,
}

impl WaveProgress {
    pub fn new(wave: u32) -> Self {
        Self {
            wave,
            quota: quota_for(wave),
            spawned: 0,
            killed: 0,
        }
    }

    /// Claims one spawn slot. Returns false once the quota has been issued.
    pub fn try_spawn(&mut self) -> bool {
        if self.spawned >= self.quota {
            return false;
        }
        self.spawned += 1;
        true
    }

    /// Counts a reported kill, clamped at the quota.
    ///
    /// Returns true only for the kill that brings the count up to the quota,
    /// so a wave can be cleared at most once no matter how many duplicate
    /// reports arrive afterwards.
    pub fn record_kill(&mut self) -> bool {
        if self.killed >= self.quota {
            return false;
        }
        self.killed += 1;
        self.killed == self.quota
    }

    pub fn is_cleared(&self) -> bool {
        self.killed >= self.quota
    }

    pub fn remaining_spawns(&self) -> u32 {
        self.quota - self.spawned
    }
}

impl Default for WaveProgress {
    fn default() -> Self {
        Self::new(FIRST_WAVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_ramps_linearly() {
        assert_eq!(quota_for(1), 15);
        assert_eq!(quota_for(2), 20);
        assert_eq!(quota_for(10), 60);
        assert_eq!(quota_for(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_new_wave_resets_counters() {
        let progress = WaveProgress::new(3);
        assert_eq!(progress.wave, 3);
        assert_eq!(progress.quota, 25);
        assert_eq!(progress.spawned, 0);
        assert_eq!(progress.killed, 0);
        assert_eq!(WaveProgress::default().wave, FIRST_WAVE);
    }

    #[test]
    fn test_spawns_stop_at_quota() {
        let mut progress = WaveProgress::new(1);
        let issued = (0..40).filter(|_| progress.try_spawn()).count();
        assert_eq!(issued, 15);
        assert_eq!(progress.spawned, progress.quota);
        assert_eq!(progress.remaining_spawns(), 0);
    }

    #[test]
    fn test_only_the_quota_kill_clears() {
        let mut progress = WaveProgress::new(1);
        for _ in 0..14 {
            assert!(!progress.record_kill());
        }
        assert!(!progress.is_cleared());
        assert!(progress.record_kill());
        assert!(progress.is_cleared());

        // Duplicate reports past the quota are ignored.
        for _ in 0..10 {
            assert!(!progress.record_kill());
        }
        assert_eq!(progress.killed, 15);
    }
}
