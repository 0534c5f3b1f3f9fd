//! Activity monitor
//!
//! Tracks how many consecutive snapshots came out at the same size. When the
//! run of identical sizes reaches the configured threshold, the source is
//! considered inactive and the scheduler should stop.

use serde::{Deserialize, Serialize};

/// Size history carried between cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityState {
    /// Size of the previous snapshot, `None` before the first probe
    pub last_size: Option<u64>,
    /// Consecutive repeats of `last_size` (zero right after a change)
    pub streak: u32,
}

/// What one observation concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// The threshold was reached; the caller must stop the scheduler
    pub inactive: bool,
    /// Repeats of the current size after this observation
    pub streak: u32,
    /// Snapshots in a row with the current size (`streak + 1`)
    pub run_length: u32,
}

impl ActivityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a probed size and decide whether the source went quiet
    ///
    /// The first observation, and any size change, resets the streak and
    /// never signals inactivity.
    pub fn observe(&mut self, current_size: u64, threshold: u32) -> Observation {
        if self.last_size == Some(current_size) {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
            self.last_size = Some(current_size);
        }

        let run_length = self.streak.saturating_add(1);
        Observation {
            inactive: self.streak > 0 && run_length >= threshold,
            streak: self.streak,
            run_length,
        }
    }

    /// Forget all history
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
