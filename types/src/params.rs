//! Window parameters: the three knobs that shape the retention window.
//!
//! A tick is worth `tick_duration_ms` of real time; a year of ticks is split
//! into `slots_per_era` slots; value stays spendable for `frame_size` slots.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Milliseconds in a mean tropical year; one era spans (at most) this long.
pub const YEAR_IN_MILLISECONDS: u64 = 31_556_926_000;

pub const MIN_TICK_DURATION_MS: u64 = 100;
pub const MAX_TICK_DURATION_MS: u64 = 600_000;

pub const MIN_SLOTS_PER_ERA: u32 = 1;
pub const MAX_SLOTS_PER_ERA: u32 = 12;

pub const MIN_FRAME_SIZE: u32 = 1;
pub const MAX_FRAME_SIZE: u32 = 64;

/// Sliding window configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParams {
    /// Real time per tick, in milliseconds.
    pub tick_duration_ms: u64,

    /// Number of slots composing one era.
    pub slots_per_era: u32,

    /// Retention length, in slots. May exceed `slots_per_era`.
    pub frame_size: u32,
}

impl WindowParams {
    pub fn new(tick_duration_ms: u64, slots_per_era: u32, frame_size: u32) -> Self {
        Self {
            tick_duration_ms,
            slots_per_era,
            frame_size,
        }
    }

    /// Check every parameter against its bounds.
    ///
    /// Parameters are checked in the order tick duration, frame size, slots
    /// per era; the first violation is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TICK_DURATION_MS..=MAX_TICK_DURATION_MS).contains(&self.tick_duration_ms) {
            return Err(ConfigError::InvalidTickDuration(self.tick_duration_ms));
        }
        if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&self.frame_size) {
            return Err(ConfigError::InvalidFrameSize(self.frame_size));
        }
        if !(MIN_SLOTS_PER_ERA..=MAX_SLOTS_PER_ERA).contains(&self.slots_per_era) {
            return Err(ConfigError::InvalidSlotsPerEra(self.slots_per_era));
        }
        Ok(())
    }

    /// Ticks in one year at this tick duration.
    pub fn ticks_per_year(&self) -> u64 {
        YEAR_IN_MILLISECONDS / self.tick_duration_ms.max(1)
    }
}

/// Twelve-second ticks, four slots per era, one era of retention.
impl Default for WindowParams {
    fn default() -> Self {
        Self {
            tick_duration_ms: 12_000,
            slots_per_era: 4,
            frame_size: 4,
        }
    }
}
