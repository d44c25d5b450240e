//! Where "now" comes from.

use lapse_types::{Tick, WindowParams};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of the current tick.
///
/// The ledger's implicit-`now` operations read the tick from here. Block
/// based deployments feed block numbers; time based deployments quantize the
/// wall clock with [`SystemTicker`]. Tests use a manually advanced source.
pub trait TickSource {
    fn current_tick(&self) -> Tick;
}

/// Wall-clock time quantized to the configured tick duration.
#[derive(Clone, Copy, Debug)]
pub struct SystemTicker {
    tick_duration_ms: u64,
}

impl SystemTicker {
    pub fn new(params: &WindowParams) -> Self {
        Self::with_duration(params.tick_duration_ms)
    }

    pub fn with_duration(tick_duration_ms: u64) -> Self {
        Self {
            tick_duration_ms: tick_duration_ms.max(1),
        }
    }

    /// Tick containing the given Unix time in milliseconds.
    pub fn tick_at(&self, unix_ms: u64) -> Tick {
        Tick::new(unix_ms / self.tick_duration_ms)
    }
}

impl TickSource for SystemTicker {
    fn current_tick(&self) -> Tick {
        // A clock set before 1970 reads as tick zero.
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.tick_at(unix_ms)
    }
}
