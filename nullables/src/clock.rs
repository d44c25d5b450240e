//! Nullable tick source: deterministic time for testing.

use lapse_types::Tick;
use lapse_window::TickSource;
use std::cell::Cell;
use std::rc::Rc;

/// A deterministic tick source.
///
/// Time only advances when you tell it to. Clones share the same counter,
/// so a test can hand one clone to a ledger and keep another to drive it.
#[derive(Clone, Debug, Default)]
pub struct NullTicker {
    current: Rc<Cell<u64>>,
}

impl NullTicker {
    pub fn new(initial: u64) -> Self {
        Self {
            current: Rc::new(Cell::new(initial)),
        }
    }

    /// Get the current tick.
    pub fn now(&self) -> Tick {
        Tick::new(self.current.get())
    }

    /// Advance by a number of ticks.
    pub fn advance(&self, ticks: u64) {
        self.current.set(self.current.get().saturating_add(ticks));
    }

    /// Set the tick to a specific value.
    pub fn set(&self, tick: Tick) {
        self.current.set(tick.as_u64());
    }
}

impl TickSource for NullTicker {
    fn current_tick(&self) -> Tick {
        self.now()
    }
}
