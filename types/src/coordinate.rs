//! Window coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An `(era, slot)` position on the window clock.
///
/// Ordering is lexicographic: all slots of era `n` precede every slot of
/// era `n + 1`. Field order matters for the derived `Ord`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub era: u64,
    pub slot: u32,
}

impl Coordinate {
    /// The first coordinate of the clock.
    pub const ORIGIN: Self = Self { era: 0, slot: 0 };

    pub fn new(era: u64, slot: u32) -> Self {
        Self { era, slot }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.era, self.slot)
    }
}
