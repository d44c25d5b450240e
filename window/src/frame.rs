//! Inclusive coordinate ranges.

use lapse_types::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::WindowClock;

/// An inclusive `[from, to]` range of coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub from: Coordinate,
    pub to: Coordinate,
}

impl Frame {
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.from <= coordinate && coordinate <= self.to
    }

    /// Whether every coordinate of `self` also lies in `other`.
    pub fn is_within(&self, other: &Frame) -> bool {
        other.from <= self.from && self.to <= other.to
    }

    /// Number of slots covered.
    pub fn len_slots(&self, clock: &WindowClock) -> u64 {
        match (clock.index_of(self.from), clock.index_of(self.to)) {
            (Some(from), Some(to)) if from <= to => to - from + 1,
            _ => 0,
        }
    }

    /// Every coordinate in the frame, oldest first.
    pub fn coordinates<'a>(&self, clock: &'a WindowClock) -> impl Iterator<Item = Coordinate> + 'a {
        clock
            .index_of(self.from)
            .zip(clock.index_of(self.to))
            .into_iter()
            .flat_map(|(from, to)| from..=to)
            .map(move |index| clock.coordinate_at_index(index))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} ..= {}]", self.from, self.to)
    }
}
