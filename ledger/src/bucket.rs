//! Buckets and the per-coordinate FIFO queue.

use std::collections::VecDeque;

use lapse_types::{Coordinate, Tick};
use lapse_window::WindowClock;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Value created at one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub creation_tick: Tick,
    /// Always strictly positive while the bucket is queued.
    pub amount: u128,
}

/// Buckets of one `(account, coordinate)` cell, oldest first.
///
/// Creation ticks are strictly increasing from head to tail; two credits at
/// the same tick share a bucket. `total` is kept in step with the buckets so
/// the cell's value is O(1).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BucketQueue {
    buckets: VecDeque<Bucket>,
    total: u128,
}

impl BucketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add value at the tail.
    ///
    /// Fast path O(1): ticks only move forward, so the new bucket either
    /// merges into the tail or becomes the new tail. An older tick falls
    /// back to [`BucketQueue::insert`].
    pub fn append(&mut self, creation_tick: Tick, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        if self
            .buckets
            .back()
            .is_some_and(|tail| tail.creation_tick > creation_tick)
        {
            return self.insert(creation_tick, amount);
        }
        let total = self.total.checked_add(amount).ok_or(LedgerError::Overflow)?;
        match self.buckets.back_mut() {
            Some(tail) if tail.creation_tick == creation_tick => tail.amount += amount,
            _ => self.buckets.push_back(Bucket {
                creation_tick,
                amount,
            }),
        }
        self.total = total;
        Ok(())
    }

    /// Add value at its sorted position, merging with an equal tick.
    ///
    /// Used when transferred value keeps its original creation tick and so
    /// may land before buckets the receiver already holds.
    pub fn insert(&mut self, creation_tick: Tick, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let total = self.total.checked_add(amount).ok_or(LedgerError::Overflow)?;
        let pos = self
            .buckets
            .partition_point(|b| b.creation_tick < creation_tick);
        match self.buckets.get_mut(pos) {
            Some(bucket) if bucket.creation_tick == creation_tick => bucket.amount += amount,
            _ => self.buckets.insert(
                pos,
                Bucket {
                    creation_tick,
                    amount,
                },
            ),
        }
        self.total = total;
        Ok(())
    }

    /// Take up to `max_amount` from the head.
    ///
    /// Fully drained buckets are removed; a partially drained head keeps its
    /// place with a reduced amount. Returns the amount taken and whether the
    /// last bucket touched was removed (no partial remainder at the head).
    pub fn consume_from_head(&mut self, max_amount: u128) -> (u128, bool) {
        let mut consumed = 0u128;
        let mut exhausted_head = false;
        while consumed < max_amount {
            let Some(head) = self.buckets.front_mut() else {
                break;
            };
            let wanted = max_amount - consumed;
            if head.amount <= wanted {
                consumed += head.amount;
                self.buckets.pop_front();
                exhausted_head = true;
            } else {
                head.amount -= wanted;
                consumed += wanted;
                exhausted_head = false;
            }
        }
        self.total -= consumed;
        (consumed, exhausted_head)
    }

    /// Discard head buckets whose coordinate is strictly older than `bound`.
    ///
    /// Returns the discarded amount.
    pub fn drop_before(&mut self, clock: &WindowClock, bound: Coordinate) -> u128 {
        let mut dropped = 0u128;
        while let Some(head) = self.buckets.front() {
            if clock.coordinate_of(head.creation_tick) >= bound {
                break;
            }
            dropped += head.amount;
            self.buckets.pop_front();
        }
        self.total -= dropped;
        dropped
    }

    /// Value of buckets whose coordinate is at or after `bound`.
    ///
    /// Buckets are ordered by tick, so stale buckets can only form a prefix.
    pub fn live_total(&self, clock: &WindowClock, bound: Coordinate) -> u128 {
        let stale: u128 = self
            .buckets
            .iter()
            .take_while(|b| clock.coordinate_of(b.creation_tick) < bound)
            .map(|b| b.amount)
            .sum();
        self.total - stale
    }

    pub fn total(&self) -> u128 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn front(&self) -> Option<&Bucket> {
        self.buckets.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Creation ticks, oldest first.
    pub fn creation_ticks(&self) -> Vec<Tick> {
        self.buckets.iter().map(|b| b.creation_tick).collect()
    }
}
