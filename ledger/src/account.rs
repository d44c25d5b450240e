//! Per-account expiring balance.

use std::collections::BTreeMap;

use lapse_types::{Coordinate, Tick};
use lapse_window::{Frame, WindowClock};
use serde::{Deserialize, Serialize};

use crate::bucket::{Bucket, BucketQueue};
use crate::error::LedgerError;

/// A slice of one bucket taken by a spend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedBucket {
    pub coordinate: Coordinate,
    pub creation_tick: Tick,
    pub amount: u128,
}

/// Collapse consumed slices into `(coordinate, amount)` pairs, oldest first.
pub fn by_coordinate(consumed: &[ConsumedBucket]) -> Vec<(Coordinate, u128)> {
    let mut out: Vec<(Coordinate, u128)> = Vec::new();
    for c in consumed {
        match out.last_mut() {
            Some((coordinate, amount)) if *coordinate == c.coordinate => *amount += c.amount,
            _ => out.push((c.coordinate, c.amount)),
        }
    }
    out
}

/// A spend worked out against a read-only view of an account.
///
/// Building a plan is where a spend can fail; applying it cannot. Apply a
/// plan only to the account state it was built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendPlan {
    pub tick: Tick,
    pub frame: Frame,
    pub requested: u128,
    /// Slices to take, oldest first.
    pub consumed: Vec<ConsumedBucket>,
}

/// All minted value held by one account.
///
/// Queues are keyed by coordinate in an ordered map, so walking a frame is a
/// range scan in FIFO order. `total_balance` always equals the value of every
/// stored bucket; expired queues are only removed by [`AccountLedger::drop_before`],
/// which every mutating pass runs, so after a mutation at tick `t` the cached
/// total equals `balance_of(t)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountLedger {
    queues: BTreeMap<Coordinate, BucketQueue>,
    total_balance: u128,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit freshly minted value at `tick`. Returns the coordinate used.
    ///
    /// Queues that have left `frame(tick)` are reclaimed first, so expired
    /// value never takes up headroom.
    pub fn mint(
        &mut self,
        clock: &WindowClock,
        tick: Tick,
        amount: u128,
    ) -> Result<Coordinate, LedgerError> {
        let frame_start = clock.frame(tick).from;
        if !self.can_credit(frame_start, amount) {
            return Err(LedgerError::Overflow);
        }
        self.drop_before(frame_start);

        let coordinate = clock.coordinate_of(tick);
        let total = self
            .total_balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.queues
            .entry(coordinate)
            .or_default()
            .append(tick, amount)?;
        self.total_balance = total;
        Ok(coordinate)
    }

    /// Value whose coordinate lies within `frame(tick)`.
    pub fn balance_of(&self, clock: &WindowClock, tick: Tick) -> u128 {
        let frame = clock.frame(tick);
        self.queues
            .range(frame.from..=frame.to)
            .map(|(_, queue)| queue.live_total(clock, frame.from))
            .fold(0u128, u128::saturating_add)
    }

    /// Work out which buckets a spend of `amount` at `tick` would consume.
    ///
    /// Walks the frame oldest coordinate first, skipping any bucket that has
    /// already aged out. Fails with `InsufficientBalance` when the frame
    /// holds less than `amount`.
    pub fn plan_spend(
        &self,
        clock: &WindowClock,
        tick: Tick,
        amount: u128,
    ) -> Result<SpendPlan, LedgerError> {
        let frame = clock.frame(tick);
        let mut remaining = amount;
        let mut consumed = Vec::new();

        'walk: for (coordinate, queue) in self.queues.range(frame.from..=frame.to) {
            for bucket in queue.iter() {
                if remaining == 0 {
                    break 'walk;
                }
                if clock.coordinate_of(bucket.creation_tick) < frame.from {
                    continue;
                }
                let take = bucket.amount.min(remaining);
                consumed.push(ConsumedBucket {
                    coordinate: *coordinate,
                    creation_tick: bucket.creation_tick,
                    amount: take,
                });
                remaining -= take;
            }
        }

        if remaining > 0 {
            return Err(LedgerError::InsufficientBalance {
                available: self.balance_of(clock, tick),
                requested: amount,
            });
        }

        Ok(SpendPlan {
            tick,
            frame,
            requested: amount,
            consumed,
        })
    }

    /// Apply a plan built by [`AccountLedger::plan_spend`] on this same state.
    pub(crate) fn apply_spend(&mut self, clock: &WindowClock, plan: &SpendPlan) {
        for (coordinate, amount) in by_coordinate(&plan.consumed) {
            let Some(queue) = self.queues.get_mut(&coordinate) else {
                continue;
            };
            let stale = queue.drop_before(clock, plan.frame.from);
            let (taken, _) = queue.consume_from_head(amount);
            debug_assert_eq!(taken, amount, "plan applied to a different state");
            self.total_balance -= stale + taken;
            if queue.is_empty() {
                self.queues.remove(&coordinate);
            }
        }
    }

    /// Spend `amount` oldest-first at `tick`; all or nothing.
    pub fn spend(
        &mut self,
        clock: &WindowClock,
        tick: Tick,
        amount: u128,
    ) -> Result<Vec<ConsumedBucket>, LedgerError> {
        let plan = self.plan_spend(clock, tick, amount)?;
        self.apply_spend(clock, &plan);
        self.drop_before(plan.frame.from);
        Ok(plan.consumed)
    }

    /// Whether `amount` more fits once every queue older than `bound` is
    /// reclaimed.
    pub fn can_credit(&self, bound: Coordinate, amount: u128) -> bool {
        self.queues
            .range(bound..)
            .map(|(_, queue)| queue.total())
            .try_fold(amount, u128::checked_add)
            .is_some()
    }

    /// Credit consumed slices, keeping each one's coordinate and creation tick.
    ///
    /// Headroom is measured against the stored total; run
    /// [`AccountLedger::drop_before`] first to release expired value.
    pub fn credit(&mut self, consumed: &[ConsumedBucket]) -> Result<(), LedgerError> {
        let sum = consumed
            .iter()
            .try_fold(0u128, |acc, c| acc.checked_add(c.amount))
            .ok_or(LedgerError::Overflow)?;
        let total = self
            .total_balance
            .checked_add(sum)
            .ok_or(LedgerError::Overflow)?;
        // Every queue total is bounded by the account total, so these inserts
        // cannot overflow once the account total fits.
        for c in consumed {
            self.queues
                .entry(c.coordinate)
                .or_default()
                .insert(c.creation_tick, c.amount)?;
        }
        self.total_balance = total;
        Ok(())
    }

    /// Remove every queue strictly older than `bound`. Returns the value removed.
    pub fn drop_before(&mut self, bound: Coordinate) -> u128 {
        let kept = self.queues.split_off(&bound);
        let expired = std::mem::replace(&mut self.queues, kept);
        let dropped = expired
            .values()
            .map(BucketQueue::total)
            .fold(0u128, u128::saturating_add);
        if dropped > 0 {
            tracing::trace!(
                queues = expired.len(),
                dropped,
                bound = %bound,
                "reclaimed expired buckets"
            );
        }
        self.total_balance -= dropped;
        dropped
    }

    /// A copy of this account with every bucket filed under the coordinate
    /// `clock` assigns to its creation tick.
    pub fn rekeyed(&self, clock: &WindowClock) -> Result<Self, LedgerError> {
        let mut out = Self::new();
        for bucket in self.queues.values().flat_map(BucketQueue::iter) {
            out.queues
                .entry(clock.coordinate_of(bucket.creation_tick))
                .or_default()
                .insert(bucket.creation_tick, bucket.amount)?;
        }
        out.total_balance = self.total_balance;
        Ok(out)
    }

    /// Creation ticks of one coordinate's buckets, oldest first.
    pub fn token_list(&self, coordinate: Coordinate) -> Vec<Tick> {
        self.queues
            .get(&coordinate)
            .map(BucketQueue::creation_ticks)
            .unwrap_or_default()
    }

    /// Buckets of one coordinate, oldest first.
    pub fn buckets(&self, coordinate: Coordinate) -> Vec<Bucket> {
        self.queues
            .get(&coordinate)
            .map(|q| q.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Coordinates holding value, oldest first.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.queues.keys().copied()
    }

    /// Value of every stored bucket, including any not yet reclaimed.
    pub fn cached_balance(&self) -> u128 {
        self.total_balance
    }

    pub fn bucket_count(&self) -> usize {
        self.queues.values().map(BucketQueue::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapse_types::WindowParams;

    fn clock() -> WindowClock {
        WindowClock::new(WindowParams::new(400, 4, 2)).unwrap()
    }

    /// First tick of absolute slot `n`, plus `offset`.
    fn slot_tick(clock: &WindowClock, n: u64, offset: u64) -> Tick {
        Tick::new(n * clock.ticks_per_slot() + offset)
    }

    fn c(era: u64, slot: u32) -> Coordinate {
        Coordinate::new(era, slot)
    }

    #[test]
    fn mint_files_value_under_its_coordinate() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        let coordinate = acct.mint(&clock, slot_tick(&clock, 1, 5), 7).unwrap();
        assert_eq!(coordinate, c(0, 1));
        assert_eq!(acct.token_list(c(0, 1)), vec![slot_tick(&clock, 1, 5)]);
        assert_eq!(acct.cached_balance(), 7);
        assert_eq!(acct.balance_of(&clock, slot_tick(&clock, 1, 6)), 7);
    }

    #[test]
    fn same_tick_mints_coalesce() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        let t = slot_tick(&clock, 0, 100);
        acct.mint(&clock, t, 1).unwrap();
        acct.mint(&clock, t, 2).unwrap();
        assert_eq!(acct.buckets(c(0, 0)), vec![Bucket { creation_tick: t, amount: 3 }]);
    }

    #[test]
    fn balance_ignores_value_outside_frame_without_deleting_it() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 100), 4).unwrap();
        acct.mint(&clock, slot_tick(&clock, 1, 100), 6).unwrap();
        assert_eq!(acct.balance_of(&clock, slot_tick(&clock, 1, 200)), 10);
        assert_eq!(acct.balance_of(&clock, slot_tick(&clock, 2, 0)), 6);
        assert_eq!(acct.balance_of(&clock, slot_tick(&clock, 3, 0)), 0);
        // Nothing was removed: the buckets are still stored.
        assert_eq!(acct.cached_balance(), 10);
        assert_eq!(acct.bucket_count(), 2);
    }

    #[test]
    fn spend_takes_oldest_first_across_coordinates() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 1), 3).unwrap();
        acct.mint(&clock, slot_tick(&clock, 0, 2), 3).unwrap();
        acct.mint(&clock, slot_tick(&clock, 1, 1), 3).unwrap();

        let now = slot_tick(&clock, 1, 10);
        let consumed = acct.spend(&clock, now, 7).unwrap();
        assert_eq!(
            consumed,
            vec![
                ConsumedBucket { coordinate: c(0, 0), creation_tick: slot_tick(&clock, 0, 1), amount: 3 },
                ConsumedBucket { coordinate: c(0, 0), creation_tick: slot_tick(&clock, 0, 2), amount: 3 },
                ConsumedBucket { coordinate: c(0, 1), creation_tick: slot_tick(&clock, 1, 1), amount: 1 },
            ]
        );
        assert_eq!(by_coordinate(&consumed), vec![(c(0, 0), 6), (c(0, 1), 1)]);
        assert!(acct.token_list(c(0, 0)).is_empty());
        assert_eq!(acct.buckets(c(0, 1))[0].amount, 2);
        assert_eq!(acct.balance_of(&clock, now), 2);
        assert_eq!(acct.cached_balance(), 2);
    }

    #[test]
    fn spend_skips_expired_coordinates() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 1), 5).unwrap();
        acct.mint(&clock, slot_tick(&clock, 2, 1), 5).unwrap();

        let now = slot_tick(&clock, 2, 10);
        let consumed = acct.spend(&clock, now, 2).unwrap();
        assert_eq!(by_coordinate(&consumed), vec![(c(0, 2), 2)]);
        // The expired slot-0 queue was reclaimed on the way.
        assert!(acct.token_list(c(0, 0)).is_empty());
        assert_eq!(acct.cached_balance(), 3);
    }

    #[test]
    fn insufficient_balance_mutates_nothing() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 1), 5).unwrap();
        acct.mint(&clock, slot_tick(&clock, 1, 1), 5).unwrap();
        let before = acct.clone();

        let err = acct.spend(&clock, slot_tick(&clock, 2, 0), 6).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance { available: 5, requested: 6 }
        );
        assert_eq!(acct, before);
    }

    #[test]
    fn credit_preserves_coordinate_and_tick() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 50), 1).unwrap();
        acct.credit(&[
            ConsumedBucket { coordinate: c(0, 0), creation_tick: slot_tick(&clock, 0, 10), amount: 4 },
            ConsumedBucket { coordinate: c(0, 0), creation_tick: slot_tick(&clock, 0, 50), amount: 2 },
        ])
        .unwrap();
        assert_eq!(
            acct.token_list(c(0, 0)),
            vec![slot_tick(&clock, 0, 10), slot_tick(&clock, 0, 50)]
        );
        assert_eq!(acct.buckets(c(0, 0))[1].amount, 3);
        assert_eq!(acct.cached_balance(), 7);
    }

    #[test]
    fn credit_overflow_is_rejected_whole() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 1), u128::MAX - 1).unwrap();
        let before = acct.clone();
        let err = acct
            .credit(&[ConsumedBucket { coordinate: c(0, 0), creation_tick: slot_tick(&clock, 0, 2), amount: 2 }])
            .unwrap_err();
        assert_eq!(err, LedgerError::Overflow);
        assert_eq!(acct, before);
        assert!(acct.can_credit(c(0, 0), 1));
        assert!(!acct.can_credit(c(0, 0), 2));
    }

    #[test]
    fn expired_value_does_not_block_new_mints() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 100), u128::MAX).unwrap();
        assert!(!acct.can_credit(c(0, 0), 1));

        let later = slot_tick(&clock, 10, 0);
        assert_eq!(acct.balance_of(&clock, later), 0);
        assert!(acct.can_credit(clock.frame(later).from, 1));

        assert_eq!(acct.mint(&clock, later, 1).unwrap(), c(2, 2));
        assert_eq!(acct.cached_balance(), 1);
        assert_eq!(acct.balance_of(&clock, later), 1);
        assert!(acct.token_list(c(0, 0)).is_empty());
    }

    #[test]
    fn live_overflow_on_mint_changes_nothing() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 100), u128::MAX).unwrap();
        let before = acct.clone();
        assert_eq!(
            acct.mint(&clock, slot_tick(&clock, 1, 0), 1).unwrap_err(),
            LedgerError::Overflow
        );
        assert_eq!(acct, before);
    }

    #[test]
    fn drop_before_corrects_cached_total() {
        let clock = clock();
        let mut acct = AccountLedger::new();
        acct.mint(&clock, slot_tick(&clock, 0, 1), 5).unwrap();
        acct.mint(&clock, slot_tick(&clock, 3, 1), 7).unwrap();
        assert_eq!(acct.drop_before(c(0, 2)), 5);
        assert_eq!(acct.cached_balance(), 7);
        assert_eq!(acct.coordinates().collect::<Vec<_>>(), vec![c(0, 3)]);
    }

    #[test]
    fn rekeyed_files_buckets_under_new_coordinates() {
        let mut clock = clock();
        let mut acct = AccountLedger::new();
        let early = slot_tick(&clock, 1, 1);
        let late = slot_tick(&clock, 3, 1);
        acct.mint(&clock, early, 2).unwrap();
        acct.mint(&clock, late, 3).unwrap();

        // Two slots per era: each new slot spans two of the old ones.
        clock.update_window(400, 2, 2).unwrap();
        let rekeyed = acct.rekeyed(&clock).unwrap();
        assert_eq!(rekeyed.token_list(c(0, 0)), vec![early]);
        assert_eq!(rekeyed.token_list(c(0, 1)), vec![late]);
        assert_eq!(rekeyed.cached_balance(), 5);
    }
}
