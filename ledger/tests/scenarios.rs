//! End-to-end scenarios: 400 ms ticks, 4 slots per era, a 2-slot frame,
//! starting at tick 100. Operations use the ledger's implicit "now".

use lapse_ledger::{by_coordinate, ExpiringBalanceLedger, LedgerError};
use lapse_nullables::NullTicker;
use lapse_types::{AccountId, Coordinate, Tick, WindowParams};
use lapse_window::WindowClock;

struct Harness {
    ledger: ExpiringBalanceLedger,
    ticker: NullTicker,
    ticks_per_slot: u64,
}

impl Harness {
    fn new() -> Self {
        let clock = WindowClock::new(WindowParams::new(400, 4, 2)).unwrap();
        let ticks_per_slot = clock.ticks_per_slot();
        let ticker = NullTicker::new(100);
        let ledger = ExpiringBalanceLedger::new(clock, ticker.clone());
        Self {
            ledger,
            ticker,
            ticks_per_slot,
        }
    }

    /// Move to tick 100 of absolute slot `n`.
    fn enter_slot(&self, n: u64) {
        self.ticker.set(Tick::new(n * self.ticks_per_slot + 100));
    }

    /// Move to the first tick at which `coordinate` has left the frame.
    fn expire(&self, coordinate: Coordinate) {
        let tick = self.ledger.clock().expires_at(coordinate).unwrap();
        self.ticker.set(tick);
    }
}

fn alice() -> AccountId {
    AccountId::from_low_u8(0xa1)
}

fn bob() -> AccountId {
    AccountId::from_low_u8(0xb0)
}

fn c(era: u64, slot: u32) -> Coordinate {
    Coordinate::new(era, slot)
}

#[test]
fn burn_consumes_oldest_slot_and_balances_follow_expiry() {
    let mut h = Harness::new();

    assert_eq!(h.ledger.mint(alice(), 1).unwrap(), c(0, 0));
    h.enter_slot(1);
    assert_eq!(h.ledger.mint(alice(), 1).unwrap(), c(0, 1));
    assert_eq!(h.ledger.balance_of(&alice()), 2);

    let consumed = h.ledger.burn(alice(), 1).unwrap();
    assert_eq!(by_coordinate(&consumed), vec![(c(0, 0), 1)]);
    assert_eq!(h.ledger.balance_of(&alice()), 1);
    assert!(h.ledger.token_list(&alice(), 0, 0).is_empty());
    assert_eq!(h.ledger.token_list(&alice(), 0, 1).len(), 1);

    h.expire(c(0, 0));
    assert_eq!(h.ledger.balance_of(&alice()), 1);

    h.expire(c(0, 1));
    assert_eq!(h.ledger.balance_of(&alice()), 0);
}

#[test]
fn burn_spans_two_buckets_and_part_of_the_next_slot() {
    let mut h = Harness::new();

    h.enter_slot(2);
    h.ledger.mint(alice(), 1).unwrap();
    h.ticker.advance(1);
    h.ledger.mint(alice(), 1).unwrap();
    assert_eq!(h.ledger.token_list(&alice(), 0, 2).len(), 2);

    h.enter_slot(3);
    let first_in_slot_3 = h.ledger.now();
    h.ledger.mint(alice(), 1).unwrap();
    h.ticker.advance(1);
    let second_in_slot_3 = h.ledger.now();
    h.ledger.mint(alice(), 1).unwrap();
    assert_eq!(
        h.ledger.token_list(&alice(), 0, 3),
        vec![first_in_slot_3, second_in_slot_3]
    );
    assert_eq!(h.ledger.balance_of(&alice()), 4);

    let consumed = h.ledger.burn(alice(), 3).unwrap();
    assert_eq!(by_coordinate(&consumed), vec![(c(0, 2), 2), (c(0, 3), 1)]);
    assert_eq!(consumed.last().unwrap().creation_tick, first_in_slot_3);
    assert_eq!(h.ledger.balance_of(&alice()), 1);
    assert_eq!(h.ledger.token_list(&alice(), 0, 3), vec![second_in_slot_3]);

    // Slot 2 ages out at the era boundary; the remaining unit lives in slot 3.
    h.expire(c(0, 2));
    assert_eq!(h.ledger.coordinate_of(h.ledger.now()), c(1, 0));
    assert_eq!(h.ledger.balance_of(&alice()), 1);

    h.expire(c(0, 3));
    assert_eq!(h.ledger.balance_of(&alice()), 0);
}

#[test]
fn transfer_spends_senders_oldest_bucket_and_keeps_its_expiry() {
    let mut h = Harness::new();

    h.ledger.mint(alice(), 10).unwrap();
    h.enter_slot(1);
    h.ledger.mint(alice(), 10).unwrap();
    h.ledger.mint(bob(), 10).unwrap();
    h.ticker.advance(1);
    h.ledger.mint(bob(), 10).unwrap();
    assert_eq!(h.ledger.balance_of(&alice()), 20);
    assert_eq!(h.ledger.balance_of(&bob()), 20);

    let consumed = h.ledger.transfer(alice(), bob(), 5).unwrap();
    assert_eq!(by_coordinate(&consumed), vec![(c(0, 0), 5)]);
    assert_eq!(h.ledger.balance_of(&alice()), 15);
    assert_eq!(h.ledger.balance_of(&bob()), 25);
    let alice_oldest = h.ledger.account(&alice()).unwrap().buckets(c(0, 0));
    assert_eq!(alice_oldest[0].amount, 5);

    // Alice's oldest bucket ages out with 5 left in it; the 5 Bob received
    // from it age out at the same moment.
    h.expire(c(0, 0));
    assert_eq!(h.ledger.balance_of(&alice()), 10);
    assert_eq!(h.ledger.balance_of(&bob()), 20);
}

#[test]
fn burn_from_zero_account_is_rejected_without_state_change() {
    let mut h = Harness::new();
    h.ledger.mint(alice(), 3).unwrap();

    let err = h.ledger.burn(AccountId::ZERO, 1).unwrap_err();
    assert_eq!(err, LedgerError::InvalidSender(AccountId::ZERO));
    assert_eq!(err.to_string(), format!("invalid sender: {}", AccountId::ZERO));
    assert_eq!(h.ledger.balance_of(&alice()), 3);
    assert!(h.ledger.account(&AccountId::ZERO).is_none());
}

#[test]
fn overdrawn_transfer_and_burn_change_nothing() {
    let mut h = Harness::new();
    h.ledger.mint(alice(), 10).unwrap();
    h.ledger.mint(bob(), 5).unwrap();
    let alice_before = h.ledger.account(&alice()).cloned();
    let bob_before = h.ledger.account(&bob()).cloned();

    let err = h.ledger.transfer(alice(), bob(), 11).unwrap_err();
    assert_eq!(
        err,
        LedgerError::InsufficientBalance { available: 10, requested: 11 }
    );
    let err = h.ledger.burn(alice(), 11).unwrap_err();
    assert_eq!(
        err,
        LedgerError::InsufficientBalance { available: 10, requested: 11 }
    );
    assert_eq!(h.ledger.account(&alice()).cloned(), alice_before);
    assert_eq!(h.ledger.account(&bob()).cloned(), bob_before);

    // Expired value cannot be spent either.
    h.expire(c(0, 0));
    let err = h.ledger.transfer(alice(), bob(), 1).unwrap_err();
    assert_eq!(
        err,
        LedgerError::InsufficientBalance { available: 0, requested: 1 }
    );
}

#[test]
fn frame_wider_than_an_era_keeps_value_across_eras() {
    let clock = WindowClock::new(WindowParams::new(400, 4, 6)).unwrap();
    let tps = clock.ticks_per_slot();
    let ticker = NullTicker::new(100);
    let mut ledger = ExpiringBalanceLedger::new(clock, ticker.clone());

    ledger.mint(alice(), 7).unwrap();
    ticker.set(Tick::new(5 * tps));
    assert_eq!(ledger.coordinate_of(ledger.now()), c(1, 1));
    assert_eq!(ledger.balance_of(&alice()), 7);
    ticker.set(Tick::new(6 * tps));
    assert_eq!(ledger.balance_of(&alice()), 0);
}

#[test]
fn safe_frame_reaches_one_slot_further_back() {
    let h = Harness::new();
    h.enter_slot(5);
    let now = h.ledger.now();
    let frame = h.ledger.frame(now);
    let safe = h.ledger.safe_frame(now);
    assert_eq!((frame.from, frame.to), (c(1, 0), c(1, 1)));
    assert_eq!((safe.from, safe.to), (c(0, 3), c(1, 1)));
}

#[test]
fn account_filled_to_the_limit_accepts_value_again_after_expiry() {
    let mut h = Harness::new();
    h.ledger.mint(alice(), u128::MAX).unwrap();
    assert_eq!(h.ledger.mint(alice(), 1).unwrap_err(), LedgerError::Overflow);

    h.enter_slot(10);
    assert_eq!(h.ledger.balance_of(&alice()), 0);
    h.ledger.mint(bob(), 10).unwrap();

    h.ledger.mint(alice(), 1).unwrap();
    h.ledger.transfer(bob(), alice(), 5).unwrap();
    assert_eq!(h.ledger.balance_of(&alice()), 6);
    assert_eq!(h.ledger.balance_of(&bob()), 5);
}
