#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use lapse_ledger::{ExpiringBalanceLedger, TransferPolicy};
use lapse_types::{AccountId, Tick, WindowParams};
use lapse_window::{SystemTicker, WindowClock};

#[derive(Arbitrary, Debug)]
enum Op {
    Mint { to: u8, amount: u128 },
    Burn { from: u8, amount: u128 },
    Transfer { from: u8, to: u8, amount: u128 },
    UpdateWindow { tick_duration_ms: u64, frame_size: u32, slots_per_era: u32 },
}

#[derive(Arbitrary, Debug)]
struct Input {
    tick_duration_ms: u64,
    slots_per_era: u32,
    frame_size: u32,
    remint: bool,
    steps: Vec<(Op, u32)>,
}

// Account 0 is the zero account, so invalid participants get exercised too.
fn account(n: u8) -> AccountId {
    AccountId::from_low_u8(n % 5)
}

// Drive arbitrary operation sequences. Nothing may panic, a refused
// operation must leave its accounts untouched, and no account may ever
// report more than it holds.
fuzz_target!(|input: Input| {
    let params = WindowParams::new(input.tick_duration_ms, input.slots_per_era, input.frame_size);
    let Ok(clock) = WindowClock::new(params) else {
        return;
    };
    let policy = if input.remint { TransferPolicy::Remint } else { TransferPolicy::PreserveOrigin };
    let mut ledger = ExpiringBalanceLedger::new(clock, SystemTicker::new(&params)).with_policy(policy);

    let mut now = Tick::ZERO;
    for (op, dt) in input.steps {
        now = now.saturating_add(u64::from(dt));
        match op {
            Op::Mint { to, amount } => {
                let _ = ledger.mint_at(account(to), amount, now);
            }
            Op::Burn { from, amount } => {
                let before = ledger.account(&account(from)).cloned();
                if ledger.burn_at(account(from), amount, now).is_err() {
                    assert_eq!(ledger.account(&account(from)).cloned(), before);
                }
            }
            Op::Transfer { from, to, amount } => {
                let sender = ledger.account(&account(from)).cloned();
                let receiver = ledger.account(&account(to)).cloned();
                if ledger.transfer_at(account(from), account(to), amount, now).is_err() {
                    assert_eq!(ledger.account(&account(from)).cloned(), sender);
                    assert_eq!(ledger.account(&account(to)).cloned(), receiver);
                }
            }
            Op::UpdateWindow { tick_duration_ms, frame_size, slots_per_era } => {
                let _ = ledger.update_window(tick_duration_ms, frame_size, slots_per_era);
            }
        }

        for (_, state) in ledger.accounts() {
            assert!(state.balance_of(ledger.clock(), now) <= state.cached_balance());
        }
    }
});
