//! Operation scripts for `lapse replay`.
//!
//! A script is a TOML file with one `[[op]]` table per operation:
//!
//! ```toml
//! [[op]]
//! kind = "mint"
//! account = "0x00000000000000000000000000000000000000a1"
//! amount = 10
//! tick = 100
//!
//! [[op]]
//! kind = "transfer"
//! from = "0x00000000000000000000000000000000000000a1"
//! to = "0x00000000000000000000000000000000000000b0"
//! amount = 4
//! ```
//!
//! An op without `tick` runs at the tick of the op before it (0 for the
//! first op). Ticks may not go backwards.

use anyhow::{bail, Context};
use lapse_ledger::{ConsumedBucket, ExpiringBalanceLedger};
use lapse_types::{AccountId, Coordinate, Tick};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default, rename = "op")]
    pub ops: Vec<Op>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Op {
    Mint {
        account: AccountId,
        amount: u64,
        tick: Option<u64>,
    },
    Burn {
        account: AccountId,
        amount: u64,
        tick: Option<u64>,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: u64,
        tick: Option<u64>,
    },
    Balance {
        account: AccountId,
        tick: Option<u64>,
    },
    UpdateWindow {
        tick_duration_ms: u64,
        frame_size: u32,
        slots_per_era: u32,
        tick: Option<u64>,
    },
}

impl Op {
    fn name(&self) -> &'static str {
        match self {
            Op::Mint { .. } => "mint",
            Op::Burn { .. } => "burn",
            Op::Transfer { .. } => "transfer",
            Op::Balance { .. } => "balance",
            Op::UpdateWindow { .. } => "update_window",
        }
    }

    fn tick(&self) -> Option<u64> {
        match self {
            Op::Mint { tick, .. }
            | Op::Burn { tick, .. }
            | Op::Transfer { tick, .. }
            | Op::Balance { tick, .. }
            | Op::UpdateWindow { tick, .. } => *tick,
        }
    }
}

/// One line of replay output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outcome {
    pub index: usize,
    pub op: &'static str,
    pub tick: Tick,
    pub coordinate: Coordinate,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<u128>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumed: Vec<ConsumedBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Script {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse script {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Run every op against `ledger`.
    ///
    /// A refused ledger operation is reported in its outcome and the replay
    /// goes on. A script error (ticks going backwards) stops the replay.
    pub fn replay(&self, ledger: &mut ExpiringBalanceLedger) -> anyhow::Result<Vec<Outcome>> {
        let mut cursor = 0u64;
        let mut outcomes = Vec::with_capacity(self.ops.len());

        for (index, op) in self.ops.iter().enumerate() {
            let tick = op.tick().unwrap_or(cursor);
            if tick < cursor {
                bail!("op {index} ({}) runs at tick {tick}, before tick {cursor}", op.name());
            }
            cursor = tick;
            let tick = Tick::new(tick);

            let mut outcome = Outcome {
                index,
                op: op.name(),
                tick,
                coordinate: ledger.coordinate_of(tick),
                ok: true,
                balance: None,
                consumed: Vec::new(),
                error: None,
            };

            let result = match op {
                Op::Mint { account, amount, .. } => ledger
                    .mint_at(*account, u128::from(*amount), tick)
                    .map(|_| outcome.balance = Some(ledger.balance_of_at(account, tick))),
                Op::Burn { account, amount, .. } => ledger
                    .burn_at(*account, u128::from(*amount), tick)
                    .map(|consumed| {
                        outcome.consumed = consumed;
                        outcome.balance = Some(ledger.balance_of_at(account, tick));
                    }),
                Op::Transfer { from, to, amount, .. } => ledger
                    .transfer_at(*from, *to, u128::from(*amount), tick)
                    .map(|consumed| {
                        outcome.consumed = consumed;
                        outcome.balance = Some(ledger.balance_of_at(from, tick));
                    }),
                Op::Balance { account, .. } => {
                    outcome.balance = Some(ledger.balance_of_at(account, tick));
                    Ok(())
                }
                Op::UpdateWindow {
                    tick_duration_ms,
                    frame_size,
                    slots_per_era,
                    ..
                } => ledger
                    .update_window(*tick_duration_ms, *frame_size, *slots_per_era)
                    .map(|()| outcome.coordinate = ledger.coordinate_of(tick)),
            };

            if let Err(e) = result {
                tracing::debug!(index, op = op.name(), error = %e, "script op refused");
                outcome.ok = false;
                outcome.error = Some(e.to_string());
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
