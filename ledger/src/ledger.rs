//! The expiring balance ledger: every account, one clock.

use std::collections::HashMap;

use lapse_types::{AccountId, Coordinate, Tick};
use lapse_window::{Frame, TickSource, WindowClock};

use crate::account::{AccountLedger, ConsumedBucket, SpendPlan};
use crate::config::{LedgerConfig, TransferPolicy};
use crate::error::LedgerError;

/// Mint, burn and transfer value that expires.
///
/// Every public operation is one atomic step: it either commits in full or
/// returns an error with the ledger untouched. Spends are planned against a
/// read-only view first; every fallible check runs against the plan, and only
/// then are both sides of the operation mutated.
///
/// Operations without an explicit tick read "now" from the ledger's
/// [`TickSource`].
pub struct ExpiringBalanceLedger {
    clock: WindowClock,
    accounts: HashMap<AccountId, AccountLedger>,
    ticks: Box<dyn TickSource>,
    policy: TransferPolicy,
}

impl ExpiringBalanceLedger {
    pub fn new(clock: WindowClock, ticks: impl TickSource + 'static) -> Self {
        Self {
            clock,
            accounts: HashMap::new(),
            ticks: Box::new(ticks),
            policy: TransferPolicy::default(),
        }
    }

    /// Build a ledger from a loaded configuration.
    pub fn from_config(
        config: &LedgerConfig,
        ticks: impl TickSource + 'static,
    ) -> Result<Self, LedgerError> {
        Ok(Self::new(config.clock()?, ticks).with_policy(config.transfer_policy))
    }

    pub fn with_policy(mut self, policy: TransferPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    pub fn clock(&self) -> &WindowClock {
        &self.clock
    }

    /// The current tick according to the tick source.
    pub fn now(&self) -> Tick {
        self.ticks.current_tick()
    }

    // ── Window queries ───────────────────────────────────────────────────

    pub fn coordinate_of(&self, tick: Tick) -> Coordinate {
        self.clock.coordinate_of(tick)
    }

    pub fn frame(&self, tick: Tick) -> Frame {
        self.clock.frame(tick)
    }

    pub fn safe_frame(&self, tick: Tick) -> Frame {
        self.clock.safe_frame(tick)
    }

    /// Reconfigure the window.
    ///
    /// Every stored bucket is re-filed under the coordinate the new clock
    /// assigns to its creation tick. Validation and re-filing both finish
    /// before anything is swapped in, so a rejected update changes nothing.
    pub fn update_window(
        &mut self,
        tick_duration_ms: u64,
        frame_size: u32,
        slots_per_era: u32,
    ) -> Result<(), LedgerError> {
        let mut clock = self.clock.clone();
        if let Err(e) = clock.update_window(tick_duration_ms, frame_size, slots_per_era) {
            tracing::warn!(tick_duration_ms, frame_size, slots_per_era, error = %e, "window update rejected");
            return Err(e.into());
        }

        let accounts = self
            .accounts
            .iter()
            .map(|(id, ledger)| ledger.rekeyed(&clock).map(|l| (*id, l)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        self.accounts = accounts;
        self.clock = clock;
        tracing::info!(
            tick_duration_ms,
            frame_size,
            slots_per_era,
            ticks_per_slot = self.clock.ticks_per_slot(),
            "window updated"
        );
        Ok(())
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Mint `amount` to `account` at the current tick.
    pub fn mint(&mut self, account: AccountId, amount: u128) -> Result<Coordinate, LedgerError> {
        let now = self.now();
        self.mint_at(account, amount, now)
    }

    /// Mint `amount` to `account` at `tick`. Returns the coordinate credited.
    pub fn mint_at(
        &mut self,
        account: AccountId,
        amount: u128,
        tick: Tick,
    ) -> Result<Coordinate, LedgerError> {
        if account.is_zero() {
            tracing::warn!(%account, amount, "mint rejected: invalid receiver");
            return Err(LedgerError::InvalidReceiver(account));
        }
        let coordinate = self.clock.coordinate_of(tick);
        if amount == 0 {
            return Ok(coordinate);
        }

        let ledger = self.accounts.entry(account).or_default();
        if let Err(e) = ledger.mint(&self.clock, tick, amount) {
            tracing::warn!(%account, amount, %tick, "mint rejected: balance overflow");
            return Err(e);
        }

        tracing::debug!(%account, amount, %tick, %coordinate, "minted");
        Ok(coordinate)
    }

    /// Burn `amount` from `account` at the current tick.
    pub fn burn(
        &mut self,
        account: AccountId,
        amount: u128,
    ) -> Result<Vec<ConsumedBucket>, LedgerError> {
        let now = self.now();
        self.burn_at(account, amount, now)
    }

    /// Burn `amount` from `account` at `tick`, oldest value first.
    ///
    /// Returns the slices destroyed.
    pub fn burn_at(
        &mut self,
        account: AccountId,
        amount: u128,
        tick: Tick,
    ) -> Result<Vec<ConsumedBucket>, LedgerError> {
        if account.is_zero() {
            tracing::warn!(%account, amount, "burn rejected: invalid sender");
            return Err(LedgerError::InvalidSender(account));
        }
        if amount == 0 {
            return Ok(Vec::new());
        }

        let plan = self.plan_spend(&account, tick, amount)?;
        self.commit_spend(&account, &plan);

        tracing::debug!(
            %account,
            amount = plan.requested,
            tick = %plan.tick,
            slices = plan.consumed.len(),
            "burned"
        );
        Ok(plan.consumed)
    }

    /// Transfer `amount` from `from` to `to` at the current tick.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<Vec<ConsumedBucket>, LedgerError> {
        let now = self.now();
        self.transfer_at(from, to, amount, now)
    }

    /// Transfer `amount` from `from` to `to` at `tick`.
    ///
    /// The sender's oldest value goes first. Under
    /// [`TransferPolicy::PreserveOrigin`] the receiver gets the same slices
    /// with their original coordinates and ticks, so a transfer never
    /// extends the life of value; under [`TransferPolicy::Remint`] it gets one
    /// fresh bucket at `tick`.
    pub fn transfer_at(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: u128,
        tick: Tick,
    ) -> Result<Vec<ConsumedBucket>, LedgerError> {
        if from.is_zero() {
            tracing::warn!(%from, %to, amount, "transfer rejected: invalid sender");
            return Err(LedgerError::InvalidSender(from));
        }
        if to.is_zero() {
            tracing::warn!(%from, %to, amount, "transfer rejected: invalid receiver");
            return Err(LedgerError::InvalidReceiver(to));
        }
        if amount == 0 {
            return Ok(Vec::new());
        }

        let plan = self.plan_spend(&from, tick, amount)?;
        if from != to {
            let fits = self
                .accounts
                .get(&to)
                .map_or(true, |receiver| receiver.can_credit(plan.frame.from, plan.requested));
            if !fits {
                tracing::warn!(%from, %to, amount, "transfer rejected: receiver balance overflow");
                return Err(LedgerError::Overflow);
            }
        }

        // Commit. Nothing below can fail: the sender's plan is exact and the
        // receiver's headroom, less its expired queues, was checked above.
        self.commit_spend(&from, &plan);
        let receiver = self.accounts.entry(to).or_default();
        receiver.drop_before(plan.frame.from);
        match self.policy {
            TransferPolicy::PreserveOrigin => receiver.credit(&plan.consumed)?,
            TransferPolicy::Remint => {
                receiver.mint(&self.clock, plan.tick, plan.requested)?;
            }
        }

        tracing::debug!(
            %from,
            %to,
            amount = plan.requested,
            tick = %plan.tick,
            slices = plan.consumed.len(),
            "transferred"
        );
        Ok(plan.consumed)
    }

    fn plan_spend(
        &self,
        account: &AccountId,
        tick: Tick,
        amount: u128,
    ) -> Result<SpendPlan, LedgerError> {
        let result = match self.accounts.get(account) {
            Some(ledger) => ledger.plan_spend(&self.clock, tick, amount),
            None => Err(LedgerError::InsufficientBalance {
                available: 0,
                requested: amount,
            }),
        };
        if let Err(LedgerError::InsufficientBalance { available, requested }) = &result {
            tracing::warn!(%account, available, requested, %tick, "spend rejected: insufficient balance");
        }
        result
    }

    fn commit_spend(&mut self, account: &AccountId, plan: &SpendPlan) {
        if let Some(ledger) = self.accounts.get_mut(account) {
            ledger.apply_spend(&self.clock, plan);
            ledger.drop_before(plan.frame.from);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Spendable balance of `account` at the current tick.
    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balance_of_at(account, self.now())
    }

    /// Spendable balance of `account` at `tick`.
    pub fn balance_of_at(&self, account: &AccountId, tick: Tick) -> u128 {
        self.accounts
            .get(account)
            .map_or(0, |ledger| ledger.balance_of(&self.clock, tick))
    }

    /// Sum of every account's spendable balance at `tick`.
    pub fn total_supply_at(&self, tick: Tick) -> u128 {
        self.accounts
            .values()
            .map(|ledger| ledger.balance_of(&self.clock, tick))
            .fold(0u128, u128::saturating_add)
    }

    /// Creation ticks held by `account` at `(era, slot)`, oldest first.
    pub fn token_list(&self, account: &AccountId, era: u64, slot: u32) -> Vec<Tick> {
        self.accounts
            .get(account)
            .map(|ledger| ledger.token_list(Coordinate::new(era, slot)))
            .unwrap_or_default()
    }

    pub fn account(&self, account: &AccountId) -> Option<&AccountLedger> {
        self.accounts.get(account)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &AccountLedger)> {
        self.accounts.iter()
    }
}
