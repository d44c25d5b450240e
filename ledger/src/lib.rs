//! Expiring balance ledger.
//!
//! An account's balance is the sum of its recent mints, not a single
//! counter. Each mint lands in a bucket filed under the `(era, slot)`
//! coordinate of its tick; a bucket stops counting once its coordinate
//! leaves the retention frame. Expiry is lazy: nothing sweeps in the
//! background, stale buckets are skipped at read time and reclaimed during
//! the next mutation of their account.
//!
//! This crate handles:
//! - Per-coordinate FIFO bucket queues
//! - Per-account mint, oldest-first spend and frame-bounded balance
//! - Ledger-wide mint, burn and atomic transfer with participant checks
//! - TOML configuration of the window and transfer policy

pub mod account;
pub mod bucket;
pub mod config;
pub mod error;
pub mod ledger;

pub use account::{by_coordinate, AccountLedger, ConsumedBucket, SpendPlan};
pub use bucket::{Bucket, BucketQueue};
pub use config::{LedgerConfig, TransferPolicy};
pub use error::LedgerError;
pub use ledger::ExpiringBalanceLedger;
