//! Ledger errors.

use lapse_types::{AccountId, ConfigError};
use thiserror::Error;

/// Every way a ledger operation can be refused.
///
/// A refused operation leaves the ledger exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid sender: {0}")]
    InvalidSender(AccountId),

    #[error("invalid receiver: {0}")]
    InvalidReceiver(AccountId),

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { available: u128, requested: u128 },

    #[error("arithmetic overflow in balance")]
    Overflow,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
