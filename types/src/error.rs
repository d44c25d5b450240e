//! Configuration errors shared across crates.

use thiserror::Error;

/// Errors raised while building or reconfiguring the window clock.
///
/// These only surface at construction, `update_window` or config-load time,
/// never in the middle of a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid tick duration: {0} ms")]
    InvalidTickDuration(u64),

    #[error("invalid frame size: {0} slots")]
    InvalidFrameSize(u32),

    #[error("invalid slots per era: {0}")]
    InvalidSlotsPerEra(u32),

    #[error("arithmetic overflow in window parameters")]
    Overflow,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(String),
}
