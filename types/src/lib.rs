//! Fundamental types for the lapse ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! ticks, account identifiers, window coordinates, window parameters and the
//! configuration error taxonomy.

pub mod account;
pub mod coordinate;
pub mod error;
pub mod params;
pub mod tick;

pub use account::AccountId;
pub use coordinate::Coordinate;
pub use error::ConfigError;
pub use params::WindowParams;
pub use tick::Tick;
