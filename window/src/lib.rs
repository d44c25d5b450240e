//! The window clock.
//!
//! Time is a stream of ticks. Ticks group into slots, slots into eras:
//! `coordinate_of(tick) = (era, slot)`. The retention window ("frame") is the
//! run of `frame_size` slots ending at the current slot; value minted in a
//! slot outside the frame no longer counts.
//!
//! This crate is pure arithmetic. It owns no balances and never fails after
//! construction.

pub mod clock;
pub mod frame;
pub mod ticker;

pub use clock::WindowClock;
pub use frame::Frame;
pub use ticker::{SystemTicker, TickSource};
