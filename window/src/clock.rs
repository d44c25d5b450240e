//! Tick to coordinate arithmetic and the sliding frame.

use lapse_types::{ConfigError, Coordinate, Tick, WindowParams};

use crate::frame::Frame;

/// Maps ticks onto `(era, slot)` coordinates and computes retention frames.
///
/// Derived quantities:
/// - `ticks_per_slot = floor(ticks_per_year / slots_per_era)`
/// - `ticks_per_era = ticks_per_slot * slots_per_era`
/// - `frame_ticks = ticks_per_slot * frame_size`
///
/// When `slots_per_era` is a power of two, slot-index conversions use
/// shifts and masks instead of division. Both paths return identical
/// coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowClock {
    params: WindowParams,
    ticks_per_slot: u64,
    ticks_per_era: u64,
    frame_ticks: u64,
    fast_path: bool,
    /// `log2(slots_per_era)`, present only when the fast path applies.
    shift: Option<u32>,
}

impl WindowClock {
    /// Build a clock from validated parameters.
    pub fn new(params: WindowParams) -> Result<Self, ConfigError> {
        Self::derive(params, true)
    }

    /// The same clock with the power-of-two fast path disabled.
    pub fn without_fast_path(self) -> Self {
        Self {
            fast_path: false,
            shift: None,
            ..self
        }
    }

    fn derive(params: WindowParams, fast_path: bool) -> Result<Self, ConfigError> {
        params.validate()?;

        let slots = params.slots_per_era as u64;
        let ticks_per_slot = params.ticks_per_year() / slots;
        if ticks_per_slot == 0 {
            return Err(ConfigError::InvalidTickDuration(params.tick_duration_ms));
        }
        let ticks_per_era = ticks_per_slot
            .checked_mul(slots)
            .ok_or(ConfigError::Overflow)?;
        let frame_ticks = ticks_per_slot
            .checked_mul(params.frame_size as u64)
            .ok_or(ConfigError::Overflow)?;

        let shift = if fast_path && params.slots_per_era.is_power_of_two() {
            Some(params.slots_per_era.trailing_zeros())
        } else {
            None
        };

        Ok(Self {
            params,
            ticks_per_slot,
            ticks_per_era,
            frame_ticks,
            fast_path,
            shift,
        })
    }

    /// Replace the window parameters.
    ///
    /// On failure the clock is left exactly as it was.
    pub fn update_window(
        &mut self,
        tick_duration_ms: u64,
        frame_size: u32,
        slots_per_era: u32,
    ) -> Result<(), ConfigError> {
        let params = WindowParams::new(tick_duration_ms, slots_per_era, frame_size);
        *self = Self::derive(params, self.fast_path)?;
        Ok(())
    }

    pub fn params(&self) -> &WindowParams {
        &self.params
    }

    pub fn ticks_per_slot(&self) -> u64 {
        self.ticks_per_slot
    }

    pub fn ticks_per_era(&self) -> u64 {
        self.ticks_per_era
    }

    /// Frame length in ticks.
    pub fn frame_ticks(&self) -> u64 {
        self.frame_ticks
    }

    pub fn slots_per_era(&self) -> u32 {
        self.params.slots_per_era
    }

    pub fn frame_size(&self) -> u32 {
        self.params.frame_size
    }

    /// Whether slot-index conversions run on the shift/mask path.
    pub fn uses_fast_path(&self) -> bool {
        self.shift.is_some()
    }

    /// Real time covered by one frame, in milliseconds (saturating).
    pub fn retention_ms(&self) -> u64 {
        self.frame_ticks.saturating_mul(self.params.tick_duration_ms)
    }

    /// Absolute slot index of a tick: slots elapsed since tick zero.
    pub fn slot_index(&self, tick: Tick) -> u64 {
        tick.as_u64() / self.ticks_per_slot
    }

    /// The coordinate containing `tick`.
    pub fn coordinate_of(&self, tick: Tick) -> Coordinate {
        match self.shift {
            Some(_) => self.coordinate_at_index(self.slot_index(tick)),
            None => {
                let t = tick.as_u64();
                Coordinate {
                    era: t / self.ticks_per_era,
                    slot: ((t % self.ticks_per_era) / self.ticks_per_slot) as u32,
                }
            }
        }
    }

    /// The coordinate of absolute slot index `index`.
    pub fn coordinate_at_index(&self, index: u64) -> Coordinate {
        match self.shift {
            Some(shift) => Coordinate {
                era: index >> shift,
                slot: (index & ((1u64 << shift) - 1)) as u32,
            },
            None => {
                let slots = self.params.slots_per_era as u64;
                Coordinate {
                    era: index / slots,
                    slot: (index % slots) as u32,
                }
            }
        }
    }

    /// Absolute slot index of a coordinate, `None` if it does not fit in u64.
    pub fn index_of(&self, coordinate: Coordinate) -> Option<u64> {
        let base = match self.shift {
            Some(shift) => {
                if coordinate.era > (u64::MAX >> shift) {
                    return None;
                }
                coordinate.era << shift
            }
            None => coordinate
                .era
                .checked_mul(self.params.slots_per_era as u64)?,
        };
        base.checked_add(coordinate.slot as u64)
    }

    /// First tick of a coordinate's slot.
    pub fn slot_start(&self, coordinate: Coordinate) -> Option<Tick> {
        self.index_of(coordinate)?
            .checked_mul(self.ticks_per_slot)
            .map(Tick::new)
    }

    /// First tick whose frame no longer contains `coordinate`.
    pub fn expires_at(&self, coordinate: Coordinate) -> Option<Tick> {
        self.index_of(coordinate)?
            .checked_add(self.params.frame_size as u64)?
            .checked_mul(self.ticks_per_slot)
            .map(Tick::new)
    }

    /// The `frame_size` slots ending at `coordinate_of(tick)`, inclusive.
    ///
    /// The lower bound clamps at the origin for ticks in the first frame.
    pub fn frame(&self, tick: Tick) -> Frame {
        self.frame_spanning(tick, self.params.frame_size as u64 - 1)
    }

    /// The frame with its lower bound pulled back one more slot.
    ///
    /// The current slot may have only just begun, so `frame` can cover less
    /// than `frame_size` fully elapsed slots; the safe frame cannot.
    pub fn safe_frame(&self, tick: Tick) -> Frame {
        self.frame_spanning(tick, self.params.frame_size as u64)
    }

    fn frame_spanning(&self, tick: Tick, slots_back: u64) -> Frame {
        let index = self.slot_index(tick);
        Frame {
            from: self.coordinate_at_index(index.saturating_sub(slots_back)),
            to: self.coordinate_at_index(index),
        }
    }

    /// Whether value minted at `minted` still counts at `now`.
    pub fn is_live(&self, minted: Tick, now: Tick) -> bool {
        self.frame(now).contains(self.coordinate_of(minted))
    }
}
