//! Multi-turn unwrap of the modular angle reading.

use crate::utils;

/// Accumulates raw angle samples into an unbounded position.
///
/// Consecutive samples must be less than half a revolution apart, otherwise
/// the direction of travel is ambiguous and the position aliases. The first
/// sample after construction or [`Self::reset`] is taken as an absolute
/// position within the first revolution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnwrapTracker {
    resolution: u16,
    last_raw: u16,
    accumulated: i64,
    zero_offset: u16,
    primed: bool,
}

impl UnwrapTracker {
    #[must_use]
    pub const fn new(resolution: u16) -> Self {
        Self {
            resolution,
            last_raw: 0,
            accumulated: 0,
            zero_offset: 0,
            primed: false,
        }
    }

    /// Feed a fresh raw sample and return the offset-corrected position in
    /// `[0, resolution)`
    pub fn update(&mut self, raw: u16) -> u16 {
        if self.primed {
            let delta = utils::wrapping_delta(raw, self.last_raw, self.resolution);
            self.accumulated = self.accumulated.wrapping_add(i64::from(delta));
        } else {
            self.accumulated = i64::from(raw);
            self.primed = true;
        }
        self.last_raw = raw;
        self.reduced()
    }

    /// Current offset-corrected position in `[0, resolution)`
    #[must_use]
    pub fn reduced(&self) -> u16 {
        utils::reduce(self.accumulated, i64::from(self.zero_offset), self.resolution)
    }

    /// Clear the accumulated position and the zero offset.
    ///
    /// The next update is an absolute measurement rather than a delta from
    /// stale history.
    pub fn reset(&mut self) {
        self.last_raw = 0;
        self.accumulated = 0;
        self.zero_offset = 0;
        self.primed = false;
    }

    pub fn set_zero_offset(&mut self, offset: u16) {
        self.zero_offset = offset % self.resolution;
    }

    #[must_use]
    pub const fn zero_offset(&self) -> u16 {
        self.zero_offset
    }

    /// Total signed travel in raw counts since power-up or the last reset
    #[must_use]
    pub const fn accumulated(&self) -> i64 {
        self.accumulated
    }

    #[must_use]
    pub const fn last_raw(&self) -> u16 {
        self.last_raw
    }

    /// Whole revolutions travelled, rounded towards negative infinity
    #[must_use]
    pub fn turns(&self) -> i64 {
        self.accumulated
            .wrapping_sub(i64::from(self.zero_offset))
            .div_euclid(i64::from(self.resolution))
    }

    #[must_use]
    pub const fn resolution(&self) -> u16 {
        self.resolution
    }
}
