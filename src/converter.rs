//! Conversion of the reduced raw position into mechanical and electrical angle.

use core::f32::consts::TAU;

/// Scales reduced raw samples into radians
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AngleConverter {
    resolution: u16,
    pole_pairs: u8,
    mechanical_scale: f32,
    electrical_scale: f32,
}

impl AngleConverter {
    #[must_use]
    pub fn new(resolution: u16, pole_pairs: u8) -> Self {
        let counts = f32::from(resolution);
        Self {
            resolution,
            pole_pairs,
            mechanical_scale: TAU / counts,
            electrical_scale: TAU * f32::from(pole_pairs) / counts,
        }
    }

    /// Mechanical angle in `[0, 2π)` for a sample in `[0, resolution)`
    #[must_use]
    pub fn mechanical_radians(&self, sample: u16) -> f32 {
        wrap_turn(f32::from(sample % self.resolution) * self.mechanical_scale)
    }

    /// Electrical angle in `[0, 2π)` for a sample in `[0, resolution)`
    #[must_use]
    pub fn electrical_radians(&self, sample: u16) -> f32 {
        let within_cycle = sample % self.counts_per_electrical_cycle();
        wrap_turn(f32::from(within_cycle) * self.electrical_scale)
    }

    #[must_use]
    pub const fn counts_per_electrical_cycle(&self) -> u16 {
        self.resolution / self.pole_pairs as u16
    }

    #[must_use]
    pub const fn pole_pairs(&self) -> u8 {
        self.pole_pairs
    }
}

// Float rounding can land a value a hair past 2π when the resolution is not
// a multiple of the pole pair count.
fn wrap_turn(angle: f32) -> f32 {
    if angle >= TAU { angle - TAU } else { angle }
}
