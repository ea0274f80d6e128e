//! Shaft speed from successive accumulated positions.

/// First-order filtered speed estimate in revolutions per second
///
/// Feed it [`crate::Encoder::accumulated_angle`] once per control tick. The
/// first update only records the position. Zero calibration restarts the
/// accumulated angle, so call [`Self::reset`] with the new position after it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VelocityEstimator {
    counts_to_rps: f32,
    alpha: f32,
    last_position: i64,
    velocity: f32,
    seeded: bool,
}

impl VelocityEstimator {
    /// `alpha` weights the previous estimate; `0.0` disables filtering
    #[must_use]
    pub fn new(resolution: u16, tick_hz: u32, alpha: f32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let counts_to_rps = tick_hz as f32 / f32::from(resolution);
        Self {
            counts_to_rps,
            alpha: alpha.clamp(0.0, 1.0),
            last_position: 0,
            velocity: 0.0,
            seeded: false,
        }
    }

    /// Estimator configured from the encoder settings
    #[must_use]
    pub fn from_config(config: &crate::Config) -> Self {
        Self::new(config.resolution, config.tick_hz, config.velocity_alpha)
    }

    /// Restart from `position` with zero speed
    pub fn reset(&mut self, position: i64) {
        self.last_position = position;
        self.velocity = 0.0;
        self.seeded = true;
    }

    /// Advance one tick and return the filtered speed
    pub fn update(&mut self, position: i64) -> f32 {
        if !self.seeded {
            self.reset(position);
            return self.velocity;
        }
        let delta = position.wrapping_sub(self.last_position);
        self.last_position = position;
        #[allow(clippy::cast_precision_loss)]
        let instantaneous = delta as f32 * self.counts_to_rps;
        self.velocity = self.alpha * self.velocity + (1.0 - self.alpha) * instantaneous;
        self.velocity
    }

    #[must_use]
    pub const fn velocity(&self) -> f32 {
        self.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn one_count_per_tick_without_filtering() {
        let mut estimator = VelocityEstimator::new(4096, 2000, 0.0);
        estimator.reset(0);
        assert!((estimator.update(1) - 0.488_281_2).abs() < EPSILON);
    }

    #[test]
    fn converges_to_steady_speed() {
        let mut estimator = VelocityEstimator::new(4096, 2000, 0.9);
        let mut position = 0i64;
        for _ in 0..200 {
            position += 4096 / 8;
            estimator.update(position);
        }
        assert!((estimator.velocity() - 250.0).abs() < 0.1);
    }

    #[test]
    fn built_from_config() {
        let config = crate::Config::DEFAULT.with_velocity(1000, 0.0);
        let mut estimator = VelocityEstimator::from_config(&config);
        estimator.reset(0);
        assert!((estimator.update(4096) - 1000.0).abs() < EPSILON);
    }

    #[test]
    fn first_update_seeds_position() {
        let mut estimator = VelocityEstimator::new(4096, 2000, 0.0);
        assert!(estimator.update(3_000).abs() < EPSILON);
        assert!((estimator.update(3_001) - 0.488_281_2).abs() < EPSILON);
    }

    #[test]
    fn reverse_rotation_is_negative() {
        let mut estimator = VelocityEstimator::new(4096, 2000, 0.0);
        estimator.reset(10_000);
        assert!(estimator.update(10_000 - 4096) < 0.0);
        estimator.reset(0);
        assert!(estimator.velocity().abs() < EPSILON);
    }
}
