//! Device and motor constants.

/// Settings for the zero calibration routine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    /// d-axis field magnitude applied while aligning, as a fraction of full modulation
    pub d_axis: f32,
    /// q-axis field magnitude applied while aligning
    pub q_axis: f32,
    /// Electrical angle of the applied field vector in radians
    pub theta: f32,
    /// Time the rotor is given to settle under the applied field
    pub settle_ms: u32,
}

impl CalibrationConfig {
    pub const DEFAULT: Self = Self {
        d_axis: 0.6,
        q_axis: 0.0,
        theta: 0.0,
        settle_ms: 250,
    };
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Encoder configuration
///
/// `resolution` must be a multiple of `pole_pairs` for the electrical angle
/// to line up with the motor's electrical cycles. This is not checked.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Distinct positions per mechanical revolution
    pub resolution: u16,
    /// Status bits below the angle in a response word
    pub angle_shift: u8,
    /// Motor pole pairs
    pub pole_pairs: u8,
    /// Minimum delay between CS assertion and the first clock edge
    pub cs_setup_ns: u32,
    /// Minimum delay between the last clock edge and CS release
    pub cs_hold_ns: u32,
    /// Wait after power-up before the first configuration write
    pub power_on_settle_ms: u32,
    /// Wait after each configuration write
    pub register_settle_ms: u32,
    /// Attempts per register exchange before giving up
    pub transport_attempts: u8,
    /// Linear backoff step between attempts
    pub retry_backoff_us: u32,
    /// Control loop frequency, used for velocity estimation
    pub tick_hz: u32,
    /// Velocity low-pass coefficient in `[0, 1)`; higher is smoother
    pub velocity_alpha: f32,
    pub calibration: CalibrationConfig,
}

impl Config {
    pub const DEFAULT: Self = Self {
        resolution: 4096,
        angle_shift: 4,
        pole_pairs: 7,
        cs_setup_ns: 1_000,
        cs_hold_ns: 1_000,
        power_on_settle_ms: 100,
        register_settle_ms: 1,
        transport_attempts: 3,
        retry_backoff_us: 10,
        tick_hz: 2_000,
        velocity_alpha: 0.9,
        calibration: CalibrationConfig::DEFAULT,
    };

    #[must_use]
    pub const fn with_resolution(mut self, resolution: u16, angle_shift: u8) -> Self {
        self.resolution = resolution;
        self.angle_shift = angle_shift;
        self
    }

    #[must_use]
    pub const fn with_pole_pairs(mut self, pole_pairs: u8) -> Self {
        self.pole_pairs = pole_pairs;
        self
    }

    #[must_use]
    pub const fn with_cs_timing(mut self, setup_ns: u32, hold_ns: u32) -> Self {
        self.cs_setup_ns = setup_ns;
        self.cs_hold_ns = hold_ns;
        self
    }

    #[must_use]
    pub const fn with_retries(mut self, attempts: u8, backoff_us: u32) -> Self {
        self.transport_attempts = attempts;
        self.retry_backoff_us = backoff_us;
        self
    }

    #[must_use]
    pub const fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }

    #[must_use]
    pub const fn with_velocity(mut self, tick_hz: u32, alpha: f32) -> Self {
        self.tick_hz = tick_hz;
        self.velocity_alpha = alpha;
        self
    }

    /// Whether the settings can drive the encoder without overflowing or
    /// dividing by zero
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.resolution != 0
            && self.resolution <= 1 << 15
            && self.angle_shift < 16
            && self.pole_pairs != 0
            && self.pole_pairs as u16 <= self.resolution
    }

    /// Raw positions per electrical cycle
    #[must_use]
    pub const fn counts_per_electrical_cycle(&self) -> u16 {
        self.resolution / self.pole_pairs as u16
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
