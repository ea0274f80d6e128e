//! Encoder facade used by the control loop

use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use crate::{
    calibration::ZeroCalibration,
    config::Config,
    converter::AngleConverter,
    driver::RegisterInterface,
    error::{CalibrationError, Error},
    power_stage::PowerStage,
    tracker::UnwrapTracker,
};

/// Magnetic encoder with multi-turn tracking and zero calibration
///
/// Owns the unwrap state exclusively; sampling and calibration both take
/// `&mut self`, so a single task drives the encoder. Share it between tasks
/// behind a mutex.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Encoder<SPI, D> {
    interface: RegisterInterface<SPI, D>,
    tracker: UnwrapTracker,
    converter: AngleConverter,
    zeroed: bool,
}

impl<SPI, D, E> Encoder<SPI, D>
where
    SPI: SpiDevice<u8, Error = E>,
    D: DelayNs,
{
    /// Create a new encoder driver instance
    ///
    /// `config` must satisfy [`Config::is_valid`].
    pub fn new(spi: SPI, delay: D, config: Config) -> Self {
        debug_assert!(config.is_valid(), "invalid encoder configuration");
        Self {
            interface: RegisterInterface::new(spi, delay, config),
            tracker: UnwrapTracker::new(config.resolution),
            converter: AngleConverter::new(config.resolution, config.pole_pairs),
            zeroed: false,
        }
    }

    /// Release the SPI device and delay provider, consuming the driver
    pub fn release(self) -> (SPI, D) {
        self.interface.release()
    }

    /// Settings the encoder was created with
    #[must_use]
    pub fn config(&self) -> &Config {
        self.interface.config()
    }

    /// Run the device bring-up sequence
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportFault`] if a register write fails
    pub fn configure(&mut self) -> Result<(), Error<E>> {
        self.interface.configure()
    }

    /// Whether the bring-up sequence has completed
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.interface.is_configured()
    }

    /// Whether a zero offset has been established since power-up
    #[must_use]
    pub fn is_zeroed(&self) -> bool {
        self.zeroed
    }

    /// Read the encoder and advance the unwrap state
    ///
    /// Returns the offset-corrected position in `[0, resolution)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationIncomplete`] before [`Self::configure`],
    /// or [`Error::TransportFault`] if the exchange fails
    pub fn sample(&mut self) -> Result<u16, Error<E>> {
        let raw = self.interface.read_raw_angle()?;
        Ok(self.tracker.update(raw))
    }

    /// Alias of [`Self::sample`] under the name the control loop uses
    ///
    /// # Errors
    ///
    /// See [`Self::sample`]
    pub fn read_mechanical_angle(&mut self) -> Result<u16, Error<E>> {
        self.sample()
    }

    /// Sample and return the mechanical angle in `[0, 2π)`
    ///
    /// # Errors
    ///
    /// See [`Self::sample`]
    pub fn mechanical_angle_radians(&mut self) -> Result<f32, Error<E>> {
        let sample = self.sample()?;
        Ok(self.converter.mechanical_radians(sample))
    }

    /// Sample and return the electrical angle in `[0, 2π)`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotZeroed`] until a zero calibration has completed,
    /// so the current loop never commutes against an unaligned frame
    pub fn read_electrical_angle_radians(&mut self) -> Result<f32, Error<E>> {
        if !self.zeroed {
            return Err(Error::NotZeroed);
        }
        self.electrical_angle_radians_unchecked()
    }

    /// Electrical angle without the zeroed check, for open-loop use
    ///
    /// # Errors
    ///
    /// See [`Self::sample`]
    pub fn electrical_angle_radians_unchecked(&mut self) -> Result<f32, Error<E>> {
        let sample = self.sample()?;
        Ok(self.converter.electrical_radians(sample))
    }

    /// Align the encoder frame with the motor's electrical frame, blocking
    /// for the settle time
    ///
    /// Returns the new zero offset. Success is not verified: if the rotor
    /// could not move under the applied field the offset is silently wrong.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::PowerStage`] if the PWM update fails or
    /// [`CalibrationError::Encoder`] if sampling fails. The field is released
    /// before a sampling error is returned; if that release fails too the
    /// error is [`CalibrationError::Unreleased`] and the motor is still
    /// energised.
    pub fn run_zero_calibration<P: PowerStage>(
        &mut self,
        power: &mut P,
    ) -> Result<u16, CalibrationError<E, P::Error>> {
        ZeroCalibration::new(self.config().calibration).run(self, power)
    }

    /// Same as [`Self::run_zero_calibration`], awaiting the settle time
    /// instead of blocking
    ///
    /// # Errors
    ///
    /// See [`Self::run_zero_calibration`]
    pub async fn run_zero_calibration_async<P, A>(
        &mut self,
        power: &mut P,
        delay: &mut A,
    ) -> Result<u16, CalibrationError<E, P::Error>>
    where
        P: PowerStage,
        A: embedded_hal_async::delay::DelayNs,
    {
        ZeroCalibration::new(self.config().calibration)
            .run_async(self, power, delay)
            .await
    }

    /// Raw position taken as zero
    #[must_use]
    pub fn zero_offset(&self) -> u16 {
        self.tracker.zero_offset()
    }

    /// Restore a previously measured zero offset and mark the encoder zeroed
    pub fn set_zero_offset(&mut self, offset: u16) {
        self.tracker.set_zero_offset(offset);
        self.zeroed = true;
    }

    /// Signed travel in raw counts since power-up or the last calibration
    #[must_use]
    pub fn accumulated_angle(&self) -> i64 {
        self.tracker.accumulated()
    }

    /// Signed full revolutions since power-up or the last calibration
    #[must_use]
    pub fn turns(&self) -> i64 {
        self.tracker.turns()
    }

    /// Scaling used for the radian readings
    #[must_use]
    pub fn converter(&self) -> &AngleConverter {
        &self.converter
    }

    /// Drop the offset and unwrap history ahead of a fresh absolute sample
    pub(crate) fn clear_zero(&mut self) {
        self.tracker.reset();
        self.zeroed = false;
    }

    pub(crate) fn delay_ms(&mut self, ms: u32) {
        self.interface.delay_ms(ms);
    }
}
