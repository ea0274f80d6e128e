//! Zero-offset calibration against the motor's electrical frame
//!
//! A fixed field vector pulls the rotor onto a known electrical angle. Once
//! the rotor has settled the encoder position is taken as the new zero and
//! the field is released. Nothing checks that the rotor actually moved; a
//! stalled or disconnected motor yields a wrong offset without an error.

use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use crate::{
    config::CalibrationConfig,
    encoder::Encoder,
    error::CalibrationError,
    power_stage::PowerStage,
};

/// Calibration progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationState {
    /// Drive the alignment field
    ApplyField,
    /// Wait for the rotor to come to rest
    Settle { remaining_ms: u32 },
    /// Clear the unwrap history and sample the new zero
    ResetAndSample,
    /// Remove the field
    Release { offset: u16 },
    /// Finished with the given zero offset
    Done { offset: u16 },
    /// Sampling failed while the field was applied; remove the field before
    /// starting over
    Abort,
}

/// Sequential calibration state machine
///
/// [`Self::step`] executes one state. The settle state never blocks inside
/// `step`; the caller counts it down with [`Self::settle`], either from a
/// timer or by delaying as [`Self::run`] and [`Self::run_async`] do.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZeroCalibration {
    config: CalibrationConfig,
    state: CalibrationState,
}

impl ZeroCalibration {
    #[must_use]
    pub const fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            state: CalibrationState::ApplyField,
        }
    }

    #[must_use]
    pub const fn state(&self) -> CalibrationState {
        self.state
    }

    /// Zero offset once calibration has finished
    #[must_use]
    pub const fn offset(&self) -> Option<u16> {
        match self.state {
            CalibrationState::Done { offset } => Some(offset),
            _ => None,
        }
    }

    /// Count down the settle state by `elapsed_ms`
    pub fn settle(&mut self, elapsed_ms: u32) {
        if let CalibrationState::Settle { remaining_ms } = &mut self.state {
            *remaining_ms = remaining_ms.saturating_sub(elapsed_ms);
        }
    }

    /// Execute the current state and advance
    ///
    /// A settle state with time remaining is left unchanged. If sampling
    /// fails the field is released and the machine restarts from
    /// [`CalibrationState::ApplyField`]. If that release fails as well the
    /// machine stays in [`CalibrationState::Abort`] and the next step retries
    /// the release.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::PowerStage`] if the PWM update fails,
    /// [`CalibrationError::Encoder`] if sampling fails, or
    /// [`CalibrationError::Unreleased`] if sampling fails and the field stays
    /// applied
    pub fn step<SPI, D, E, P>(
        &mut self,
        encoder: &mut Encoder<SPI, D>,
        power: &mut P,
    ) -> Result<CalibrationState, CalibrationError<E, P::Error>>
    where
        SPI: SpiDevice<u8, Error = E>,
        D: DelayNs,
        P: PowerStage,
    {
        let next = match self.state {
            CalibrationState::ApplyField => {
                drive(power, self.config.d_axis, self.config.q_axis, self.config.theta)
                    .map_err(CalibrationError::PowerStage)?;
                CalibrationState::Settle {
                    remaining_ms: self.config.settle_ms,
                }
            }
            CalibrationState::Settle { remaining_ms: 0 } => CalibrationState::ResetAndSample,
            settling @ CalibrationState::Settle { .. } => settling,
            CalibrationState::ResetAndSample => {
                encoder.clear_zero();
                match encoder.sample() {
                    Ok(offset) => {
                        encoder.set_zero_offset(offset);
                        CalibrationState::Release { offset }
                    }
                    Err(err) => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("Calibration sample failed, releasing field");
                        return Err(match drive(power, 0.0, 0.0, 0.0) {
                            Ok(()) => {
                                self.state = CalibrationState::ApplyField;
                                CalibrationError::Encoder(err)
                            }
                            Err(power_stage) => {
                                #[cfg(feature = "defmt")]
                                defmt::warn!("Field release failed, motor still energised");
                                self.state = CalibrationState::Abort;
                                CalibrationError::Unreleased {
                                    encoder: err,
                                    power_stage,
                                }
                            }
                        });
                    }
                }
            }
            CalibrationState::Release { offset } => {
                drive(power, 0.0, 0.0, 0.0).map_err(CalibrationError::PowerStage)?;
                #[cfg(feature = "defmt")]
                defmt::info!("Zero offset calibrated to {}", offset);
                CalibrationState::Done { offset }
            }
            done @ CalibrationState::Done { .. } => done,
            CalibrationState::Abort => {
                drive(power, 0.0, 0.0, 0.0).map_err(CalibrationError::PowerStage)?;
                CalibrationState::ApplyField
            }
        };

        #[cfg(feature = "defmt")]
        log_transition(self.state, next);

        self.state = next;
        Ok(next)
    }

    /// Run to completion, blocking on the encoder's delay provider while
    /// settling
    ///
    /// # Errors
    ///
    /// See [`Self::step`]
    pub fn run<SPI, D, E, P>(
        mut self,
        encoder: &mut Encoder<SPI, D>,
        power: &mut P,
    ) -> Result<u16, CalibrationError<E, P::Error>>
    where
        SPI: SpiDevice<u8, Error = E>,
        D: DelayNs,
        P: PowerStage,
    {
        loop {
            match self.state {
                CalibrationState::Done { offset } => return Ok(offset),
                CalibrationState::Settle { remaining_ms } if remaining_ms > 0 => {
                    encoder.delay_ms(remaining_ms);
                    self.settle(remaining_ms);
                }
                _ => {
                    self.step(encoder, power)?;
                }
            }
        }
    }

    /// Run to completion, awaiting `delay` while settling
    ///
    /// # Errors
    ///
    /// See [`Self::step`]
    pub async fn run_async<SPI, D, E, P, A>(
        mut self,
        encoder: &mut Encoder<SPI, D>,
        power: &mut P,
        delay: &mut A,
    ) -> Result<u16, CalibrationError<E, P::Error>>
    where
        SPI: SpiDevice<u8, Error = E>,
        D: DelayNs,
        P: PowerStage,
        A: embedded_hal_async::delay::DelayNs,
    {
        loop {
            match self.state {
                CalibrationState::Done { offset } => return Ok(offset),
                CalibrationState::Settle { remaining_ms } if remaining_ms > 0 => {
                    delay.delay_ms(remaining_ms).await;
                    self.settle(remaining_ms);
                }
                _ => {
                    self.step(encoder, power)?;
                }
            }
        }
    }
}

#[cfg(feature = "defmt")]
fn log_transition(from: CalibrationState, to: CalibrationState) {
    if from != to {
        defmt::debug!("Calibration {} -> {}", from, to);
    }
}

fn drive<P: PowerStage>(
    power: &mut P,
    d_axis: f32,
    q_axis: f32,
    theta: f32,
) -> Result<(), P::Error> {
    let duty = power.compute_duty_cycle(d_axis, q_axis, theta);
    power.apply_duty_cycle(duty)
}
