/// Error type for encoder operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A register exchange failed on every attempt; carries the last bus error
    TransportFault(E),
    /// An angle was read before the bring-up sequence completed
    ConfigurationIncomplete,
    /// The electrical angle was requested before zero calibration
    NotZeroed,
}

/// Error type for the zero calibration routine
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError<E, P> {
    /// Reading the encoder failed
    Encoder(Error<E>),
    /// Driving the power stage failed
    PowerStage(P),
    /// Sampling failed and the alignment field could not be released either;
    /// the motor is still energised
    Unreleased { encoder: Error<E>, power_stage: P },
}
