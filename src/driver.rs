//! Register interface of the magnetic encoder

use embedded_hal::{
    delay::DelayNs,
    spi::{Operation, SpiDevice},
};

use crate::{
    config::Config,
    error::Error,
    register::{BRINGUP_SEQUENCE, CommandWord},
};

/// Command-word register interface over a 16-bit SPI frame
///
/// Every exchange is a single SPI transaction: CS is asserted, the setup
/// delay elapses, one 16-bit word is clocked in each direction, the hold
/// delay elapses and CS is released. The device answers every command with
/// the current angle frame.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterInterface<SPI, D> {
    spi: SPI,
    delay: D,
    config: Config,
    configured: bool,
}

impl<SPI, D, E> RegisterInterface<SPI, D>
where
    SPI: SpiDevice<u8, Error = E>,
    D: DelayNs,
{
    /// Create a new register interface; the device is not touched until
    /// [`Self::configure`]
    pub fn new(spi: SPI, delay: D, config: Config) -> Self {
        Self {
            spi,
            delay,
            config,
            configured: false,
        }
    }

    /// Release the SPI device and delay provider, consuming the interface
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    /// Settings the interface was created with
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether [`Self::configure`] has completed
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub(crate) fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn exchange(&mut self, command: CommandWord) -> Result<u16, E> {
        let tx = u16::from(command).to_be_bytes();
        let mut rx = [0u8; 2];
        self.spi.transaction(&mut [
            Operation::DelayNs(self.config.cs_setup_ns),
            Operation::Transfer(&mut rx, &tx),
            Operation::DelayNs(self.config.cs_hold_ns),
        ])?;
        Ok(u16::from_be_bytes(rx))
    }

    /// Send one command word and return the word clocked back
    ///
    /// Failed exchanges are retried up to `transport_attempts` times with a
    /// linear backoff.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportFault`] with the last bus error once every
    /// attempt has failed
    pub fn read_register(&mut self, command: CommandWord) -> Result<u16, Error<E>> {
        let attempts = self.config.transport_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.exchange(command) {
                Ok(response) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("{} -> 0x{:04X}", command, response);
                    return Ok(response);
                }
                Err(err) if attempt >= attempts => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("{} failed after {} attempts", command, attempts);
                    return Err(Error::TransportFault(err));
                }
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("{} attempt {} failed, retrying", command, attempt);
                    self.delay
                        .delay_us(self.config.retry_backoff_us.saturating_mul(u32::from(attempt)));
                    attempt += 1;
                }
            }
        }
    }

    /// Bring the device up
    ///
    /// Waits for the power-on settle time, writes the configuration registers
    /// in order with a settle delay between writes, then performs one dummy
    /// angle read to prime the read pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportFault`] if any exchange fails. The interface
    /// stays unconfigured in that case.
    pub fn configure(&mut self) -> Result<(), Error<E>> {
        self.configured = false;
        self.delay.delay_ms(self.config.power_on_settle_ms);

        for (index, &(register, payload)) in BRINGUP_SEQUENCE.iter().enumerate() {
            if index > 0 {
                self.delay.delay_ms(self.config.register_settle_ms);
            }
            #[cfg(feature = "defmt")]
            defmt::debug!("Writing 0x{:02X} to {}", payload, register);
            self.read_register(CommandWord::write(register, payload))?;
        }

        self.read_register(CommandWord::READ_ANGLE)?;
        self.configured = true;

        #[cfg(feature = "defmt")]
        defmt::info!("Encoder configured");

        Ok(())
    }

    /// Read the raw angle, in `[0, resolution)`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationIncomplete`] before [`Self::configure`]
    /// has completed, or [`Error::TransportFault`] if the exchange fails
    pub fn read_raw_angle(&mut self) -> Result<u16, Error<E>> {
        if !self.configured {
            return Err(Error::ConfigurationIncomplete);
        }
        let response = self.read_register(CommandWord::READ_ANGLE)?;
        Ok((response >> self.config.angle_shift) % self.config.resolution)
    }
}
