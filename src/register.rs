//! Register addresses and command word layout of the magnetic encoder.

/// Configuration registers written during bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
#[repr(u8)]
pub enum Register {
    /// Zero position angle, high bits
    ZeroHigh = 0x04,
    /// Rotation polarity and zero position angle, low bits
    ZeroLowPolarity = 0x05,
    /// Output driver current, ABZ refresh rate and pin mode
    OutputConfig = 0x07,
    /// Zero (index) pulse width
    ZeroPulse = 0x08,
}

impl From<Register> for u8 {
    fn from(reg: Register) -> u8 {
        reg as u8
    }
}

/// Command opcodes carried in the top three bits of a command word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// No operation; the device answers with the current angle
    Nop = 0b000,
    /// Write the payload byte into the addressed register
    Write = 0b010,
}

bitfield::bitfield! {
    /// Command word shifted out to the device
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct CommandWord(u16);
    impl Debug;
    u8;
    /// Command opcode
    pub opcode, set_opcode: 15, 13;
    /// Register address
    pub address, set_address: 12, 8;
    /// Register payload
    pub payload, set_payload: 7, 0;
}

impl CommandWord {
    /// Angle read; the device ignores the command and returns the position
    pub const READ_ANGLE: Self = Self(0x0000);

    /// Build a register write command
    #[must_use]
    pub fn write(register: Register, payload: u8) -> Self {
        let mut word = Self(0);
        word.set_opcode(Opcode::Write as u8);
        word.set_address(register.into());
        word.set_payload(payload);
        word
    }

    /// Raw 16-bit value as sent on the wire
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl From<CommandWord> for u16 {
    fn from(word: CommandWord) -> u16 {
        word.0
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CommandWord {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CommandWord(0x{:04X})", self.0);
    }
}

/// Bring-up writes, applied in order. The device applies them incrementally,
/// so the order must be kept.
pub const BRINGUP_SEQUENCE: [(Register, u8); 4] = [
    // 60 mA drive, 10 kHz refresh, AB phase stay, push-pull outputs
    (Register::OutputConfig, 0xCE),
    // polarity 1, zero position low bits
    (Register::ZeroLowPolarity, 0x2F),
    (Register::ZeroHigh, 0xFF),
    // one LSB wide zero pulse
    (Register::ZeroPulse, 0x40),
];
