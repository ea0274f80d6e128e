#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

mod calibration;
mod config;
mod converter;
mod driver;
mod encoder;
mod error;
mod power_stage;
mod register;
mod tracker;
mod utils;
mod velocity;

pub use calibration::{CalibrationState, ZeroCalibration};
pub use config::{CalibrationConfig, Config};
pub use converter::AngleConverter;
pub use driver::RegisterInterface;
pub use encoder::Encoder;
pub use error::{CalibrationError, Error};
pub use power_stage::{PhaseDuty, PowerStage, PwmStage};
pub use register::{BRINGUP_SEQUENCE, CommandWord, Opcode, Register};
pub use tracker::UnwrapTracker;
pub use velocity::VelocityEstimator;
