use crate::frame::BootloaderOpcode;
use std::fmt;
use std::io;
use thiserror::Error;

/// Failure of the register bus itself. Never retried by the driver.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No acknowledge from device at address {address:#04x}")]
    Nack { address: u8 },

    #[error("Short read from register {register:#04x}: expected {expected} bytes, got {actual}")]
    ShortRead { register: u8, expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Enable line error: {0:?}")]
    EnableLine(embedded_hal::digital::ErrorKind),

    #[cfg(feature = "linux")]
    #[error("I2C error: {0}")]
    I2c(#[from] i2cdev::linux::LinuxI2CError),

    #[cfg(feature = "linux")]
    #[error("GPIO error: {0}")]
    Gpio(#[from] linux_embedded_hal::gpio_cdev::errors::Error),
}

/// The condition a bounded poll loop was waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    CpuReady,
    Application,
    Bootloader,
    StatusContents(u8),
    Priming,
}

impl fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTarget::CpuReady => write!(f, "CPU ready"),
            WaitTarget::Application => write!(f, "application (app0) ready"),
            WaitTarget::Bootloader => write!(f, "bootloader ready"),
            WaitTarget::StatusContents(code) => write!(f, "status contents {code:#04x}"),
            WaitTarget::Priming => write!(f, "clock-sync priming results"),
        }
    }
}

/// The primary error type for the `tmf8x01-lib` library.
#[derive(Error, Debug)]
pub enum TofError {
    #[error("No device acknowledged at I2C address {address:#04x}. Is the TMF8x01 connected?")]
    DeviceNotFound { address: u8 },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Timed out waiting for {target} after {budget_ms} ms")]
    Timeout { target: WaitTarget, budget_ms: u32 },

    #[error("Bootloader did not acknowledge {opcode:?} frame (status {})", hex::encode(.status))]
    ChecksumAckFailure { opcode: BootloaderOpcode, status: [u8; 3] },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid {what} length: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Bring-up failed: {0}")]
    BringupFailed(String),
}
