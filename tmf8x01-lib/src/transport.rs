//! Collaborators the driver is generic over besides the `embedded-hal`
//! delay and enable pin: the register bus and a millisecond time base.

use crate::error::TransportError;
use embedded_hal::digital::{ErrorType, OutputPin};
use std::convert::Infallible;
use std::time::Instant;

/// Register-addressed access to a single device on a shared bus.
pub trait RegisterBus {
    /// Write `bytes` starting at `register`
    fn write(&mut self, register: u8, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read `len` bytes starting at `register`
    fn read(&mut self, register: u8, len: usize) -> Result<Vec<u8>, TransportError>;

    /// Whether a device acknowledges at `address`
    fn probe(&mut self, address: u8) -> bool;
}

/// Host time stamps for clock-drift estimation.
pub trait TimeBase {
    /// Milliseconds since an arbitrary epoch; wraps like a 32-bit counter
    fn millis(&self) -> u32;
}

/// [`TimeBase`] counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct StdTimeBase {
    epoch: Instant,
}

impl Default for StdTimeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl StdTimeBase {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl TimeBase for StdTimeBase {
    fn millis(&self) -> u32 {
        // Truncation gives the wrapping 32-bit counter callers expect
        self.epoch.elapsed().as_millis() as u32
    }
}

/// Placeholder pin type for sessions without an EN line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnableLine;

impl ErrorType for NoEnableLine {
    type Error = Infallible;
}

impl OutputPin for NoEnableLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

#[cfg(feature = "linux")]
pub mod linux {
    //! `/dev/i2c-N` access through i2cdev and the EN pin through the GPIO
    //! character device.

    use super::RegisterBus;
    use crate::error::TransportError;
    use i2cdev::core::I2CDevice;
    use i2cdev::linux::LinuxI2CDevice;
    use linux_embedded_hal::CdevPin;
    use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
    use std::path::{Path, PathBuf};
    use tracing::{debug, trace};

    pub struct LinuxI2cBus {
        path: PathBuf,
        address: u8,
        device: LinuxI2CDevice,
    }

    impl LinuxI2cBus {
        pub fn open(path: impl AsRef<Path>, address: u8) -> Result<Self, TransportError> {
            let path = path.as_ref().to_path_buf();
            debug!(path = %path.display(), address = format_args!("{address:#04x}"), "Opening I2C bus");
            let device = LinuxI2CDevice::new(&path, u16::from(address))?;
            Ok(Self { path, address, device })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        pub fn address(&self) -> u8 {
            self.address
        }
    }

    impl RegisterBus for LinuxI2cBus {
        fn write(&mut self, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
            let mut message = Vec::with_capacity(bytes.len() + 1);
            message.push(register);
            message.extend_from_slice(bytes);
            trace!(register = format_args!("{register:#04x}"), bytes = hex::encode(bytes), "I2C write");
            self.device.write(&message)?;
            Ok(())
        }

        fn read(&mut self, register: u8, len: usize) -> Result<Vec<u8>, TransportError> {
            self.device.write(&[register])?;
            let mut buf = vec![0u8; len];
            self.device.read(&mut buf)?;
            trace!(register = format_args!("{register:#04x}"), bytes = hex::encode(&buf), "I2C read");
            Ok(buf)
        }

        fn probe(&mut self, address: u8) -> bool {
            let probed = match LinuxI2CDevice::new(&self.path, u16::from(address)) {
                Ok(mut dev) => dev.smbus_read_byte().is_ok(),
                Err(_) => false,
            };
            debug!(address = format_args!("{address:#04x}"), probed, "I2C probe");
            probed
        }
    }

    /// Request `line` of the GPIO chip at `chip` as the EN output, driven
    /// high so the sensor stays powered until the driver cycles it.
    pub fn enable_line(chip: impl AsRef<Path>, line: u32) -> Result<CdevPin, TransportError> {
        let mut chip = Chip::new(chip.as_ref())?;
        let handle = chip.get_line(line)?.request(LineRequestFlags::OUTPUT, 1, "tmf8x01-enable")?;
        debug!(line, "Enable line requested");
        Ok(CdevPin::new(handle)?)
    }
}
