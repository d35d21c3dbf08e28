pub mod clock_sync;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod frame;
pub mod registers;
pub mod result;
pub mod transport;


// Re-export the session type and its collaborators for easy access
pub use clock_sync::ClockSync;
pub use config::{CalibrationMode, CommandSet, DefaultConfig, PatchSource, RangingMode, SensorModel, SensorVariant};
pub use device::{Application, BringupState, MeasureState, Pin, PinControl, SoftwareVersion, Tmf8x01};
pub use error::{TofError, TransportError, WaitTarget};
pub use frame::{BootloaderOpcode, PatchFrame, checksum};
pub use registers::Register;
pub use result::ResultRecord;
pub use transport::{NoEnableLine, RegisterBus, StdTimeBase, TimeBase};

#[cfg(feature = "linux")]
pub use transport::linux::LinuxI2cBus;
#[cfg(feature = "linux")]
pub use linux_embedded_hal::{CdevPin, Delay};
