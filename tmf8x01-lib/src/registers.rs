use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Register map of the TMF8x01.
///
/// One variant per address. Addresses that serve a second purpose in another
/// operating mode are exposed as associated constants instead of duplicate
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    /// Currently running application (0x80 bootloader, 0xC0 app0)
    AppId = 0x00,
    VersionMajor = 0x01,
    /// Application switch request
    AppRequestId = 0x02,
    CmdData9 = 0x06,
    CmdData8 = 0x07,
    /// First byte of the measurement command set. In bootloader mode this
    /// is the frame command register and the 3-byte acknowledge window.
    CmdData7 = 0x08,
    CmdData6 = 0x09,
    CmdData5 = 0x0A,
    CmdData4 = 0x0B,
    CmdData3 = 0x0C,
    CmdData2 = 0x0D,
    CmdData1 = 0x0E,
    CmdData0 = 0x0F,
    /// Command register, last byte of the measurement command set
    Command = 0x10,
    VersionMinor = 0x12,
    VersionPatch = 0x13,
    /// Start of the 11-byte result block
    Status = 0x1D,
    /// Content code of the RAM window starting at 0x20
    Contents = 0x1E,
    /// Result number; also the calibration data window when writing or
    /// reading factory calibration
    ResultNumber = 0x20,
    SerialNumber = 0x28,
    /// Algorithm state write window
    StateData = 0x2E,
    /// Junction temperature in °C (signed)
    JunctionTemperature = 0x32,
    /// PON / CPU ready / CPU reset
    Enable = 0xE0,
    InterruptStatus = 0xE1,
    InterruptEnable = 0xE2,
    ChipRevision = 0xE4,
}

impl Register {
    /// Bootloader frame command register
    pub const BOOTLOADER_COMMAND: Register = Register::CmdData7;
    /// Factory calibration window
    pub const FACTORY_CALIBRATION: Register = Register::ResultNumber;
    /// GPIO configuration parameter
    pub const GPIO_CONFIG: Register = Register::CmdData0;

    pub fn addr(self) -> u8 {
        self.into()
    }
}

/// Command codes written to [`Register::Command`] in app0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandCode {
    StartMeasurement = 0x02,
    ReadCalibration = 0x0A,
    LoadCalibration = 0x0B,
    GpioControl = 0x0F,
    ReadSerialNumber = 0x47,
    /// Stops a measurement and acknowledges a pending read-out
    Stop = 0xFF,
}

/// The ENABLE register (0xE0).
///
/// ```text
/// | b7        | b6        | b5..b1   | b0  |
/// | cpu_reset | cpu_ready | reserved | pon |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnableRegister(u8);

impl EnableRegister {
    pub const PON: u8 = 0x01;
    pub const CPU_READY: u8 = 0x40;
    pub const CPU_RESET: u8 = 0x80;

    pub fn from_bits(value: u8) -> Self {
        Self(value)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// The value written to power the oscillator on
    pub fn power_on() -> Self {
        Self(Self::PON)
    }

    pub fn pon(self) -> bool {
        self.0 & Self::PON != 0
    }

    pub fn cpu_ready(self) -> bool {
        self.0 & Self::CPU_READY != 0
    }

    pub fn cpu_reset(self) -> bool {
        self.0 & Self::CPU_RESET != 0
    }

    pub fn with_cpu_reset(self, reset: bool) -> Self {
        if reset {
            Self(self.0 | Self::CPU_RESET)
        } else {
            Self(self.0 & !Self::CPU_RESET)
        }
    }
}

/// Pending-interrupt bit in [`Register::InterruptStatus`]
pub const INT_STATUS_RESULT: u8 = 0x01;

/// Value written to [`Register::InterruptEnable`] to route results to INT
pub const INT_ENABLE_RESULT: u8 = 0x01;
