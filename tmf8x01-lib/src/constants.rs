// Protocol constants for TMF8x01

/// Default 7-bit I2C address of the TMF8801/TMF8701
pub const DEFAULT_ADDRESS: u8 = 0x41;

/// Application id reported while the bootloader is running
pub const APP_ID_BOOTLOADER: u8 = 0x80;

/// Application id reported while the measurement application (app0) is running
pub const APP_ID_APP0: u8 = 0xC0;

/// Content code: measurement results are present in the register map
pub const CONTENTS_RESULT: u8 = 0x55;

/// Content code: factory calibration data is present at 0x20
pub const CONTENTS_CALIBRATION: u8 = 0x0A;

/// Content code: serial number is present at 0x28
pub const CONTENTS_SERIAL_NUMBER: u8 = 0x47;

/// Size of the measurement command set (cmd_data7..cmd_data0 + command)
pub const COMMAND_SET_SIZE: usize = 9;

/// Size of the factory calibration blob
pub const CALIBRATION_SIZE: usize = 14;

/// Size of the algorithm state blob
pub const ALGO_STATE_SIZE: usize = 11;

/// Size of the result block read from the status register
pub const RESULT_SIZE: usize = 11;

/// Largest payload a single bootloader frame can carry
pub const MAX_FRAME_PAYLOAD: usize = 255;

/// Bootloader acknowledge: cmd_stat ready, size 0, checksum 0xFF
pub const BOOTLOADER_ACK: [u8; 3] = [0x00, 0x00, 0xFF];

/// Parameter of the bootloader init command
pub const BOOTLOADER_INIT_PARAM: u8 = 0x29;

/// Number of clock-sync samples collected before the window is evaluated
pub const CLOCK_SYNC_WINDOW: usize = 5;

/// Results consumed after configuration before measurement counts as armed
pub const PRIMING_SAMPLES: usize = CLOCK_SYNC_WINDOW - 1;

/// Accepted bounds of the host/device clock ratio
pub const SCALE_FACTOR_MIN: f64 = 0.7;
pub const SCALE_FACTOR_MAX: f64 = 1.3;

/// Device clock tick in milliseconds (0.2 µs)
pub const DEVICE_TICK_MS: f64 = 0.0002;

/// Model identifiers found in the upper half of the unique id
pub const MODEL_TMF8801: u16 = 0x4120;
pub const MODEL_TMF8701: u16 = 0x5E10;

// Poll budgets and fixed settle delays, all in milliseconds

pub const POLL_INTERVAL_MS: u32 = 5;
pub const CPU_READY_TIMEOUT_MS: u32 = 100;
pub const APP_SWITCH_TIMEOUT_MS: u32 = 100;
pub const STATUS_TIMEOUT_MS: u32 = 1000;
pub const SERIAL_NUMBER_TIMEOUT_MS: u32 = 100;
pub const CONFIGURE_SETTLE_MS: u32 = 600;
pub const PRIMING_POLL_MS: u32 = 2;
pub const PRIMING_TIMEOUT_MS: u32 = 2000;
pub const COMMAND_SETTLE_MS: u32 = 50;
pub const ENABLE_LINE_SETTLE_MS: u32 = 1000;
