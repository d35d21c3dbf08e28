use crate::constants::{CONTENTS_RESULT, DEVICE_TICK_MS};
use modular_bitfield::prelude::*;
use std::fmt;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The result-info byte: reliability in the low six bits, measurement status
/// in the top two.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultInfo {
    pub reliability: B6,
    pub measurement_status: B2,
}

/// Result block as laid out from the status register (0x1D) onwards.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ResultRecordRaw {
    pub status: u8,
    pub contents: u8,
    pub transaction_id: u8,
    pub result_number: u8,
    pub result_info: u8,
    pub distance_low: u8,
    pub distance_high: u8,
    /// Device time stamp, LSB = 0.2 µs
    pub sys_clock: U32,
}

/// A decoded result block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultRecord {
    pub status: u8,
    /// Content code of the register window; 0x55 when results are present
    pub contents: u8,
    /// Changes with every update of the register map by the device
    pub transaction_id: u8,
    /// Incremented for every unique answer
    pub result_number: u8,
    /// 0..=63, 63 is best
    pub reliability: u8,
    pub measurement_status: u8,
    /// Distance to the peak in millimetres, before drift correction
    pub raw_distance_mm: u16,
    /// Device clock in 0.2 µs ticks
    pub device_clock: u32,
}

impl From<ResultRecordRaw> for ResultRecord {
    fn from(raw: ResultRecordRaw) -> Self {
        let info = ResultInfo::from_bytes([raw.result_info]);
        Self {
            status: raw.status,
            contents: raw.contents,
            transaction_id: raw.transaction_id,
            result_number: raw.result_number,
            reliability: info.reliability(),
            measurement_status: info.measurement_status(),
            raw_distance_mm: u16::from_be_bytes([raw.distance_high, raw.distance_low]),
            device_clock: raw.sys_clock.get(),
        }
    }
}

impl ResultRecord {
    /// Decode the 11-byte block; `None` if `bytes` has the wrong size.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        ResultRecordRaw::ref_from_bytes(bytes).ok().map(|raw| Self::from(*raw))
    }

    /// Whether the register window currently holds measurement results
    pub fn is_present(&self) -> bool {
        self.contents == CONTENTS_RESULT
    }

    /// Device clock converted to milliseconds
    pub fn device_time_ms(&self) -> f64 {
        self.device_clock as f64 * DEVICE_TICK_MS
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tid {:3}, #{:3}, distance {:5} mm, reliability {:2}, status {}, clock {:.3} ms",
            self.transaction_id,
            self.result_number,
            self.raw_distance_mm,
            self.reliability,
            self.measurement_status,
            self.device_time_ms()
        )
    }
}
