use crate::constants::{ALGO_STATE_SIZE, CALIBRATION_SIZE, COMMAND_SET_SIZE, MAX_FRAME_PAYLOAD, MODEL_TMF8701, MODEL_TMF8801};
use crate::error::TofError;
use bytes::Bytes;
use num_enum::IntoPrimitive;
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Calibration data applied when measurement is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum CalibrationMode {
    #[strum(to_string = "no calibration")]
    NoCalib = 0,
    #[default]
    #[strum(to_string = "calibration")]
    Calib = 1,
    #[strum(to_string = "calibration + algorithm state")]
    CalibAndAlgoState = 3,
}

/// Ranging range selection. Only the TMF8701 distinguishes these; the TMF8801
/// always runs the combined mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RangingMode {
    /// 0 to 10 cm
    #[strum(to_string = "proximity")]
    Proximity,
    /// 10 to 60 cm
    #[strum(to_string = "distance")]
    Distance,
    /// 0 to 60 cm
    #[default]
    #[strum(to_string = "combined")]
    Combine,
}

/// The 9-byte measurement command set (cmd_data7 .. command).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CommandSet([u8; COMMAND_SET_SIZE]);

impl CommandSet {
    pub const INDEX_CMD7: usize = 0;
    pub const BIT_CALIB: u8 = 0;
    pub const BIT_ALGO: u8 = 1;

    pub const INDEX_CMD6: usize = 1;
    pub const BIT_PROXIMITY: u8 = 0;
    pub const BIT_DISTANCE: u8 = 1;
    pub const BIT_INT: u8 = 4;
    pub const BIT_COMBINE: u8 = 5;

    pub fn new(bytes: [u8; COMMAND_SET_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TofError> {
        let bytes: [u8; COMMAND_SET_SIZE] = bytes.try_into().map_err(|_| TofError::LengthMismatch {
            what: "command set",
            expected: COMMAND_SET_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; COMMAND_SET_SIZE] {
        &self.0
    }

    /// Read-modify-write of a single bit; out-of-range positions are ignored.
    pub fn set_bit(&mut self, index: usize, bit: u8, value: bool) {
        if index >= COMMAND_SET_SIZE || bit > 7 {
            return;
        }
        if value {
            self.0[index] |= 1 << bit;
        } else {
            self.0[index] &= !(1 << bit);
        }
    }

    pub fn bit(&self, index: usize, bit: u8) -> bool {
        index < COMMAND_SET_SIZE && bit <= 7 && self.0[index] & (1 << bit) != 0
    }

    pub fn apply_calibration_mode(&mut self, mode: CalibrationMode) {
        let (calib, algo) = match mode {
            CalibrationMode::NoCalib => (false, false),
            CalibrationMode::Calib => (true, false),
            CalibrationMode::CalibAndAlgoState => (true, true),
        };
        self.set_bit(Self::INDEX_CMD7, Self::BIT_CALIB, calib);
        self.set_bit(Self::INDEX_CMD7, Self::BIT_ALGO, algo);
    }

    pub fn calibration_mode(&self) -> CalibrationMode {
        match (self.calibration_enabled(), self.algo_state_enabled()) {
            (true, true) => CalibrationMode::CalibAndAlgoState,
            (true, false) => CalibrationMode::Calib,
            // Algorithm state without calibration is never loaded
            (false, _) => CalibrationMode::NoCalib,
        }
    }

    pub fn apply_ranging_mode(&mut self, mode: RangingMode) {
        let (proximity, distance, combine) = match mode {
            RangingMode::Proximity => (true, false, false),
            RangingMode::Distance => (false, true, false),
            RangingMode::Combine => (true, true, true),
        };
        self.set_bit(Self::INDEX_CMD6, Self::BIT_PROXIMITY, proximity);
        self.set_bit(Self::INDEX_CMD6, Self::BIT_DISTANCE, distance);
        self.set_bit(Self::INDEX_CMD6, Self::BIT_COMBINE, combine);
    }

    pub fn calibration_enabled(&self) -> bool {
        self.bit(Self::INDEX_CMD7, Self::BIT_CALIB)
    }

    pub fn algo_state_enabled(&self) -> bool {
        self.bit(Self::INDEX_CMD7, Self::BIT_ALGO)
    }

    pub fn proximity_enabled(&self) -> bool {
        self.bit(Self::INDEX_CMD6, Self::BIT_PROXIMITY)
    }

    pub fn distance_enabled(&self) -> bool {
        self.bit(Self::INDEX_CMD6, Self::BIT_DISTANCE)
    }

    pub fn combine_enabled(&self) -> bool {
        self.bit(Self::INDEX_CMD6, Self::BIT_COMBINE)
    }

    pub fn interrupt_enabled(&self) -> bool {
        self.bit(Self::INDEX_CMD6, Self::BIT_INT)
    }

    pub fn set_interrupt(&mut self, enabled: bool) {
        self.set_bit(Self::INDEX_CMD6, Self::BIT_INT, enabled);
    }
}

/// Supported sensor variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorVariant {
    #[strum(to_string = "TMF8801")]
    Tmf8801,
    #[strum(to_string = "TMF8701")]
    Tmf8701,
}

/// Model reported by the device's unique id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorModel {
    Known(SensorVariant),
    Unknown(u16),
}

impl SensorModel {
    pub fn from_model_id(id: u16) -> Self {
        match id {
            MODEL_TMF8801 => SensorModel::Known(SensorVariant::Tmf8801),
            MODEL_TMF8701 => SensorModel::Known(SensorVariant::Tmf8701),
            other => SensorModel::Unknown(other),
        }
    }
}

impl std::fmt::Display for SensorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorModel::Known(variant) => write!(f, "{variant}"),
            SensorModel::Unknown(id) => write!(f, "unknown ({id:#06x})"),
        }
    }
}

/// Per-variant defaults loaded into a session at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DefaultConfig {
    pub command_set: CommandSet,
    pub calibration: [u8; CALIBRATION_SIZE],
    pub algo_state: [u8; ALGO_STATE_SIZE],
}

const DEFAULT_CALIBRATION: [u8; CALIBRATION_SIZE] = [
    0x41, 0x57, 0x01, 0xFD, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04,
];

const DEFAULT_ALGO_STATE: [u8; ALGO_STATE_SIZE] = [0xB1, 0xA9, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

impl DefaultConfig {
    pub fn for_variant(variant: SensorVariant) -> Self {
        match variant {
            SensorVariant::Tmf8801 => Self::tmf8801(),
            SensorVariant::Tmf8701 => Self::tmf8701(),
        }
    }

    pub fn tmf8801() -> Self {
        Self {
            command_set: CommandSet::new([0x01, 0xA3, 0x00, 0x00, 0x00, 0x64, 0x03, 0x84, 0x02]),
            calibration: DEFAULT_CALIBRATION,
            algo_state: DEFAULT_ALGO_STATE,
        }
    }

    pub fn tmf8701() -> Self {
        Self {
            command_set: CommandSet::new([0x03, 0x23, 0x00, 0x00, 0x00, 0x64, 0xFF, 0xFF, 0x02]),
            calibration: DEFAULT_CALIBRATION,
            algo_state: DEFAULT_ALGO_STATE,
        }
    }

    pub fn from_slices(command_set: &[u8], calibration: &[u8], algo_state: &[u8]) -> Result<Self, TofError> {
        Ok(Self {
            command_set: CommandSet::from_slice(command_set)?,
            calibration: calibration.try_into().map_err(|_| TofError::LengthMismatch {
                what: "calibration data",
                expected: CALIBRATION_SIZE,
                actual: calibration.len(),
            })?,
            algo_state: algo_state.try_into().map_err(|_| TofError::LengthMismatch {
                what: "algorithm state",
                expected: ALGO_STATE_SIZE,
                actual: algo_state.len(),
            })?,
        })
    }
}

/// Firmware patch as an ordered list of chunks, each 1..=255 bytes.
///
/// The content is opaque; only the chunking matters to the download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSource {
    chunks: Vec<Bytes>,
}

impl PatchSource {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_chunks<I, C>(chunks: I) -> Result<Self, TofError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        let chunks = chunks.into_iter().map(Into::into).collect::<Vec<Bytes>>();
        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.is_empty() || chunk.len() > MAX_FRAME_PAYLOAD {
                return Err(TofError::InvalidArgument(format!(
                    "patch chunk {} has {} bytes, expected 1..={}",
                    index,
                    chunk.len(),
                    MAX_FRAME_PAYLOAD
                )));
            }
        }
        Ok(Self { chunks })
    }

    /// Parse the vendor layout: `len, data[len]` repeated, ending at a zero
    /// length byte or at the end of input.
    pub fn from_length_prefixed(blob: &[u8]) -> Result<Self, TofError> {
        let mut chunks = Vec::new();
        let mut offset = 0;
        while let Some(&len) = blob.get(offset) {
            if len == 0 {
                break;
            }
            let start = offset + 1;
            let end = start + len as usize;
            let data = blob.get(start..end).ok_or_else(|| {
                TofError::InvalidArgument(format!(
                    "patch blob truncated at offset {}: chunk declares {} bytes, {} available",
                    offset,
                    len,
                    blob.len() - start
                ))
            })?;
            chunks.push(Bytes::copy_from_slice(data));
            offset = end;
        }
        Ok(Self { chunks })
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total number of patch bytes
    pub fn size(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }
}
