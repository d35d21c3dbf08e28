use crate::constants::{BOOTLOADER_ACK, BOOTLOADER_INIT_PARAM, MAX_FRAME_PAYLOAD};
use crate::error::TofError;
use bytes::{BufMut, Bytes, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// One's-complement of the additive sum of `bytes`.
///
/// `checksum(&[]) == 0xFF`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b)) ^ 0xFF
}

/// Appends a checksum slot covering every byte of `table`.
pub fn append_checksum(table: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(table.len() + 1);
    buf.extend_from_slice(table);
    buf.put_u8(checksum(table));
    buf.freeze()
}

/// Commands understood by the TMF8x01 bootloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BootloaderOpcode {
    /// Resets the RAM write pointer to the patch base address
    Erase = 0x43,
    /// Writes a chunk of patch data at the RAM write pointer
    Write = 0x41,
    /// Leaves the bootloader and starts the downloaded patch
    Reset = 0x11,
    /// Enters download mode
    Init = 0x14,
}

/// A checksummed bootloader frame: `opcode, len, payload…, checksum`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFrame {
    opcode: BootloaderOpcode,
    payload: Bytes,
}

impl PatchFrame {
    pub fn new(opcode: BootloaderOpcode, payload: impl Into<Bytes>) -> Result<Self, TofError> {
        let payload = payload.into();
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(TofError::InvalidArgument(format!(
                "frame payload of {} bytes exceeds {} bytes",
                payload.len(),
                MAX_FRAME_PAYLOAD
            )));
        }
        Ok(Self { opcode, payload })
    }

    pub fn init() -> Self {
        Self {
            opcode: BootloaderOpcode::Init,
            payload: Bytes::from_static(&[BOOTLOADER_INIT_PARAM]),
        }
    }

    pub fn erase() -> Self {
        Self {
            opcode: BootloaderOpcode::Erase,
            payload: Bytes::from_static(&[0x00, 0x00]),
        }
    }

    pub fn write(chunk: Bytes) -> Result<Self, TofError> {
        Self::new(BootloaderOpcode::Write, chunk)
    }

    pub fn reset() -> Self {
        Self {
            opcode: BootloaderOpcode::Reset,
            payload: Bytes::new(),
        }
    }

    pub fn opcode(&self) -> BootloaderOpcode {
        self.opcode
    }

    /// Checksum over opcode, length and payload
    pub fn checksum(&self) -> u8 {
        let sum = self
            .payload
            .iter()
            .fold(u8::from(self.opcode).wrapping_add(self.payload.len() as u8), |sum, b| {
                sum.wrapping_add(*b)
            });
        sum ^ 0xFF
    }

    /// Serialize to the bytes written at the bootloader command register
    pub fn encode(&self) -> Bytes {
        let mut table = BytesMut::with_capacity(self.payload.len() + 2);
        table.put_u8(self.opcode.into());
        table.put_u8(self.payload.len() as u8);
        table.extend_from_slice(&self.payload);
        append_checksum(&table)
    }
}

/// Whether a 3-byte read of the bootloader status window is an acknowledge
pub fn is_ack(status: &[u8]) -> bool {
    status == BOOTLOADER_ACK
}
