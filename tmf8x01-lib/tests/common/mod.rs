//! Common test utilities: a simulated TMF8x01 register file and a fake clock.

// Allow unused items since this module is shared across test files and not
// every helper is used by every test binary
#![allow(dead_code)]

#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use tmf8x01_lib::config::{CalibrationMode, CommandSet, DefaultConfig, PatchSource, RangingMode};
#[allow(unused_imports)]
pub use tmf8x01_lib::error::{TofError, TransportError, WaitTarget};
#[allow(unused_imports)]
pub use tmf8x01_lib::{Application, BringupState, MeasureState, NoEnableLine, Tmf8x01, checksum};
#[allow(unused_imports)]
pub use embedded_hal_mock::eh1::delay::NoopDelay;
#[allow(unused_imports)]
pub use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction};

use embedded_hal::delay::DelayNs;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use tmf8x01_lib::transport::{RegisterBus, TimeBase};

pub const ADDRESS: u8 = 0x41;

const NANOS_PER_MS: u64 = 1_000_000;

/// Delay and time base in one: time only advances while the driver waits.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    nanos: Rc<Cell<u64>>,
}

impl FakeClock {
    /// Elapsed milliseconds
    pub fn now(&self) -> u32 {
        (self.nanos.get() / NANOS_PER_MS) as u32
    }

    pub fn advance_ms(&self, ms: u32) {
        self.nanos.set(self.nanos.get() + u64::from(ms) * NANOS_PER_MS);
    }
}

impl DelayNs for FakeClock {
    fn delay_ns(&mut self, ns: u32) {
        self.nanos.set(self.nanos.get() + u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(ms);
    }
}

impl TimeBase for FakeClock {
    fn millis(&self) -> u32 {
        self.now()
    }
}

/// Session over the simulated sensor, optionally with an EN pin.
pub type Session<P = NoEnableLine> = Tmf8x01<SimulatedSensor, FakeClock, FakeClock, P>;

/// Register-level model of the sensor, enough to run the bring-up and
/// measurement protocol against.
#[derive(Debug)]
pub struct SimulatedSensor {
    pub present: bool,
    pub app_id: u8,
    pub enable: u8,
    /// CPU reset drops into the bootloader (RAM patch lost)
    pub reset_enters_bootloader: bool,
    pub cpu_boots: bool,
    pub app_after_patch: u8,
    /// Writes to the application request register take effect
    pub honours_app_request: bool,
    /// Register that answers every access with a NACK
    pub failing_register: Option<u8>,
    /// Frame index (0 = init) at which the bootloader stops acknowledging
    pub nack_from_frame: Option<usize>,
    /// Raw status window returned instead of a real acknowledge
    pub bad_ack_pattern: Option<[u8; 3]>,
    pub measure_ok: bool,
    pub contents: u8,
    pub frames: Vec<Vec<u8>>,
    pub writes: Vec<(u8, Vec<u8>)>,
    pub results: VecDeque<[u8; 11]>,
    pub current_result: [u8; 11],
    pub int_enable: u8,
    pub int_status: u8,
    pub calibration: [u8; 14],
    pub serial: [u8; 4],
    pub version: [u8; 4],
    /// When set, results get a device clock of `now * ticks_per_ms`
    pub device_ticks_per_ms: Option<u32>,
    clock: FakeClock,
    ack_window: [u8; 3],
    regs: [u8; 256],
}

impl SimulatedSensor {
    pub fn writes_to(&self, register: u8) -> Vec<&Vec<u8>> {
        self.writes.iter().filter(|(r, _)| *r == register).map(|(_, b)| b).collect()
    }

    pub fn queue_result(&mut self, frame: [u8; 11]) {
        self.results.push_back(frame);
    }

    pub fn queue_results(&mut self, tids: impl IntoIterator<Item = u8>, distance: u16) {
        for (i, tid) in tids.into_iter().enumerate() {
            self.queue_result(result_frame(tid, distance, 1000 * (i as u32 + 1)));
        }
    }

    fn handle_command(&mut self, command: u8) {
        match command {
            0x02 => self.contents = if self.measure_ok { 0x55 } else { 0x00 },
            0x0A => {
                self.contents = 0x0A;
                self.regs[0x20..0x2E].copy_from_slice(&self.calibration);
            }
            0x0B => self.contents = 0x0B,
            0x47 => {
                self.contents = 0x47;
                self.regs[0x28..0x2C].copy_from_slice(&self.serial);
            }
            0xFF => self.contents = 0x00,
            _ => {}
        }
    }

    fn handle_frame(&mut self, bytes: &[u8]) {
        let index = self.frames.len();
        self.frames.push(bytes.to_vec());

        let (body, sum) = bytes.split_at(bytes.len() - 1);
        let valid = checksum(body) == sum[0] && body.len() >= 2 && body[1] as usize == body.len() - 2;
        let nacked = self.nack_from_frame.is_some_and(|from| index >= from);
        self.ack_window = match (self.bad_ack_pattern, valid && !nacked) {
            (Some(pattern), _) => pattern,
            (None, true) => [0x00, 0x00, 0xFF],
            (None, false) => [0x02, 0x00, 0x00],
        };

        if body[0] == 0x11 {
            self.app_id = self.app_after_patch;
            self.enable = if self.cpu_boots { 0x41 } else { 0x01 };
        }
    }
}

impl RegisterBus for SimulatedSensor {
    fn write(&mut self, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.present || self.failing_register == Some(register) {
            return Err(TransportError::Nack { address: ADDRESS });
        }
        self.writes.push((register, bytes.to_vec()));
        match register {
            0xE0 => {
                let value = bytes[0];
                if value & 0x80 != 0 {
                    if self.reset_enters_bootloader {
                        self.app_id = 0x80;
                    }
                    self.enable = 0x00;
                    self.contents = 0x00;
                } else if value & 0x01 != 0 {
                    self.enable = if self.cpu_boots { 0x41 } else { 0x01 };
                }
            }
            0x02 if self.honours_app_request => self.app_id = bytes[0],
            0x02 => {}
            0x08 if self.app_id == 0x80 => self.handle_frame(bytes),
            0xE1 => {
                if bytes[0] & 0x01 != 0 {
                    self.int_status &= !0x01;
                }
            }
            0xE2 => self.int_enable = bytes[0],
            _ => {
                let start = register as usize;
                self.regs[start..start + bytes.len()].copy_from_slice(bytes);
                let end = start + bytes.len();
                if start <= 0x10 && end > 0x10 {
                    self.handle_command(self.regs[0x10]);
                }
            }
        }
        Ok(())
    }

    fn read(&mut self, register: u8, len: usize) -> Result<Vec<u8>, TransportError> {
        if !self.present || self.failing_register == Some(register) {
            return Err(TransportError::Nack { address: ADDRESS });
        }
        let bytes = match register {
            0x00 => vec![self.app_id],
            0xE0 => vec![self.enable],
            0x08 if self.app_id == 0x80 => self.ack_window[..len].to_vec(),
            0x1E => vec![self.contents],
            0x1D => {
                if let Some(mut next) = self.results.pop_front() {
                    if let Some(ticks) = self.device_ticks_per_ms {
                        next[7..11].copy_from_slice(&(self.clock.now() * ticks).to_le_bytes());
                    }
                    self.current_result = next;
                    if self.int_enable & 0x01 != 0 {
                        self.int_status |= 0x01;
                    }
                }
                self.current_result[..len].to_vec()
            }
            0xE1 => vec![self.int_status],
            0x01 => vec![self.version[0]],
            0x12 => vec![self.version[1]],
            0x13 => vec![self.version[2]],
            0xE4 => vec![self.version[3]],
            _ => {
                let start = register as usize;
                self.regs[start..start + len].to_vec()
            }
        };
        Ok(bytes)
    }

    fn probe(&mut self, address: u8) -> bool {
        self.present && address == ADDRESS
    }
}

/// A result block with content code 0x55.
pub fn result_frame(tid: u8, distance_mm: u16, device_clock: u32) -> [u8; 11] {
    let [hi, lo] = distance_mm.to_be_bytes();
    let clock = device_clock.to_le_bytes();
    [0x00, 0x55, tid, tid, 0x3F, lo, hi, clock[0], clock[1], clock[2], clock[3]]
}

/// Sensor sitting in the bootloader with the given clock attached.
pub fn sensor(clock: &FakeClock) -> SimulatedSensor {
    SimulatedSensor {
        present: true,
        app_id: 0x80,
        enable: 0x00,
        reset_enters_bootloader: true,
        cpu_boots: true,
        app_after_patch: 0xC0,
        honours_app_request: true,
        failing_register: None,
        nack_from_frame: None,
        bad_ack_pattern: None,
        measure_ok: true,
        contents: 0x00,
        frames: Vec::new(),
        writes: Vec::new(),
        results: VecDeque::new(),
        current_result: [0; 11],
        int_enable: 0,
        int_status: 0,
        calibration: [0x41, 0x25, 0x00, 0xF6, 0x04, 0x40, 0x3D, 0xFD, 0x00, 0x00, 0x7A, 0x60, 0x00, 0xFC],
        serial: [0x78, 0x56, 0x20, 0x41],
        version: [0x01, 0x0A, 0x03, 0x02],
        device_ticks_per_ms: None,
        clock: clock.clone(),
        ack_window: [0x00, 0x00, 0x00],
        regs: [0; 256],
    }
}

/// Two chunks of 10 and 5 bytes.
pub fn two_chunk_patch() -> PatchSource {
    PatchSource::from_chunks([vec![0xA5u8; 10], vec![0x5Au8; 5]]).expect("valid chunks")
}

/// Route driver logs to the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn session(sensor: SimulatedSensor, clock: FakeClock) -> Session {
    init_tracing();
    Tmf8x01::new(sensor, clock.clone(), clock, DefaultConfig::tmf8801(), two_chunk_patch())
}

/// Session that has completed bring-up.
pub fn booted() -> Session {
    let clock = FakeClock::default();
    let mut dev = session(sensor(&clock), clock);
    dev.begin().expect("bring-up");
    dev.bus_mut().writes.clear();
    dev
}

/// Session that has completed bring-up and is measuring.
pub fn measuring(mode: CalibrationMode) -> Session {
    let mut dev = booted();
    dev.bus_mut().queue_results(1..=4, 100);
    dev.configure(mode).expect("configure");
    dev
}

/// EN pin expecting exactly `levels`, high for `true`.
pub fn enable_pin(levels: &[bool]) -> PinMock {
    let expectations = levels
        .iter()
        .map(|&high| PinTransaction::set(if high { PinState::High } else { PinState::Low }))
        .collect::<Vec<_>>();
    PinMock::new(&expectations)
}
