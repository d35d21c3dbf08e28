use crate::clock_sync::ClockSync;
use crate::config::{CalibrationMode, CommandSet, DefaultConfig, PatchSource, RangingMode, SensorModel};
use crate::constants::*;
use crate::error::{TofError, TransportError, WaitTarget};
use crate::frame::{self, PatchFrame};
use crate::registers::{CommandCode, EnableRegister, INT_ENABLE_RESULT, INT_STATUS_RESULT, Register};
use crate::result::ResultRecord;
use crate::transport::{NoEnableLine, RegisterBus, TimeBase};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use strum_macros::Display;
use tracing::{debug, info, trace, warn};
use uom::si::f64::Length;
use uom::si::length::millimeter;

/// Firmware running on the device, from the application id register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Application {
    Bootloader = 0x80,
    App0 = 0xC0,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Progress of power-up, bootloader detection and patch download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BringupState {
    PowerOff,
    Resetting,
    Bootloader,
    DownloadingPatch,
    App0,
    Failed,
}

/// Measurement controller state. Armed is `Measuring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MeasureState {
    Stopped,
    Configuring,
    Calibrating,
    Measuring,
}

/// The two GPIO pins of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pin {
    Pin0,
    Pin1,
    Both,
}

/// GPIO pin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum PinControl {
    Input = 0,
    /// Input, measurement is held while the pin is low
    InputActiveLow = 1,
    /// Input, measurement is held while the pin is high
    InputActiveHigh = 2,
    /// Output the VCSEL pulse
    OutputVcsel = 3,
    OutputLow = 4,
    OutputHigh = 5,
}

/// Firmware version as reported by the running application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub chip_revision: u8,
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}.{:X}.{:X}.{:X}", self.major, self.minor, self.patch, self.chip_revision)
    }
}

/// A session with one TMF8801/TMF8701.
///
/// The session is variant agnostic: the command-set defaults, calibration
/// blobs and firmware patch are injected at construction. Blocking waits go
/// through `D`, result time stamps come from `T`, and `P` drives the EN pin
/// when one is attached.
pub struct Tmf8x01<B, D, T, P = NoEnableLine> {
    bus: B,
    delay: D,
    time: T,
    enable_line: Option<P>,
    address: u8,
    application: Application,
    bringup: BringupState,
    measure: MeasureState,
    command_set: CommandSet,
    calibration: [u8; CALIBRATION_SIZE],
    algo_state: [u8; ALGO_STATE_SIZE],
    patch: PatchSource,
    pin_config: u8,
    /// Bring-up has succeeded at least once
    booted: bool,
    last_result: Option<ResultRecord>,
    clock_sync: ClockSync,
}

impl<B: RegisterBus, D: DelayNs, T: TimeBase> Tmf8x01<B, D, T> {
    pub fn new(bus: B, delay: D, time: T, defaults: DefaultConfig, patch: PatchSource) -> Self {
        Self {
            bus,
            delay,
            time,
            enable_line: None,
            address: DEFAULT_ADDRESS,
            application: Application::Unknown(0),
            bringup: BringupState::PowerOff,
            measure: MeasureState::Stopped,
            command_set: defaults.command_set,
            calibration: defaults.calibration,
            algo_state: defaults.algo_state,
            patch,
            pin_config: 0,
            booted: false,
            last_result: None,
            clock_sync: ClockSync::new(),
        }
    }
}

impl<B: RegisterBus, D: DelayNs, T: TimeBase, P: OutputPin> Tmf8x01<B, D, T, P> {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Attach the EN pin; power control and the bring-up power cycle use it.
    pub fn with_enable_line<Q: OutputPin>(self, line: Q) -> Tmf8x01<B, D, T, Q> {
        Tmf8x01 {
            bus: self.bus,
            delay: self.delay,
            time: self.time,
            enable_line: Some(line),
            address: self.address,
            application: self.application,
            bringup: self.bringup,
            measure: self.measure,
            command_set: self.command_set,
            calibration: self.calibration,
            algo_state: self.algo_state,
            patch: self.patch,
            pin_config: self.pin_config,
            booted: self.booted,
            last_result: self.last_result,
            clock_sync: self.clock_sync,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn application(&self) -> Application {
        self.application
    }

    pub fn bringup_state(&self) -> BringupState {
        self.bringup
    }

    pub fn measure_state(&self) -> MeasureState {
        self.measure
    }

    pub fn is_armed(&self) -> bool {
        self.measure == MeasureState::Measuring
    }

    pub fn command_set(&self) -> &CommandSet {
        &self.command_set
    }

    pub fn calibration_mode(&self) -> CalibrationMode {
        self.command_set.calibration_mode()
    }

    pub fn last_result(&self) -> Option<&ResultRecord> {
        self.last_result.as_ref()
    }

    pub fn clock_sync(&self) -> &ClockSync {
        &self.clock_sync
    }

    pub fn scale_factor(&self) -> f64 {
        self.clock_sync.scale_factor()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }


    fn write_reg(&mut self, register: Register, bytes: &[u8]) -> Result<(), TofError> {
        debug!(register = ?register, bytes = hex::encode(bytes), "Register write");
        self.bus.write(register.addr(), bytes)?;
        Ok(())
    }

    fn read_reg(&mut self, register: Register, len: usize) -> Result<Vec<u8>, TofError> {
        let bytes = self.bus.read(register.addr(), len)?;
        trace!(register = ?register, bytes = hex::encode(&bytes), "Register read");
        if bytes.len() != len {
            return Err(TransportError::ShortRead {
                register: register.addr(),
                expected: len,
                actual: bytes.len(),
            }
            .into());
        }
        Ok(bytes)
    }

    fn read_byte(&mut self, register: Register) -> Result<u8, TofError> {
        Ok(self.read_reg(register, 1)?[0])
    }

    fn send_command(&mut self, command: CommandCode) -> Result<(), TofError> {
        self.write_reg(Register::Command, &[command.into()])
    }

    fn read_enable(&mut self) -> Result<EnableRegister, TofError> {
        Ok(EnableRegister::from_bits(self.read_byte(Register::Enable)?))
    }

    fn read_application(&mut self) -> Result<Application, TofError> {
        let app = Application::from_primitive(self.read_byte(Register::AppId)?);
        self.application = app;
        Ok(app)
    }

    fn read_contents(&mut self) -> Result<u8, TofError> {
        self.read_byte(Register::Contents)
    }

    /// Poll `ready` every `interval_ms` until it holds or `budget_ms` elapses.
    /// The delay precedes every check.
    fn wait_until<F>(&mut self, target: WaitTarget, budget_ms: u32, interval_ms: u32, mut ready: F) -> Result<(), TofError>
    where
        F: FnMut(&mut Self) -> Result<bool, TofError>,
    {
        let mut elapsed = 0;
        while elapsed < budget_ms {
            self.delay.delay_ms(interval_ms);
            elapsed += interval_ms;
            if ready(self)? {
                trace!(%target, elapsed, "Wait satisfied");
                return Ok(());
            }
        }
        warn!(%target, budget_ms, "Wait budget exhausted");
        Err(TofError::Timeout { target, budget_ms })
    }

    fn wait_for_cpu_ready(&mut self) -> Result<(), TofError> {
        self.wait_until(WaitTarget::CpuReady, CPU_READY_TIMEOUT_MS, POLL_INTERVAL_MS, |dev| {
            Ok(dev.read_enable()?.cpu_ready())
        })
    }

    fn wait_for_application(&mut self, wanted: Application, target: WaitTarget) -> Result<(), TofError> {
        self.wait_until(target, APP_SWITCH_TIMEOUT_MS, POLL_INTERVAL_MS, |dev| {
            Ok(dev.read_application()? == wanted)
        })
    }

    fn wait_for_contents(&mut self, code: u8, budget_ms: u32) -> Result<(), TofError> {
        self.wait_until(WaitTarget::StatusContents(code), budget_ms, POLL_INTERVAL_MS, |dev| {
            Ok(dev.read_contents()? == code)
        })
    }

    fn settle_enable_line(&mut self, enabled: bool) -> Result<(), TofError> {
        let Some(line) = self.enable_line.as_mut() else {
            return Ok(());
        };
        let driven = if enabled { line.set_high() } else { line.set_low() };
        driven.map_err(|err| TransportError::EnableLine(err.kind()))?;
        self.delay.delay_ms(ENABLE_LINE_SETTLE_MS);
        Ok(())
    }


    /// Full bring-up: probe, enable-line cycle, CPU reset, power-on and, if
    /// the bootloader is resident, patch download and switch to app0.
    pub fn begin(&mut self) -> Result<(), TofError> {
        info!(address = format_args!("{:#04x}", self.address), "Starting TMF8x01 bring-up");
        self.bringup = BringupState::PowerOff;
        if !self.bus.probe(self.address) {
            self.bringup = BringupState::Failed;
            return Err(TofError::DeviceNotFound { address: self.address });
        }

        if self.enable_line.is_some() {
            self.settle_enable_line(false)?;
            self.settle_enable_line(true)?;
        }

        self.sleep()?;
        self.boot_application()?;
        info!("Bring-up complete, app0 running");
        Ok(())
    }

    fn boot_application(&mut self) -> Result<(), TofError> {
        self.bringup = BringupState::Resetting;
        let result = self.power_up_and_load();
        if result.is_err() {
            self.bringup = BringupState::Failed;
        }
        result
    }

    fn power_up_and_load(&mut self) -> Result<(), TofError> {
        self.write_reg(Register::Enable, &[EnableRegister::power_on().bits()])?;
        self.wait_for_cpu_ready()?;

        match self.read_application()? {
            Application::Bootloader => {
                info!("Bootloader running, downloading RAM patch");
                self.bringup = BringupState::Bootloader;
                self.download_patch()?;
                let app = self.read_application()?;
                if app != Application::App0 {
                    return Err(TofError::BringupFailed(format!(
                        "application id after patch download is {:#04x}, expected {:#04x}",
                        u8::from(app),
                        APP_ID_APP0
                    )));
                }
            }
            app => debug!(?app, "Application already running"),
        }
        self.bringup = BringupState::App0;
        self.booted = true;
        Ok(())
    }

    /// Download the injected patch through the bootloader. Any failure
    /// aborts; a retry starts over from the bootloader switch.
    pub fn download_patch(&mut self) -> Result<(), TofError> {
        if self.read_application()? != Application::Bootloader {
            debug!("Requesting bootloader");
            self.write_reg(Register::AppRequestId, &[APP_ID_BOOTLOADER])?;
            self.wait_for_application(Application::Bootloader, WaitTarget::Bootloader)?;
        }
        self.bringup = BringupState::DownloadingPatch;

        self.send_frame(&PatchFrame::init())?;
        self.expect_ack(frame::BootloaderOpcode::Init)?;

        // No acknowledge is checked here, the next frame's ack covers it
        self.send_frame(&PatchFrame::erase())?;

        let chunks = self.patch.chunks().to_vec();
        info!(chunks = chunks.len(), bytes = self.patch.size(), "Writing patch");
        for (index, chunk) in chunks.into_iter().enumerate() {
            let frame = PatchFrame::write(chunk)?;
            self.send_frame(&frame)?;
            self.expect_ack(frame.opcode()).inspect_err(|_| {
                warn!(index, "Patch chunk not acknowledged, download aborted");
            })?;
        }

        self.send_frame(&PatchFrame::reset())?;
        self.wait_for_cpu_ready().map_err(|err| {
            TofError::BringupFailed(format!("CPU not ready after patch reset: {err}"))
        })
    }

    fn send_frame(&mut self, frame: &PatchFrame) -> Result<(), TofError> {
        self.write_reg(Register::BOOTLOADER_COMMAND, &frame.encode())
    }

    fn expect_ack(&mut self, opcode: frame::BootloaderOpcode) -> Result<(), TofError> {
        let status = self.read_reg(Register::BOOTLOADER_COMMAND, 3)?;
        if frame::is_ack(&status) {
            return Ok(());
        }
        Err(TofError::ChecksumAckFailure {
            opcode,
            status: [status[0], status[1], status[2]],
        })
    }

    /// Reset the CPU, which re-enters the bootloader. Configuration on the
    /// device is lost; the local command set is kept for [`Self::wakeup`].
    pub fn sleep(&mut self) -> Result<(), TofError> {
        let enable = self.read_enable()?.with_cpu_reset(true);
        self.write_reg(Register::Enable, &[enable.bits()])?;
        self.application = Application::Bootloader;
        if self.bringup != BringupState::PowerOff {
            self.bringup = BringupState::Bootloader;
        }
        self.reset_feed();
        self.measure = MeasureState::Stopped;
        debug!("Sensor put to sleep");
        Ok(())
    }

    /// Leave sleep: boot app0 again and restore interrupt and calibration
    /// configuration.
    pub fn wakeup(&mut self) -> Result<(), TofError> {
        info!("Waking sensor");
        self.boot_application()?;
        if self.command_set.interrupt_enabled() {
            self.write_reg(Register::InterruptEnable, &[INT_ENABLE_RESULT])?;
        }
        self.measure = MeasureState::Stopped;
        self.configure(self.calibration_mode())
    }

    fn require_enable_line(&self) -> Result<(), TofError> {
        if !self.booted {
            return Err(TofError::InvalidState("bring-up has not completed".to_string()));
        }
        if self.enable_line.is_none() {
            return Err(TofError::InvalidState("no enable line attached".to_string()));
        }
        Ok(())
    }

    /// Power the sensor back on through the EN pin after [`Self::power_down`].
    pub fn power_on(&mut self) -> Result<(), TofError> {
        self.require_enable_line()?;
        self.delay.delay_ms(ENABLE_LINE_SETTLE_MS);
        self.settle_enable_line(true)?;
        self.write_reg(Register::Enable, &[EnableRegister::power_on().bits()])?;
        self.wait_for_cpu_ready()?;
        if self.read_application()? == Application::Bootloader {
            self.write_reg(Register::AppRequestId, &[APP_ID_APP0])?;
            self.wait_for_application(Application::App0, WaitTarget::Application)?;
        }
        self.bringup = BringupState::App0;
        Ok(())
    }

    /// Cut power through the EN pin.
    pub fn power_down(&mut self) -> Result<(), TofError> {
        self.require_enable_line()?;
        self.delay.delay_ms(ENABLE_LINE_SETTLE_MS);
        self.settle_enable_line(false)?;
        self.reset_feed();
        self.measure = MeasureState::Stopped;
        self.bringup = BringupState::PowerOff;
        Ok(())
    }


    fn require_ready_to_configure(&self) -> Result<(), TofError> {
        if self.bringup != BringupState::App0 {
            return Err(TofError::InvalidState(format!(
                "bring-up not complete (state {})",
                self.bringup
            )));
        }
        if self.measure == MeasureState::Measuring {
            return Err(TofError::InvalidState("measurement already running".to_string()));
        }
        Ok(())
    }

    /// Replace the 14-byte calibration blob used by subsequent configuration
    pub fn set_calibration_data(&mut self, data: &[u8]) -> Result<(), TofError> {
        self.calibration = data.try_into().map_err(|_| TofError::LengthMismatch {
            what: "calibration data",
            expected: CALIBRATION_SIZE,
            actual: data.len(),
        })?;
        Ok(())
    }

    /// Replace the 11-byte algorithm state blob used by subsequent configuration
    pub fn set_algorithm_state(&mut self, data: &[u8]) -> Result<(), TofError> {
        self.algo_state = data.try_into().map_err(|_| TofError::LengthMismatch {
            what: "algorithm state",
            expected: ALGO_STATE_SIZE,
            actual: data.len(),
        })?;
        Ok(())
    }

    /// Select the ranging range (TMF8701). Takes effect at the next
    /// configuration.
    pub fn set_ranging_mode(&mut self, mode: RangingMode) -> Result<(), TofError> {
        if self.measure == MeasureState::Measuring {
            return Err(TofError::InvalidState("cannot change ranging mode while measuring".to_string()));
        }
        self.command_set.apply_ranging_mode(mode);
        Ok(())
    }

    pub fn start_measurement(&mut self, mode: CalibrationMode) -> Result<(), TofError> {
        self.configure(mode)
    }

    pub fn start_measurement_with_ranging(&mut self, mode: CalibrationMode, ranging: RangingMode) -> Result<(), TofError> {
        self.set_ranging_mode(ranging)?;
        self.configure(mode)
    }

    /// Load calibration, push the command set and arm measurement.
    ///
    /// On a status timeout the controller stays in `Configuring` and the
    /// call may be repeated.
    pub fn configure(&mut self, mode: CalibrationMode) -> Result<(), TofError> {
        self.require_ready_to_configure()?;
        info!(%mode, "Configuring measurement");
        self.measure = MeasureState::Configuring;
        // Priming counts only results read from here on
        self.reset_feed();

        self.command_set.apply_calibration_mode(mode);
        if mode != CalibrationMode::NoCalib {
            self.send_command(CommandCode::LoadCalibration)?;
            let calibration = self.calibration;
            self.write_reg(Register::FACTORY_CALIBRATION, &calibration)?;
            if mode == CalibrationMode::CalibAndAlgoState {
                let algo_state = self.algo_state;
                self.write_reg(Register::StateData, &algo_state)?;
            }
        }

        let command_set = *self.command_set.as_bytes();
        self.write_reg(Register::CmdData7, &command_set)?;
        self.delay.delay_ms(CONFIGURE_SETTLE_MS);
        self.wait_for_contents(CONTENTS_RESULT, STATUS_TIMEOUT_MS)?;

        self.measure = MeasureState::Calibrating;
        self.prime_clock_sync()?;
        self.measure = MeasureState::Measuring;
        info!("Measurement armed");
        Ok(())
    }

    /// Consume the first results after configuration until the clock-sync
    /// window holds all but one sample. Distances read before this are not
    /// drift corrected.
    fn prime_clock_sync(&mut self) -> Result<(), TofError> {
        self.wait_until(WaitTarget::Priming, PRIMING_TIMEOUT_MS, PRIMING_POLL_MS, |dev| {
            if let Some(record) = dev.poll()? {
                trace!(tid = record.transaction_id, "Priming result discarded");
            }
            Ok(dev.clock_sync.len() >= PRIMING_SAMPLES)
        })
    }

    /// Stop measuring and clear the result feed. Valid in every state.
    pub fn stop(&mut self) -> Result<(), TofError> {
        self.send_command(CommandCode::Stop)?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);
        self.measure = MeasureState::Stopped;
        self.reset_feed();
        info!("Measurement stopped");
        Ok(())
    }

    fn reset_feed(&mut self) {
        self.last_result = None;
        self.clock_sync.reset();
    }

    pub fn enable_interrupt(&mut self) -> Result<(), TofError> {
        self.write_reg(Register::InterruptEnable, &[INT_ENABLE_RESULT])?;
        self.command_set.set_interrupt(true);
        Ok(())
    }

    pub fn disable_interrupt(&mut self) -> Result<(), TofError> {
        self.write_reg(Register::InterruptEnable, &[0])?;
        self.command_set.set_interrupt(false);
        Ok(())
    }


    /// Read the result block. Returns the record if it is present and carries
    /// a transaction id not seen before.
    pub fn poll(&mut self) -> Result<Option<ResultRecord>, TofError> {
        let host_ms = self.time.millis();
        let bytes = self.read_reg(Register::Status, RESULT_SIZE)?;
        let record = ResultRecord::from_bytes(&bytes)
            .ok_or_else(|| TofError::InvalidArgument(format!("result block of {} bytes", bytes.len())))?;

        let accepted = record.is_present()
            && self
                .last_result
                .is_none_or(|last| last.transaction_id != record.transaction_id);

        // Acknowledge first so a failed write-back leaves the record unseen
        if self.command_set.interrupt_enabled() {
            self.acknowledge_interrupt()?;
        }

        if accepted {
            trace!(%record, "New result");
            self.last_result = Some(record);
            if let Some(ratio) = self.clock_sync.push(host_ms, record.device_clock) {
                debug!(ratio, "Clock drift scale factor accepted");
            }
        }

        Ok(accepted.then_some(record))
    }

    fn acknowledge_interrupt(&mut self) -> Result<(), TofError> {
        let status = self.read_byte(Register::InterruptStatus)?;
        if status & INT_STATUS_RESULT != 0 {
            self.write_reg(Register::InterruptStatus, &[status | INT_STATUS_RESULT])?;
        }
        Ok(())
    }

    /// Latest raw distance multiplied by the clock-drift scale factor.
    ///
    /// The scale factor is derived from timing drift and applied to a
    /// distance; this mirrors the vendor driver and is kept for
    /// compatibility.
    pub fn distance_mm(&self) -> f64 {
        let raw = self.last_result.map_or(0, |r| r.raw_distance_mm);
        f64::from(raw) * self.clock_sync.scale_factor()
    }

    pub fn distance(&self) -> Length {
        Length::new::<millimeter>(self.distance_mm())
    }


    fn require_app0(&mut self) -> Result<(), TofError> {
        if self.read_application()? != Application::App0 {
            return Err(TofError::InvalidState(format!(
                "app0 not running (application {:?})",
                self.application
            )));
        }
        Ok(())
    }

    /// Read the factory calibration computed by the device. Calibrate with no
    /// target within 40 cm and in the dark.
    pub fn read_calibration(&mut self) -> Result<[u8; CALIBRATION_SIZE], TofError> {
        if self.bringup != BringupState::App0 {
            return Err(TofError::InvalidState("bring-up not complete".to_string()));
        }
        self.require_app0()?;
        self.send_command(CommandCode::ReadCalibration)?;
        self.wait_for_contents(CONTENTS_CALIBRATION, STATUS_TIMEOUT_MS)?;
        let bytes = self.read_reg(Register::FACTORY_CALIBRATION, CALIBRATION_SIZE)?;
        self.send_command(CommandCode::Stop)?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);

        let mut calibration = [0u8; CALIBRATION_SIZE];
        calibration.copy_from_slice(&bytes);
        info!(calibration = hex::encode(calibration), "Factory calibration read");
        Ok(calibration)
    }

    /// Serial and identification numbers as a little-endian u32.
    pub fn unique_id(&mut self) -> Result<u32, TofError> {
        self.send_command(CommandCode::ReadSerialNumber)?;
        self.wait_for_contents(CONTENTS_SERIAL_NUMBER, SERIAL_NUMBER_TIMEOUT_MS)?;
        let bytes = self.read_reg(Register::SerialNumber, 4)?;
        self.send_command(CommandCode::Stop)?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn sensor_model(&mut self) -> Result<SensorModel, TofError> {
        let id = self.unique_id()?;
        Ok(SensorModel::from_model_id((id >> 16) as u16))
    }

    pub fn software_version(&mut self) -> Result<SoftwareVersion, TofError> {
        Ok(SoftwareVersion {
            major: self.read_byte(Register::VersionMajor)?,
            minor: self.read_byte(Register::VersionMinor)?,
            patch: self.read_byte(Register::VersionPatch)?,
            chip_revision: self.read_byte(Register::ChipRevision)?,
        })
    }

    pub fn junction_temperature_c(&mut self) -> Result<i8, TofError> {
        Ok(self.read_byte(Register::JunctionTemperature)? as i8)
    }

    /// Configure PIN0 (high nibble) and/or PIN1 (low nibble).
    pub fn configure_pins(&mut self, pin: Pin, control: PinControl) -> Result<(), TofError> {
        let value: u8 = control.into();
        self.pin_config = match pin {
            Pin::Pin0 => (self.pin_config & 0x0F) | (value << 4),
            Pin::Pin1 => (self.pin_config & 0xF0) | value,
            Pin::Both => (value << 4) | value,
        };
        let pin_config = self.pin_config;
        self.write_reg(Register::GPIO_CONFIG, &[pin_config, CommandCode::GpioControl.into()])
    }
}

#[cfg(feature = "linux")]
impl Tmf8x01<crate::transport::linux::LinuxI2cBus, linux_embedded_hal::Delay, crate::transport::StdTimeBase> {
    /// Open a session on a `/dev/i2c-N` bus. No bus traffic until `begin`.
    pub fn open(
        path: impl AsRef<std::path::Path>,
        address: u8,
        defaults: DefaultConfig,
        patch: PatchSource,
    ) -> Result<Self, TofError> {
        let bus = crate::transport::linux::LinuxI2cBus::open(path, address)?;
        let time = crate::transport::StdTimeBase::new();
        Ok(Self::new(bus, linux_embedded_hal::Delay, time, defaults, patch).with_address(address))
    }
}
