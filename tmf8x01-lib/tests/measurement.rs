//! Calibration and measurement controller

mod common;

use common::*;
use tmf8x01_lib::{Pin, PinControl, SensorModel, SensorVariant};

fn command_set_write(dev: &Session) -> Vec<u8> {
    dev.bus()
        .writes_to(0x08)
        .last()
        .map(|w| w.to_vec())
        .expect("Command set should have been written")
}

#[test]
fn test_configure_before_bringup_is_rejected() {
    let clock = FakeClock::default();
    let mut dev = session(sensor(&clock), clock);

    let err = dev.configure(CalibrationMode::Calib).unwrap_err();
    assert!(matches!(err, TofError::InvalidState(_)));
    assert!(dev.bus().writes.is_empty());
    assert_eq!(dev.measure_state(), MeasureState::Stopped);
}

#[test]
fn test_configure_with_calibration() {
    let dev = measuring(CalibrationMode::Calib);

    assert!(dev.is_armed());
    assert_eq!(dev.measure_state(), MeasureState::Measuring);

    let sim = dev.bus();
    // load-calibration command, calibration data, command set
    assert_eq!(sim.writes[0], (0x10, vec![0x0B]));
    assert_eq!(sim.writes[1], (0x20, DefaultConfig::tmf8801().calibration.to_vec()));
    assert!(sim.writes_to(0x2E).is_empty());

    let command_set = command_set_write(&dev);
    assert_eq!(command_set, vec![0x01, 0xA3, 0x00, 0x00, 0x00, 0x64, 0x03, 0x84, 0x02]);
}

#[test]
fn test_configure_with_algorithm_state() {
    let dev = measuring(CalibrationMode::CalibAndAlgoState);

    let sim = dev.bus();
    assert_eq!(sim.writes_to(0x2E), vec![&DefaultConfig::tmf8801().algo_state.to_vec()]);
    assert_eq!(command_set_write(&dev)[0], 0x03);
    assert_eq!(dev.calibration_mode(), CalibrationMode::CalibAndAlgoState);
}

#[test]
fn test_configure_without_calibration() {
    let dev = measuring(CalibrationMode::NoCalib);

    let sim = dev.bus();
    assert!(sim.writes_to(0x10).is_empty(), "No load-calibration command expected");
    assert!(sim.writes_to(0x20).is_empty());
    assert!(sim.writes_to(0x2E).is_empty());
    assert_eq!(command_set_write(&dev)[0], 0x00);
}

#[test]
fn test_configure_while_measuring_is_rejected() {
    let mut dev = measuring(CalibrationMode::Calib);
    dev.bus_mut().writes.clear();

    let err = dev.configure(CalibrationMode::NoCalib).unwrap_err();
    assert!(matches!(err, TofError::InvalidState(_)));
    assert!(dev.bus().writes.is_empty());
    assert!(dev.is_armed());
}

#[test]
fn test_configure_status_timeout_can_be_retried() {
    let mut dev = booted();
    dev.bus_mut().measure_ok = false;

    let err = dev.configure(CalibrationMode::Calib).unwrap_err();
    assert!(matches!(
        err,
        TofError::Timeout {
            target: WaitTarget::StatusContents(0x55),
            budget_ms: 1000
        }
    ));
    assert_eq!(dev.measure_state(), MeasureState::Configuring);

    dev.bus_mut().measure_ok = true;
    dev.bus_mut().queue_results(1..=4, 250);
    dev.configure(CalibrationMode::Calib).expect("Retry should succeed");
    assert!(dev.is_armed());
}

#[test]
fn test_priming_consumes_four_results() {
    let mut dev = booted();
    dev.bus_mut().queue_results(1..=6, 250);

    dev.configure(CalibrationMode::Calib).expect("configure");

    assert_eq!(dev.clock_sync().len(), 4);
    assert_eq!(dev.bus().results.len(), 2);
    assert_eq!(dev.last_result().map(|r| r.transaction_id), Some(4));
    // Not drift corrected yet
    assert_eq!(dev.scale_factor(), 1.0);
    assert_eq!(dev.distance_mm(), 250.0);
}

#[test]
fn test_priming_ignores_results_read_while_stopped() {
    let mut dev = booted();
    dev.bus_mut().queue_results(1..=4, 100);
    for _ in 0..4 {
        dev.poll().expect("poll");
    }
    assert_eq!(dev.clock_sync().len(), 4);

    dev.bus_mut().queue_results(10..=13, 250);
    dev.configure(CalibrationMode::Calib).expect("configure");

    assert!(dev.bus().results.is_empty(), "All four fresh results are consumed");
    assert_eq!(dev.last_result().map(|r| r.transaction_id), Some(13));
    assert_eq!(dev.clock_sync().len(), 4);
    assert_eq!(dev.scale_factor(), 1.0);
}

#[test]
fn test_priming_retry_starts_from_fresh_results() {
    let mut dev = booted();
    dev.bus_mut().queue_results(1..=2, 100);
    let err = dev.configure(CalibrationMode::Calib).unwrap_err();
    assert!(matches!(err, TofError::Timeout { target: WaitTarget::Priming, .. }));

    dev.bus_mut().queue_results(20..=23, 250);
    dev.configure(CalibrationMode::Calib).expect("Retry should succeed");

    assert!(dev.bus().results.is_empty());
    assert_eq!(dev.last_result().map(|r| r.transaction_id), Some(23));
    assert!(dev.is_armed());
}

#[test]
fn test_priming_timeout_without_results() {
    let mut dev = booted();

    let err = dev.configure(CalibrationMode::Calib).unwrap_err();
    assert!(matches!(
        err,
        TofError::Timeout {
            target: WaitTarget::Priming,
            budget_ms: 2000
        }
    ));
    assert_eq!(dev.measure_state(), MeasureState::Calibrating);
    assert!(!dev.is_armed());
}

#[test]
fn test_stop_from_any_state() {
    let mut dev = measuring(CalibrationMode::Calib);
    dev.bus_mut().writes.clear();

    dev.stop().expect("stop");
    assert_eq!(dev.measure_state(), MeasureState::Stopped);
    assert!(!dev.is_armed());
    assert_eq!(dev.bus().writes, vec![(0x10, vec![0xFF])]);
    assert!(dev.last_result().is_none());
    assert!(dev.clock_sync().is_empty());

    // Stopping again is harmless
    dev.stop().expect("second stop");
    assert_eq!(dev.measure_state(), MeasureState::Stopped);
}

#[test]
fn test_restart_after_stop() {
    let mut dev = measuring(CalibrationMode::Calib);
    dev.stop().expect("stop");

    dev.bus_mut().queue_results(20..=23, 300);
    dev.start_measurement(CalibrationMode::NoCalib).expect("restart");
    assert!(dev.is_armed());
    assert_eq!(dev.distance_mm(), 300.0);
}

#[test]
fn test_ranging_mode_applies_on_next_configure() {
    let clock = FakeClock::default();
    let mut dev = Tmf8x01::new(sensor(&clock), clock.clone(), clock, DefaultConfig::tmf8701(), two_chunk_patch());
    dev.begin().expect("bring-up");
    dev.bus_mut().queue_results(1..=4, 50);

    dev.start_measurement_with_ranging(CalibrationMode::Calib, RangingMode::Proximity)
        .expect("configure");
    let command_set = command_set_write(&dev);
    assert_eq!(command_set[1] & 0x23, 0x01);
    assert_eq!(command_set[0] & 0x03, 0x01);

    let err = dev.set_ranging_mode(RangingMode::Distance).unwrap_err();
    assert!(matches!(err, TofError::InvalidState(_)));
}

#[test]
fn test_calibration_data_lengths() {
    let mut dev = booted();

    let err = dev.set_calibration_data(&[0u8; 13]).unwrap_err();
    assert!(matches!(
        err,
        TofError::LengthMismatch {
            expected: 14,
            actual: 13,
            ..
        }
    ));
    let err = dev.set_algorithm_state(&[0u8; 12]).unwrap_err();
    assert!(matches!(
        err,
        TofError::LengthMismatch {
            expected: 11,
            actual: 12,
            ..
        }
    ));

    let calibration = [0x11u8; 14];
    dev.set_calibration_data(&calibration).expect("valid calibration");
    dev.bus_mut().queue_results(1..=4, 50);
    dev.configure(CalibrationMode::Calib).expect("configure");
    assert_eq!(dev.bus().writes_to(0x20), vec![&calibration.to_vec()]);
}

#[test]
fn test_read_calibration() {
    let mut dev = booted();
    let expected = dev.bus().calibration;

    let calibration = dev.read_calibration().expect("read calibration");

    assert_eq!(calibration, expected);
    let commands = dev.bus().writes_to(0x10);
    assert_eq!(commands, vec![&vec![0x0Au8], &vec![0xFFu8]]);
}

#[test]
fn test_read_calibration_requires_application() {
    let clock = FakeClock::default();
    let mut dev = session(sensor(&clock), clock);
    assert!(matches!(dev.read_calibration(), Err(TofError::InvalidState(_))));
}

#[test]
fn test_unique_id_and_model() {
    let mut dev = booted();

    assert_eq!(dev.unique_id().expect("unique id"), 0x4120_5678);
    assert_eq!(dev.sensor_model().expect("model"), SensorModel::Known(SensorVariant::Tmf8801));

    dev.bus_mut().serial = [0x00, 0x00, 0x10, 0x5E];
    assert_eq!(dev.sensor_model().expect("model"), SensorModel::Known(SensorVariant::Tmf8701));
}

#[test]
fn test_software_version() {
    let mut dev = booted();
    let version = dev.software_version().expect("version");
    assert_eq!(version.to_string(), "1.A.3.2");
}

#[test]
fn test_configure_pins() {
    let mut dev = booted();

    dev.configure_pins(Pin::Pin0, PinControl::OutputVcsel).expect("pin0");
    dev.configure_pins(Pin::Pin1, PinControl::OutputHigh).expect("pin1");
    dev.configure_pins(Pin::Both, PinControl::InputActiveLow).expect("both");

    assert_eq!(
        dev.bus().writes_to(0x0F),
        vec![&vec![0x30u8, 0x0F], &vec![0x35u8, 0x0F], &vec![0x11u8, 0x0F]]
    );
}
