use clap::{Parser, ValueEnum};
use embedded_hal::digital::OutputPin;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tmf8x01_lib::transport::linux;
use tmf8x01_lib::{
    CalibrationMode, Delay, DefaultConfig, LinuxI2cBus, PatchSource, RangingMode, SensorVariant, StdTimeBase, Tmf8x01,
};
use tracing::{info, warn};
use uom::si::length::centimeter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Variant {
    Tmf8801,
    Tmf8701,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Calibration {
    None,
    Factory,
    FactoryAndState,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Range {
    Proximity,
    Distance,
    Combine,
}

/// Print distances from a TMF8801/TMF8701 on a Linux I2C bus.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// I2C bus device
    #[arg(short, long, default_value = "/dev/i2c-1")]
    bus: PathBuf,
    /// 7-bit sensor address
    #[arg(short, long, default_value_t = 0x41)]
    address: u8,
    #[arg(long, value_enum, default_value_t = Variant::Tmf8801)]
    variant: Variant,
    /// Calibration JSON written by `calibrate`, replaces the variant defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Length-prefixed RAM patch image
    #[arg(short, long)]
    patch: Option<PathBuf>,
    /// GPIO line wired to the EN pin; the sensor is power cycled on start
    #[arg(long)]
    enable_line: Option<u32>,
    #[arg(long, default_value = "/dev/gpiochip0")]
    gpio_chip: PathBuf,
    #[arg(long, value_enum, default_value_t = Calibration::Factory)]
    calibration: Calibration,
    #[arg(long, value_enum, default_value_t = Range::Combine)]
    range: Range,
    /// Enable the result interrupt on the INT pin
    #[arg(long)]
    interrupt: bool,
    /// Number of distinct results to print (0 runs forever)
    #[arg(short = 'n', long, default_value_t = 20)]
    count: u32,
    #[arg(long, default_value_t = 30)]
    interval_ms: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let defaults = match &cli.config {
        Some(path) => serde_json::from_str::<DefaultConfig>(&std::fs::read_to_string(path)?)?,
        None => DefaultConfig::for_variant(match cli.variant {
            Variant::Tmf8801 => SensorVariant::Tmf8801,
            Variant::Tmf8701 => SensorVariant::Tmf8701,
        }),
    };
    let patch = match &cli.patch {
        Some(path) => PatchSource::from_length_prefixed(&std::fs::read(path)?)?,
        None => PatchSource::empty(),
    };

    let device = Tmf8x01::open(&cli.bus, cli.address, defaults, patch)?;
    match cli.enable_line {
        Some(line) => run(device.with_enable_line(linux::enable_line(&cli.gpio_chip, line)?), &cli),
        None => run(device, &cli),
    }
}

fn run<P: OutputPin>(mut device: Tmf8x01<LinuxI2cBus, Delay, StdTimeBase, P>, cli: &Cli) -> Result<(), Box<dyn Error>> {
    device.begin()?;
    println!("Sensor ready, firmware {}", device.software_version()?);

    if cli.interrupt {
        device.enable_interrupt()?;
    }

    let mode = match cli.calibration {
        Calibration::None => CalibrationMode::NoCalib,
        Calibration::Factory => CalibrationMode::Calib,
        Calibration::FactoryAndState => CalibrationMode::CalibAndAlgoState,
    };
    let ranging = match cli.range {
        Range::Proximity => RangingMode::Proximity,
        Range::Distance => RangingMode::Distance,
        Range::Combine => RangingMode::Combine,
    };
    device.start_measurement_with_ranging(mode, ranging)?;
    info!(%mode, %ranging, "Measuring");

    let mut printed = 0;
    while cli.count == 0 || printed < cli.count {
        match device.poll() {
            Ok(Some(record)) => {
                printed += 1;
                println!(
                    "[{:>4}] {:6.1} cm  (raw {} mm, reliability {}, scale {:.4})",
                    printed,
                    device.distance().get::<centimeter>(),
                    record.raw_distance_mm,
                    record.reliability,
                    device.scale_factor()
                );
            }
            Ok(None) => {}
            Err(e) => warn!("Poll failed: {e}"),
        }
        std::thread::sleep(Duration::from_millis(cli.interval_ms));
    }

    device.stop()?;
    Ok(())
}
