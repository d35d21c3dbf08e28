use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tmf8x01_lib::{CalibrationMode, DefaultConfig, PatchSource, Tmf8x01};

/// Record every distinct TMF8x01 result as a JSON line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "/dev/i2c-1")]
    bus: PathBuf,
    #[arg(short, long, default_value_t = 0x41)]
    address: u8,
    /// Calibration JSON written by `calibrate`
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Length-prefixed RAM patch image
    #[arg(short, long)]
    patch: Option<PathBuf>,
    /// Results are appended here, one JSON object per line
    #[arg(short, long, default_value = "tmf8x01-results.jsonl")]
    output: PathBuf,
    /// Run until this many results are recorded (0 runs forever)
    #[arg(short = 'n', long, default_value_t = 0)]
    samples: u64,
    #[arg(short, long, default_value_t = 30)]
    interval_ms: u64,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn setup_logging(log_file_path: Option<&PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = if let Some(path) = log_file_path {
        let log_file = File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // -v gives DEBUG, -vv TRACE; RUST_LOG overrides
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }
    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.as_ref(), &cli.verbose)?;

    if let Err(e) = run(&cli) {
        error!("Logger failed: {:?}", e);
        process::exit(1);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let defaults = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
            serde_json::from_str::<DefaultConfig>(&text).context("Invalid calibration file")?
        }
        None => DefaultConfig::tmf8801(),
    };
    let patch = match &cli.patch {
        Some(path) => PatchSource::from_length_prefixed(&std::fs::read(path)?).context("Invalid patch image")?,
        None => PatchSource::empty(),
    };
    let mode = if cli.config.is_some() {
        defaults.command_set.calibration_mode()
    } else {
        CalibrationMode::NoCalib
    };

    let mut device = Tmf8x01::open(&cli.bus, cli.address, defaults, patch).context("Failed to open I2C bus")?;
    device.begin().context("Sensor bring-up failed")?;
    device.start_measurement(mode).context("Failed to start measurement")?;
    info!(%mode, output = ?cli.output, "Recording results");

    let mut output = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.output)
        .with_context(|| format!("Failed to open {:?}", cli.output))?;

    let mut recorded = 0u64;
    while cli.samples == 0 || recorded < cli.samples {
        match device.poll() {
            Ok(Some(record)) => {
                recorded += 1;
                let line = serde_json::json!({
                    "result": record,
                    "distance_mm": device.distance_mm(),
                    "scale_factor": device.scale_factor(),
                });
                writeln!(output, "{line}")?;
                debug!(%record, "Recorded");
            }
            Ok(None) => {}
            Err(e) => warn!("Poll failed: {e}"),
        }
        std::thread::sleep(Duration::from_millis(cli.interval_ms));
    }

    device.stop()?;
    info!(recorded, "Finished");
    Ok(())
}
