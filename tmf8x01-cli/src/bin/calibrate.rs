use clap::Parser;
use std::path::PathBuf;
use tmf8x01_lib::{DefaultConfig, PatchSource, SensorModel, Tmf8x01};

/// Run the factory calibration and store it as JSON for later sessions.
///
/// Keep the field of view free of targets within 40 cm and the sensor in
/// the dark while this runs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "/dev/i2c-1")]
    bus: PathBuf,
    #[arg(short, long, default_value_t = 0x41)]
    address: u8,
    /// Length-prefixed RAM patch image
    #[arg(short, long)]
    patch: Option<PathBuf>,
    /// Output file
    #[arg(short, long, default_value = "tmf8x01-calibration.json")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();
    let cli = Cli::parse();

    let patch = match &cli.patch {
        Some(path) => PatchSource::from_length_prefixed(&std::fs::read(path)?)?,
        None => PatchSource::empty(),
    };
    let mut device = Tmf8x01::open(&cli.bus, cli.address, DefaultConfig::tmf8801(), patch)?;
    device.begin()?;

    // Start from the defaults of the detected variant so the command set matches
    let mut config = match device.sensor_model()? {
        SensorModel::Known(variant) => DefaultConfig::for_variant(variant),
        SensorModel::Unknown(id) => return Err(format!("unsupported model id {id:#06x}").into()),
    };

    println!("Calibrating, keep the sensor covered...");
    config.calibration = device.read_calibration()?;
    println!("Calibration: {}", hex::encode(config.calibration));

    std::fs::write(&cli.output, serde_json::to_string_pretty(&config)?)?;
    println!("Saved to {}", cli.output.display());
    Ok(())
}
