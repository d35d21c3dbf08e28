use clap::Parser;
use std::path::PathBuf;
use tmf8x01_lib::{DefaultConfig, PatchSource, Tmf8x01};

/// Bring the sensor up and print its identification.
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
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    let cli = Cli::parse();

    let patch = match &cli.patch {
        Some(path) => PatchSource::from_length_prefixed(&std::fs::read(path)?)?,
        None => PatchSource::empty(),
    };
    println!("Opening {} at {:#04x}...", cli.bus.display(), cli.address);
    let mut device = Tmf8x01::open(&cli.bus, cli.address, DefaultConfig::tmf8801(), patch)?;
    device.begin()?;
    println!("Bring-up: {}\n", device.bringup_state());

    let version = device.software_version()?;
    let unique_id = device.unique_id()?;
    let model = device.sensor_model()?;
    let temperature = device.junction_temperature_c()?;

    println!("============================================================");
    println!("DEVICE INFORMATION");
    println!("============================================================");
    println!("Model:              {}", model);
    println!("Firmware Version:   {}", version);
    println!("Unique ID:          {:#010x} ({})", unique_id, hex::encode(unique_id.to_le_bytes()));
    println!("Junction Temp:      {} °C", temperature);
    println!("Command Set:        {}", hex::encode(device.command_set().as_bytes()));
    println!("Calibration Mode:   {}", device.calibration_mode());

    Ok(())
}
