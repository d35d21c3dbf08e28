use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tmf8x01_lib::{LinuxI2cBus, Register, RegisterBus, constants::DEFAULT_ADDRESS};
use tracing::{debug, info};

/// Look for TMF8x01 sensors on the Linux I2C buses.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to probe on every bus
    #[arg(short, long, default_value_t = DEFAULT_ADDRESS)]
    address: u8,
    /// Scan only this bus instead of every /dev/i2c-*
    #[arg(short, long)]
    bus: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let buses = match cli.bus {
        Some(bus) => vec![bus],
        None => list_buses().context("Failed to list I2C buses")?,
    };
    info!("Scanning {} I2C bus(es) for address {:#04x}...\n", buses.len(), cli.address);

    let mut count = 0;
    for path in buses {
        let mut bus = match LinuxI2cBus::open(&path, cli.address) {
            Ok(bus) => bus,
            Err(e) => {
                debug!(path = %path.display(), "Cannot open bus: {e}");
                continue;
            }
        };
        if !bus.probe(cli.address) {
            continue;
        }
        count += 1;
        info!("Device #{}: {} @ {:#04x}", count, path.display(), cli.address);
        // The application id tells apart a cold sensor from a running one
        match bus.read(Register::AppId.addr(), 1) {
            Ok(app) => info!("  Application ID: {:#04x}", app[0]),
            Err(e) => info!("  Application ID: <unreadable: {e}>"),
        }
        info!("---");
    }
    if count == 0 {
        info!("No TMF8x01 found.");
    }
    Ok(())
}

fn list_buses() -> std::io::Result<Vec<PathBuf>> {
    let mut buses = std::fs::read_dir("/dev")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("i2c-"))
        })
        .collect::<Vec<_>>();
    buses.sort();
    Ok(buses)
}
