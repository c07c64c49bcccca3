//! Decode binary - decodes FEM readout streams from disk
//!
//! Usage:
//!   cargo run --bin decode -- data.bin
//!   cargo run --bin decode -- data.bin --config config.toml
//!   cargo run --bin decode -- data.bin --max-events 100 --print-events

use std::path::PathBuf;

use clap::Parser;
use femdec_rs::config::Config;
use femdec_rs::decoder::EventDecoder;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Decode - offline decoder for FEM charge and light readout streams
#[derive(Parser, Debug)]
#[command(name = "decode", about = "FEM readout stream decoder", version)]
struct Args {
    /// Input file of little-endian 32-bit stream words
    input: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Slot number of the light-readout FEM, overriding the config
    #[arg(long)]
    light_slot: Option<u16>,

    /// Stop after decoding N events
    #[arg(short, long)]
    max_events: Option<usize>,

    /// Print a one-line summary per decoded event
    #[arg(short, long)]
    print_events: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("femdec_rs=info".parse()?))
        .init();

    // Parse command line arguments
    let args = Args::parse();

    // Build configuration
    let mut settings = match &args.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!(config_file = %path.display(), "Loaded configuration");
            config.decoder
        }
        None => Default::default(),
    };
    if let Some(slot) = args.light_slot {
        settings.light_slot = slot;
    }

    info!(
        input = %args.input.display(),
        light_slot = settings.light_slot,
        use_charge_roi = settings.use_charge_roi,
        "Starting decode"
    );

    let mut decoder = EventDecoder::from_file(&args.input, settings)?;

    let events = match args.max_events {
        Some(n) => decoder.decode_events(n),
        None => decoder.decode_events(usize::MAX),
    };

    if args.print_events {
        for event in &events {
            println!("{event}");
        }
    }

    let stats = decoder.stats();
    info!(%stats, "Decode finished");
    println!("{stats}");

    Ok(())
}
