//! PRACH Preamble Frame Generator
//!
//! Generates one 10 ms baseband frame carrying a 5G NR PRACH preamble and
//! writes it as interleaved little-endian f32 IQ samples.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use common::utils::{count_nonzero, mean_power, pack_iq_le, power_to_db};
use config::GeneratorConfig;
use phy::prach::{FixedSelector, PreambleSelector, SeededRandomSelector};
use phy::PrachGenerator;

/// 5G NR PRACH preamble frame generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML, TOML or JSON); built-in defaults when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preamble index (0-63)
    #[arg(short, long, conflicts_with = "seed")]
    preamble: Option<i64>,

    /// Seed for random preamble selection
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output file for the raw IQ samples
    #[arg(short, long, default_value = "prach_frame.cf32")]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the configuration file
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => GeneratorConfig::default(),
    };

    // Initialize logging
    let directive = args.log_level.clone().unwrap_or_else(|| config.log.filter_directive());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&directive));

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_line_number(true)
        .init();

    info!("Starting PRACH frame generator");
    match &args.config {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => info!("Using built-in configuration"),
    }

    let prach = &config.prach;
    info!("PRACH configuration:");
    info!("  Configuration index: {}", prach.occasion.config_index);
    info!("  Roots: {:?}", prach.roots_in_use());
    info!("  N_CS: {} ({} shifts per root)", prach.cyclic_shift_spacing, prach.card_v());
    info!("  Resource blocks: {}, frequency offset: {}", prach.resource_block_count, prach.frequency_offset);
    info!("  FFT size: {}, CP: {}, repetitions: {}", prach.fft_size, prach.cyclic_prefix_length, prach.repeat_count);
    info!("  Sample rate: {} MHz", prach.samples_per_ms as f64 / 1e3);
    info!("  Frame {}, slot {}, starting symbol {}",
          prach.placement.frame_index, prach.placement.slot_index, prach.placement.starting_symbol);

    let generator = PrachGenerator::new(config.prach.clone())?;

    let mut selector: Box<dyn PreambleSelector> = match (args.preamble, args.seed) {
        (Some(index), _) => Box::new(FixedSelector(index)),
        (None, Some(seed)) => Box::new(SeededRandomSelector::new(seed)),
        (None, None) => {
            warn!("No preamble or seed given, using preamble 0");
            Box::new(FixedSelector(0))
        }
    };

    let (index, frame) = generator.generate_with_selector(selector.as_mut())?;

    let block = &frame[generator.time_offset()..generator.time_offset() + prach.assembled_length()];
    info!("Generated preamble {}", index);
    info!("  Offset: {} samples, block: {} samples, frame: {} samples",
          generator.time_offset(), block.len(), frame.len());
    info!("  Non-zero samples: {}", count_nonzero(&frame));
    info!("  PRACH power: {:.2} dB", power_to_db(mean_power(block)));

    let bytes = pack_iq_le(&frame);
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {} bytes to {}", bytes.len(), args.output.display());

    Ok(())
}
