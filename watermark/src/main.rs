use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use watermark::{Farm, FarmConfig};

#[derive(Parser, Debug)]
#[command(name = "watermark")]
#[command(version, about = "Apply a stencil mask to a batch of same-size images", long_about = None)]
struct Cli {
    /// Directory holding the images to mask
    #[arg(value_name = "INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Mask image; pixels with red != 255 are blacked out
    #[arg(value_name = "MASK")]
    mask: Option<PathBuf>,

    /// Number of farm workers
    #[arg(value_name = "WORKERS")]
    workers: Option<usize>,

    /// Directory for masked JPEGs (created if absent)
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// YAML or JSON run configuration; command-line values take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Upper bound for WORKERS
    #[arg(long, value_name = "N")]
    max_workers: Option<usize>,

    /// Images of a worker's chunk processed concurrently
    #[arg(long, value_name = "N")]
    fan_out: Option<usize>,

    /// JPEG quality (1-100)
    #[arg(short, long, value_name = "Q")]
    quality: Option<u8>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER", default_value = "info")]
    log_level: String,

    /// Also write rotated log files into this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<FarmConfig> {
        let mut config = match &self.config {
            Some(path) => FarmConfig::from_file(path)?,
            None => FarmConfig::default(),
        };

        if let Some(input_dir) = self.input_dir {
            config.input_dir = input_dir;
        }
        if let Some(mask) = self.mask {
            config.mask_path = mask;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(max_workers) = self.max_workers {
            config.max_workers = max_workers;
        }
        if let Some(fan_out) = self.fan_out {
            config.chunk_fan_out = fan_out;
        }
        if let Some(quality) = self.quality {
            config.jpeg_quality = quality;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let started = Instant::now();
    let cli = Cli::parse();
    common::setup_logging(&cli.log_level, cli.log_dir.as_deref())?;

    let config = cli.into_config()?;
    let farm = Farm::from_config(&config).context("Failed to prepare watermark run")?;
    let mut report = farm.run().context("Watermark run failed")?;

    // Report wall-clock time for the whole invocation, discovery and mask load included.
    report.elapsed = started.elapsed();
    println!("{report}");

    Ok(())
}
