//! Surface-rotation sample entry point.

mod geometry;
mod rotation;
mod sample;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use vks_core::{Config, WindowConfig};
use vks_framework::run_sample;

use crate::sample::SurfaceRotation;

/// Swapchain pre-rotation demo.
#[derive(Parser, Debug)]
#[command(name = "surface-rotation")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in pre-rotate mode (the application rotates its own content).
    #[arg(long)]
    pre_rotate: bool,

    /// Enable Vulkan validation layers.
    #[arg(long)]
    validation: bool,
}

fn main() -> Result<()> {
    vks_core::init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config {
            window: WindowConfig {
                title: "Surface Rotation".to_string(),
                ..WindowConfig::default()
            },
            ..Config::default()
        },
    };
    if args.pre_rotate {
        config.pre_rotate = true;
    }
    if args.validation {
        config.validation = true;
    }

    info!(
        "Starting surface-rotation sample (pre-rotate: {})",
        config.pre_rotate
    );

    let sample = SurfaceRotation::new(config.pre_rotate);
    run_sample(sample, config)?;

    Ok(())
}
