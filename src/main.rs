//! Headless eyewear try-on demo driven by a synthetic face.

use anyhow::{Context, Result};
use clap::Parser;
use eyewear_tryon::{
    app::TryOnApp,
    config::{Config, EXAMPLE_CONFIG},
};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of frames to process
    #[arg(short = 'n', long)]
    frames: Option<u32>,

    /// Synthetic frame width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Synthetic frame height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Smoothing filter (adaptive, none)
    #[arg(short, long)]
    filter: Option<String>,

    /// Landmark jitter in pixels
    #[arg(long)]
    noise: Option<f64>,

    /// Random seed for the jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print the example configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Eyewear Try-On - headless demo");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {path}");
            Config::from_file(path).with_context(|| format!("failed to load {path}"))?
        }
        None => Config::default(),
    };

    // Command line overrides the file
    if let Some(frames) = args.frames {
        config.demo.frames = frames;
    }
    if let Some(width) = args.width {
        config.demo.width = width;
    }
    if let Some(height) = args.height {
        config.demo.height = height;
    }
    if let Some(filter) = args.filter {
        config.smoothing.filter = filter;
    }
    if let Some(noise) = args.noise {
        config.demo.noise = noise;
    }
    if let Some(seed) = args.seed {
        config.demo.seed = seed;
    }
    config.validate().context("invalid configuration")?;

    let mut app = TryOnApp::new(config)?;
    let summary = app.run();
    app.shutdown();
    summary?;

    Ok(())
}
