//! dance_fx: window entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dance_fx::app::{run, RunOptions};
use dance_fx::config::{Preset, DEFAULT_CONFIG_FILE};
use dance_fx::visualizer::{DEFAULT_FPS, DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[derive(Debug, Parser)]
#[command(name = "dance_fx", version)]
#[command(about = "Pose-driven particle visualizer")]
struct Cli {
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: usize,
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: usize,
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,
    /// Settings file, loaded at start and written by `save`.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// JSON Lines recording to play instead of the simulated dancer.
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,
    /// Restart the recording when it ends.
    #[arg(long = "loop", requires = "replay")]
    looping: bool,
    /// Flip recorded poses horizontally.
    #[arg(long)]
    mirror: bool,
    /// Seed for reproducible particle spawns.
    #[arg(long)]
    seed: Option<u64>,
    /// Apply a preset on top of the loaded settings (calm, energetic, party).
    #[arg(long, value_parser = parse_preset)]
    preset: Option<Preset>,
    /// Do not read control commands from stdin.
    #[arg(long)]
    no_stdin: bool,
    /// Debug logging (RUST_LOG overrides).
    #[arg(short, long)]
    verbose: bool,
}

fn parse_preset(s: &str) -> Result<Preset, String> {
    s.parse()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.no_stdin {
        eprintln!("{}", dance_fx::control::usage());
    }

    let opts = RunOptions {
        width:         cli.width.max(1),
        height:        cli.height.max(1),
        fps:           cli.fps.max(1),
        config_path:   cli.config,
        replay:        cli.replay,
        looping:       cli.looping,
        mirror:        cli.mirror,
        seed:          cli.seed,
        preset:        cli.preset,
        stdin_control: !cli.no_stdin,
    };
    run(opts).context("visualizer failed")
}
