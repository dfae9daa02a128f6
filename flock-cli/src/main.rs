use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flock_cli::{
    is_stdout_path, load_config_file, run_headless, PointerScript, RunOptions, ScheduledResize,
};
use flock_core::{SimulationConfig, Viewport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless runner for the flocking background", long_about = None)]
struct Args {
    /// JSON config file; missing keys take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Viewport width
    #[arg(long, default_value_t = 1920.0)]
    width: f32,

    /// Viewport height
    #[arg(long, default_value_t = 1080.0)]
    height: f32,

    /// User agent used to classify the device
    #[arg(long, default_value = "")]
    user_agent: String,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 500)]
    ticks: u64,

    /// Random seed for positions, headings and per-agent jitter
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Pointer script: 'idle', 'circle[:RADIUS]' or 'fixed:X,Y'
    #[arg(short, long, default_value = "idle")]
    pointer: PointerScript,

    /// Resize before a tick, as TICK:WIDTHxHEIGHT (repeatable)
    #[arg(short, long)]
    resize: Vec<ScheduledResize>,

    /// Write pose frames as JSON lines to this file ('-' for stdout; the
    /// summary then goes to stderr)
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Write a frame every N ticks
    #[arg(long, default_value_t = 1)]
    frame_every: u64,

    /// Hold the configured frame rate instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => SimulationConfig::default(),
    };

    let options = RunOptions {
        config,
        viewport: Viewport::new(args.width, args.height),
        user_agent: args.user_agent,
        ticks: args.ticks,
        seed: args.seed,
        pointer: args.pointer,
        resizes: args.resize,
        frame_every: args.frame_every,
        realtime: args.realtime,
    };

    let frames_on_stdout = args.frames.as_deref().is_some_and(is_stdout_path);
    let mut frames: Option<Box<dyn Write>> = match &args.frames {
        Some(_) if frames_on_stdout => Some(Box::new(BufWriter::new(io::stdout()))),
        Some(path) => Some(Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ))),
        None => None,
    };

    let summary = match frames.as_mut() {
        Some(out) => run_headless(&options, Some(out.as_mut())),
        None => run_headless(&options, None),
    }
    .context("Run failed")?;
    if let Some(out) = frames.as_mut() {
        out.flush().context("Failed to flush frames")?;
    }

    // Keep stdout a clean JSON-lines stream when frames go there.
    let summary = serde_json::to_string_pretty(&summary)?;
    if frames_on_stdout {
        eprintln!("{}", summary);
    } else {
        println!("{}", summary);
    }
    Ok(())
}
