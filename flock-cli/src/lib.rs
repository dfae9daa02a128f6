//! Headless host loop for the flocking engine.
//!
//! Drives a [`Simulation`] at its target cadence on a simulated clock, feeds a
//! scripted pointer through a [`PointerCell`], applies scripted resizes
//! between ticks, and optionally streams pose frames as JSON lines.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use flock_core::{DeviceHints, FrameInput, PointerCell, Simulation, SimulationConfig, Viewport};
use flock_shared::{load_config, FrameRecord, PointerEvent, RunSummary};

/// Where the scripted pointer is at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PointerScript {
    /// The pointer never moves, so it never repels.
    #[default]
    Idle,
    /// Sweeps a circle around the viewport centre, moving every frame.
    Circle { radius: f32, period_s: f32 },
    /// Jiggles by a pixel around a point every frame.
    Fixed { x: f32, y: f32 },
}

impl PointerScript {
    /// The event the input layer would report at `elapsed` seconds.
    pub fn event_at(&self, viewport: Viewport, elapsed: f64, now_ms: f64) -> Option<PointerEvent> {
        match *self {
            PointerScript::Idle => None,
            PointerScript::Circle { radius, period_s } => {
                let angle = (elapsed / period_s as f64 * std::f64::consts::TAU) as f32;
                Some(PointerEvent::new(
                    viewport.width / 2.0 + radius * angle.cos(),
                    viewport.height / 2.0 + radius * angle.sin(),
                    now_ms,
                ))
            }
            PointerScript::Fixed { x, y } => {
                let wobble = if (now_ms as u64 / 20) % 2 == 0 { 0.5 } else { -0.5 };
                Some(PointerEvent::new(x + wobble, y, now_ms))
            }
        }
    }
}

impl FromStr for PointerScript {
    type Err = anyhow::Error;

    /// `idle`, `circle`, `circle:RADIUS`, or `fixed:X,Y`.
    fn from_str(s: &str) -> Result<Self> {
        let (kind, args) = s.split_once(':').unwrap_or((s, ""));
        match kind {
            "idle" | "none" => Ok(PointerScript::Idle),
            "circle" => {
                let radius = if args.is_empty() {
                    200.0
                } else {
                    args.parse().context("circle radius must be a number")?
                };
                Ok(PointerScript::Circle {
                    radius,
                    period_s: 6.0,
                })
            }
            "fixed" => {
                let (x, y) = args
                    .split_once(',')
                    .context("fixed pointer needs X,Y (e.g. fixed:400,300)")?;
                Ok(PointerScript::Fixed {
                    x: x.trim().parse().context("fixed pointer X must be a number")?,
                    y: y.trim().parse().context("fixed pointer Y must be a number")?,
                })
            }
            other => bail!("unknown pointer script '{}'", other),
        }
    }
}

/// A viewport change applied before tick `at_tick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledResize {
    pub at_tick: u64,
    pub viewport: Viewport,
}

impl FromStr for ScheduledResize {
    type Err = anyhow::Error;

    /// `TICK:WIDTHxHEIGHT`, e.g. `100:390x844`.
    fn from_str(s: &str) -> Result<Self> {
        let (tick, size) = s
            .split_once(':')
            .context("resize must look like TICK:WIDTHxHEIGHT")?;
        let (w, h) = size
            .split_once('x')
            .context("resize size must look like WIDTHxHEIGHT")?;
        Ok(ScheduledResize {
            at_tick: tick.trim().parse().context("resize tick must be an integer")?,
            viewport: Viewport::new(
                w.trim().parse().context("resize width must be a number")?,
                h.trim().parse().context("resize height must be a number")?,
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: SimulationConfig,
    pub viewport: Viewport,
    pub user_agent: String,
    pub ticks: u64,
    pub seed: u64,
    pub pointer: PointerScript,
    pub resizes: Vec<ScheduledResize>,
    /// Write a frame every N ticks (0 disables frame output).
    pub frame_every: u64,
    /// Sleep to hold the target frame rate instead of running flat out.
    pub realtime: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: SimulationConfig::default(),
            viewport: Viewport::new(1920.0, 1080.0),
            user_agent: String::new(),
            ticks: 500,
            seed: 0,
            pointer: PointerScript::Idle,
            resizes: Vec::new(),
            frame_every: 0,
            realtime: false,
        }
    }
}

/// `-` as a frames path means stdout.
pub fn is_stdout_path(path: &Path) -> bool {
    path.as_os_str() == "-"
}

pub fn load_config_file(path: &Path) -> Result<SimulationConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    load_config(&text).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Runs the loop to completion and returns the end-of-run summary. Frames go
/// to `frames` as one JSON object per line.
pub fn run_headless(options: &RunOptions, mut frames: Option<&mut dyn Write>) -> Result<RunSummary> {
    let mut sim = Simulation::new(options.config.clone(), options.seed);
    let hints = DeviceHints::new(options.user_agent.as_str());
    let pointer = PointerCell::new();

    let frame_rate = sim.config().frame_rate;
    let frame_interval = Duration::from_secs_f64(1.0 / frame_rate as f64);
    let dt = 1.0 / frame_rate;

    let mut viewport = options.viewport;
    sim.resize_with_hints(viewport, &hints);
    log::info!(
        "running {} ticks at {} fps, {} agents, pointer {:?}",
        options.ticks,
        frame_rate,
        sim.agents().len(),
        options.pointer
    );

    let started = Instant::now();
    for tick in 0..options.ticks {
        let frame_started = Instant::now();

        for resize in options.resizes.iter().filter(|r| r.at_tick == tick) {
            viewport = resize.viewport;
            let count = sim.resize_with_hints(viewport, &hints);
            log::debug!(
                "tick {}: resized to {}x{}, {} agents",
                tick,
                viewport.width,
                viewport.height,
                count
            );
        }

        let elapsed = tick as f64 * dt as f64;
        let now_ms = elapsed * 1000.0;
        if let Some(event) = options.pointer.event_at(viewport, elapsed, now_ms) {
            pointer.record(event.position.x, event.position.y, event.timestamp_ms);
        }

        sim.step(&FrameInput {
            viewport,
            dt,
            elapsed,
            now_ms,
            pointer: pointer.snapshot(),
        });

        if let Some(out) = frames.as_deref_mut() {
            if options.frame_every > 0 && sim.tick() % options.frame_every == 0 {
                serde_json::to_writer(&mut *out, &FrameRecord::capture(&sim))
                    .context("Failed to write frame")?;
                writeln!(out).context("Failed to write frame")?;
            }
        }

        if options.realtime {
            if let Some(rest) = frame_interval.checked_sub(frame_started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
    }

    let wall = started.elapsed().as_secs_f64();
    if wall > 0.0 {
        log::info!(
            "{} ticks in {:.2}s ({:.1} ticks/s)",
            sim.tick(),
            wall,
            sim.tick() as f64 / wall
        );
    }

    Ok(RunSummary::capture(&sim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pointer_script() {
        assert_eq!("idle".parse::<PointerScript>().unwrap(), PointerScript::Idle);
        assert_eq!(
            "circle:120".parse::<PointerScript>().unwrap(),
            PointerScript::Circle {
                radius: 120.0,
                period_s: 6.0
            }
        );
        assert_eq!(
            "fixed:400, 300".parse::<PointerScript>().unwrap(),
            PointerScript::Fixed { x: 400.0, y: 300.0 }
        );
        assert!("fixed:400".parse::<PointerScript>().is_err());
        assert!("laser".parse::<PointerScript>().is_err());
    }

    #[test]
    fn test_parse_resize() {
        let resize: ScheduledResize = "100:390x844".parse().unwrap();
        assert_eq!(resize.at_tick, 100);
        assert_eq!(resize.viewport, Viewport::new(390.0, 844.0));
        assert!("100-390x844".parse::<ScheduledResize>().is_err());
    }

    #[test]
    fn test_dash_means_stdout() {
        assert!(is_stdout_path(Path::new("-")));
        assert!(!is_stdout_path(Path::new("frames.jsonl")));
        assert!(!is_stdout_path(Path::new("./-")));
    }

    #[test]
    fn test_idle_pointer_reports_nothing() {
        let vp = Viewport::new(100.0, 100.0);
        assert!(PointerScript::Idle.event_at(vp, 1.0, 1000.0).is_none());
        let event = PointerScript::Circle {
            radius: 10.0,
            period_s: 1.0,
        }
        .event_at(vp, 0.0, 0.0)
        .unwrap();
        assert_eq!(event.position.x, 60.0);
        assert_eq!(event.position.y, 50.0);
    }
}
