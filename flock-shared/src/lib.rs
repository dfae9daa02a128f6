//! Data exchanged between the flocking engine and its hosts: config documents,
//! pointer events, pose frames and run summaries, all as JSON.

use core::fmt;

use flock_core::{AgentPose, PointerSnapshot, Simulation, SimulationConfig};
use serde::{Deserialize, Serialize};

/// A 2D position in screen coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A pointer movement reported by the host's input layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PointerEvent {
    pub position: Position,
    /// Monotonic host clock, milliseconds.
    pub timestamp_ms: f64,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self {
            position: Position::new(x, y),
            timestamp_ms,
        }
    }
}

impl From<PointerEvent> for PointerSnapshot {
    fn from(event: PointerEvent) -> Self {
        PointerSnapshot::new(event.position.x, event.position.y, event.timestamp_ms)
    }
}

/// One agent's pose as written to a frame dump.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PoseRecord {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub size: f32,
    pub hue: f32,
}

impl From<&AgentPose> for PoseRecord {
    fn from(pose: &AgentPose) -> Self {
        Self {
            x: pose.position.x,
            y: pose.position.y,
            heading: pose.heading,
            size: pose.size,
            hue: pose.hue,
        }
    }
}

/// All poses after one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameRecord {
    pub tick: u64,
    pub elapsed: f64,
    pub poses: Vec<PoseRecord>,
}

impl FrameRecord {
    pub fn capture(sim: &Simulation) -> Self {
        Self {
            tick: sim.tick(),
            elapsed: sim.elapsed(),
            poses: sim.poses().map(|pose| PoseRecord::from(&pose)).collect(),
        }
    }
}

/// End-of-run statistics reported by a headless host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub agent_count: usize,
    pub max_boids: usize,
    pub device: String,
    pub neighbor_query: String,
    pub mean_speed: f32,
    pub max_speed_ratio: f32,
}

impl RunSummary {
    pub fn capture(sim: &Simulation) -> Self {
        let agents = sim.agents();
        let mean_speed = if agents.is_empty() {
            0.0
        } else {
            agents.iter().map(|a| a.speed()).sum::<f32>() / agents.len() as f32
        };
        let max_speed_ratio = agents
            .iter()
            .map(|a| a.speed() / a.max_speed)
            .fold(0.0f32, f32::max);

        Self {
            ticks: sim.tick(),
            agent_count: agents.len(),
            max_boids: sim.bounds().max_boids,
            device: format!("{:?}", sim.device()).to_lowercase(),
            neighbor_query: sim.neighbor_query().to_string(),
            mean_speed,
            max_speed_ratio,
        }
    }
}

/// Errors reading a configuration document.
#[derive(Debug)]
pub enum ConfigError {
    /// The document is not valid JSON or has a mistyped field.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Invalid flock configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Parses a (possibly partial) JSON config and sanitizes it. Missing keys
/// take their defaults; out-of-range values are repaired and logged.
pub fn load_config(json: &str) -> Result<SimulationConfig, ConfigError> {
    let mut config: SimulationConfig = serde_json::from_str(json)?;
    config.sanitize();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::{DeviceClass, RenderStyle, Viewport};

    #[test]
    fn test_pointer_event_to_snapshot() {
        let snapshot: PointerSnapshot = PointerEvent::new(10.0, 20.0, 500.0).into();
        assert_eq!(snapshot.last_move_ms, Some(500.0));
        assert!(snapshot.is_active(550.0, 60.0));
        assert!(!snapshot.is_active(560.0, 60.0));
    }

    #[test]
    fn test_load_partial_config() {
        let config = load_config(
            r#"{ "min_boids": 10, "max_boids": 5, "appearance": { "style": { "kind": "polygon", "sides": 6, "fill": false, "stroke_weight": 0.6 } } }"#,
        )
        .unwrap();
        assert_eq!(config.max_boids, 10);
        assert_eq!(config.separation_radius, 30.0);
        assert!(matches!(config.appearance.style, RenderStyle::Polygon { sides: 6, fill: false, .. }));
    }

    #[test]
    fn test_load_config_rejects_bad_json() {
        let err = load_config(r#"{ "max_boids": "lots" }"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid flock configuration"));
    }

    #[test]
    fn test_frame_and_summary_capture() {
        let config = SimulationConfig {
            force_fixed_count: Some(50),
            ..Default::default()
        };
        let mut sim = Simulation::new(config, 3);
        sim.resize(Viewport::new(640.0, 480.0), DeviceClass::Desktop);

        let frame = FrameRecord::capture(&sim);
        assert_eq!(frame.poses.len(), 50);

        let json = serde_json::to_string(&frame).unwrap();
        let back: FrameRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.poses.len(), 50);

        let summary = RunSummary::capture(&sim);
        assert_eq!(summary.agent_count, 50);
        assert_eq!(summary.device, "desktop");
        assert_eq!(summary.max_boids, 1200);
    }
}
