//! Population sizing: how many agents a viewport gets, and keeping the live
//! collection at that size.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::config::SimulationConfig;

/// Viewport size in world units (CSS pixels for the browser host).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    #[default]
    Desktop,
}

/// Form-factor signals the host can supply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceHints {
    pub user_agent: String,
}

impl DeviceHints {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    /// Coarse form-factor signal: a handheld user-agent token.
    pub fn has_mobile_token(&self) -> bool {
        const TOKENS: [&str; 6] = ["mobi", "android", "iphone", "ipad", "ipod", "windows phone"];
        let ua = self.user_agent.to_ascii_lowercase();
        TOKENS.iter().any(|token| ua.contains(token))
    }
}

/// Mobile iff the user agent looks handheld AND the viewport is narrow.
///
/// Tablets with a wide viewport stay on the desktop budget. Heuristic only.
pub fn classify_device(viewport_width: f32, hints: &DeviceHints, config: &SimulationConfig) -> DeviceClass {
    if hints.has_mobile_token() && viewport_width < config.narrow_viewport_width {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}

/// The two device-responsive settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceBounds {
    pub max_boids: usize,
    pub boid_size: f32,
}

impl DeviceBounds {
    /// The bounds given directly by the config, before any device adjustment.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            max_boids: config.max_boids.max(config.min_boids),
            boid_size: config.boid_size,
        }
    }
}

/// Lower budget and smaller agents for phones.
///
/// The per-device values are capped by the global `max_boids` / `boid_size`,
/// and `max_boids` never drops below `min_boids`.
pub fn adjust_bounds_for_device(class: DeviceClass, config: &SimulationConfig) -> DeviceBounds {
    let (max_boids, boid_size) = match class {
        DeviceClass::Mobile => (config.mobile_max_boids, config.mobile_boid_size),
        DeviceClass::Desktop => (config.desktop_max_boids, config.desktop_boid_size),
    };
    DeviceBounds {
        max_boids: max_boids.min(config.max_boids).max(config.min_boids),
        boid_size: boid_size.min(config.boid_size),
    }
}

/// Target agent count for a viewport.
///
/// A fixed-count override wins (still clamped); otherwise one agent per
/// `area_per_boid` of viewport, with the area floored at `min_viewport_area`.
/// Always within `[min_boids, bounds.max_boids]`.
pub fn compute_target_count(
    viewport: Viewport,
    bounds: &DeviceBounds,
    config: &SimulationConfig,
) -> usize {
    let max = bounds.max_boids.max(config.min_boids);
    if let Some(fixed) = config.force_fixed_count.filter(|&n| n > 0) {
        return fixed.clamp(config.min_boids, max);
    }

    let area = viewport.area().max(config.min_viewport_area);
    let n = libm::roundf(area / config.area_per_boid);
    let n = if n.is_finite() && n > 0.0 { n as usize } else { 0 };
    n.clamp(config.min_boids, max)
}

/// Grows or shrinks `agents` to `target`.
///
/// New agents appear at random positions in the viewport; surplus agents are
/// dropped from the front of the collection (oldest first). Returns the
/// signed change in population.
pub fn reconcile<R: Rng + ?Sized>(
    agents: &mut Vec<Agent>,
    target: usize,
    rng: &mut R,
    viewport: Viewport,
    bounds: &DeviceBounds,
    config: &SimulationConfig,
) -> isize {
    let current = agents.len();
    if target > current {
        agents.reserve(target - current);
        for _ in current..target {
            agents.push(Agent::random(
                rng,
                viewport.width,
                viewport.height,
                config,
                bounds.boid_size,
            ));
        }
    } else if target < current {
        agents.drain(..current - target);
    }

    if target != current {
        log::debug!("population {} -> {}", current, target);
    }
    target as isize - current as isize
}
