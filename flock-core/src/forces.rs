//! Forces that don't depend on neighbors: the pointer void and ambient drift.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::agent::Agent;
use crate::config::SimulationConfig;
use crate::vector::Vector2D;

/// Last known pointer position and when it last moved.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSnapshot {
    pub position: Vector2D,
    /// Host timestamp (milliseconds) of the last movement, `None` if the
    /// pointer has never moved.
    pub last_move_ms: Option<f64>,
}

impl PointerSnapshot {
    pub fn new(x: f32, y: f32, last_move_ms: f64) -> Self {
        Self {
            position: Vector2D::new(x, y),
            last_move_ms: Some(last_move_ms),
        }
    }

    /// The pointer only repels for `window_ms` after it last moved.
    pub fn is_active(&self, now_ms: f64, window_ms: f64) -> bool {
        match self.last_move_ms {
            Some(moved) => now_ms - moved < window_ms,
            None => false,
        }
    }
}

const NEVER_MOVED: u64 = u64::MAX;

/// Lock-free pointer state shared between an input thread and the tick.
///
/// Each field is an independent atomic word, so a reader may see a position
/// and timestamp from different events. A one-frame mismatch is invisible.
#[derive(Debug)]
pub struct PointerCell {
    x: AtomicU32,
    y: AtomicU32,
    moved_at: AtomicU64,
}

impl Default for PointerCell {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerCell {
    pub fn new() -> Self {
        Self {
            x: AtomicU32::new(0f32.to_bits()),
            y: AtomicU32::new(0f32.to_bits()),
            moved_at: AtomicU64::new(NEVER_MOVED),
        }
    }

    pub fn record(&self, x: f32, y: f32, timestamp_ms: f64) {
        self.x.store(x.to_bits(), Ordering::Relaxed);
        self.y.store(y.to_bits(), Ordering::Relaxed);
        self.moved_at.store(timestamp_ms.to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PointerSnapshot {
        let moved_at = self.moved_at.load(Ordering::Relaxed);
        PointerSnapshot {
            position: Vector2D::new(
                f32::from_bits(self.x.load(Ordering::Relaxed)),
                f32::from_bits(self.y.load(Ordering::Relaxed)),
            ),
            last_move_ms: (moved_at != NEVER_MOVED).then(|| f64::from_bits(moved_at)),
        }
    }
}

/// Push away from a recently moved pointer.
///
/// Zero unless the pointer moved less than `pointer_active_window_ms` ago and
/// the agent is within `(0, pointer_radius)` of it. Inside, the push falls off
/// linearly with distance and is capped at `pointer_force_scale * max_force`.
pub fn pointer_repulsion(
    agent: &Agent,
    pointer: &PointerSnapshot,
    now_ms: f64,
    config: &SimulationConfig,
) -> Vector2D {
    if !pointer.is_active(now_ms, config.pointer_active_window_ms) {
        return Vector2D::zero();
    }

    let distance = agent.position.distance(&pointer.position);
    if !(distance > 0.0 && distance < config.pointer_radius) {
        return Vector2D::zero();
    }

    let falloff = (1.0 - distance / config.pointer_radius) * config.pointer_strength;
    let away = (agent.position - pointer.position).normalize();
    (away * (agent.max_speed * 0.5 * falloff)).limit(agent.max_force * config.pointer_force_scale)
}

/// Smooth drift field: a constant-magnitude push whose direction comes from
/// fractal Perlin noise over `(x, y, time)`.
pub struct Wander {
    noise: Fbm<Perlin>,
}

impl Wander {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: Fbm::<Perlin>::new(seed).set_octaves(4).set_persistence(0.5),
        }
    }

    /// Noise sample remapped to `[0, 1]`.
    pub fn sample(&self, position: Vector2D, time_s: f64, config: &SimulationConfig) -> f32 {
        let scale = config.noise_scale as f64;
        let raw = self.noise.get([
            position.x as f64 * scale,
            position.y as f64 * scale,
            time_s * config.noise_drift as f64,
        ]);
        ((raw * 0.5 + 0.5) as f32).clamp(0.0, 1.0)
    }

    pub fn force(&self, position: Vector2D, time_s: f64, config: &SimulationConfig) -> Vector2D {
        let angle = (self.sample(position, time_s, config) - 0.5) * config.noise_angle_span;
        Vector2D::from_angle(angle) * config.noise_force
    }
}

impl core::fmt::Debug for Wander {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Wander").finish_non_exhaustive()
    }
}
