//! Process-wide simulation configuration.
//!
//! Every field has a default, so a JSON document only needs to name the keys it
//! overrides. Invalid combinations are repaired by [`SimulationConfig::sanitize`]
//! rather than rejected: this is a background visual and it should always run.

use core::fmt;

use serde::{Deserialize, Serialize};

/// How the renderer collaborator should draw each agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RenderStyle {
    Dot {
        size_multiplier: f32,
    },
    Polygon {
        sides: u32,
        fill: bool,
        stroke_weight: f32,
    },
    Triangle,
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle::Dot {
            size_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Background {
    /// Clear to transparent each frame, or fade previous frames when trails are on.
    Transparent { trails: bool, trail_alpha: f32 },
    /// Fill with an RGBA colour each frame.
    Solid { color: [f32; 4] },
}

impl Default for Background {
    fn default() -> Self {
        Background::Transparent {
            trails: false,
            trail_alpha: 0.04,
        }
    }
}

/// Global appearance handed to the renderer alongside every pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub alpha: f32,
    pub style: RenderStyle,
    pub background: Background,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            hue: 210.0,
            saturation: 85.0,
            brightness: 80.0,
            alpha: 0.95,
            style: RenderStyle::default(),
            background: Background::default(),
        }
    }
}

/// Which neighbor query backs the steering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NeighborStrategy {
    Naive,
    Grid,
    /// Naive below `grid_threshold` agents, grid at or above it.
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub appearance: Appearance,

    // Population
    pub area_per_boid: f32,
    pub min_boids: usize,
    pub max_boids: usize,
    pub force_fixed_count: Option<usize>,
    pub min_viewport_area: f32,
    pub desktop_max_boids: usize,
    pub mobile_max_boids: usize,
    pub desktop_boid_size: f32,
    pub mobile_boid_size: f32,
    pub narrow_viewport_width: f32,

    // Flocking
    pub perception_radius: f32,
    pub cohesion_radius: f32,
    pub separation_radius: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub align_strength: f32,
    pub cohesion_strength: f32,
    pub separation_strength: f32,
    pub separation_force_scale: f32,

    // Per-agent variety
    pub boid_size: f32,
    pub size_jitter: f32,
    pub size_variety: f32,
    pub speed_variety: f32,
    pub hue_jitter: f32,
    pub max_speed_jitter: f32,
    pub max_force_jitter: f32,

    // Ambient drift
    pub noise_drift: f32,
    pub noise_scale: f32,
    pub noise_angle_span: f32,
    pub noise_force: f32,
    pub noise_seed: u32,

    // Pointer void
    pub pointer_radius: f32,
    pub pointer_strength: f32,
    pub pointer_active_window_ms: f64,
    pub pointer_force_scale: f32,

    // Loop
    pub frame_rate: f32,
    pub max_frame_skip: f32,
    pub neighbor_strategy: NeighborStrategy,
    pub grid_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            appearance: Appearance::default(),

            area_per_boid: 500.0,
            min_boids: 40,
            max_boids: 1200,
            force_fixed_count: None,
            min_viewport_area: 40_000.0,
            desktop_max_boids: 1200,
            mobile_max_boids: 300,
            desktop_boid_size: 3.0,
            mobile_boid_size: 2.0,
            narrow_viewport_width: 900.0,

            perception_radius: 50.0,
            cohesion_radius: 50.0,
            separation_radius: 30.0,
            max_speed: 3.0,
            max_force: 0.2,
            align_strength: 1.0,
            cohesion_strength: 0.8,
            separation_strength: 1.5,
            separation_force_scale: 1.6,

            boid_size: 3.0,
            size_jitter: 0.1,
            size_variety: 0.25,
            speed_variety: 0.25,
            hue_jitter: 8.0,
            max_speed_jitter: 0.1,
            max_force_jitter: 0.2,

            noise_drift: 0.12,
            noise_scale: 0.0012,
            noise_angle_span: core::f32::consts::PI * 1.6,
            noise_force: 0.002,
            noise_seed: 0,

            pointer_radius: 500.0,
            pointer_strength: 10.0,
            pointer_active_window_ms: 60.0,
            pointer_force_scale: 6.0,

            frame_rate: 50.0,
            max_frame_skip: 3.0,
            neighbor_strategy: NeighborStrategy::Auto,
            grid_threshold: 300,
        }
    }
}

/// A correction applied by [`SimulationConfig::sanitize`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigFix {
    /// `max_boids` was below `min_boids` and was raised to it.
    MaxBoidsRaised { from: usize, to: usize },
    /// A field that must be non-negative was negative or not finite.
    NegativeClamped { field: &'static str, from: f32 },
    /// A field that must be strictly positive was reset to its default.
    NonPositiveReset { field: &'static str, from: f32, to: f32 },
    /// A field was pulled into its valid range.
    OutOfRange { field: &'static str, from: f32, to: f32 },
}

impl fmt::Display for ConfigFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFix::MaxBoidsRaised { from, to } => {
                write!(f, "max_boids {} is below min_boids, raised to {}", from, to)
            }
            ConfigFix::NegativeClamped { field, from } => {
                write!(f, "{} must be non-negative (was {}), clamped to 0", field, from)
            }
            ConfigFix::NonPositiveReset { field, from, to } => {
                write!(f, "{} must be positive (was {}), reset to {}", field, from, to)
            }
            ConfigFix::OutOfRange { field, from, to } => {
                write!(f, "{} out of range (was {}), set to {}", field, from, to)
            }
        }
    }
}

fn non_negative(field: &'static str, value: &mut f32, fixes: &mut Vec<ConfigFix>) {
    if !(*value >= 0.0) || !value.is_finite() {
        fixes.push(ConfigFix::NegativeClamped {
            field,
            from: *value,
        });
        *value = 0.0;
    }
}

fn positive(field: &'static str, value: &mut f32, default: f32, fixes: &mut Vec<ConfigFix>) {
    if !(*value > 0.0) || !value.is_finite() {
        fixes.push(ConfigFix::NonPositiveReset {
            field,
            from: *value,
            to: default,
        });
        *value = default;
    }
}

fn within(field: &'static str, value: &mut f32, lo: f32, hi: f32, fixes: &mut Vec<ConfigFix>) {
    let clamped = if value.is_nan() { lo } else { value.clamp(lo, hi) };
    if clamped != *value {
        fixes.push(ConfigFix::OutOfRange {
            field,
            from: *value,
            to: clamped,
        });
        *value = clamped;
    }
}

impl SimulationConfig {
    /// Repairs invalid values in place and reports what was changed.
    ///
    /// Never fails: after this call every radius and strength is non-negative,
    /// every cap and rate is positive, and `min_boids <= max_boids` for both the
    /// live cap and the per-device caps.
    pub fn sanitize(&mut self) -> Vec<ConfigFix> {
        let defaults = SimulationConfig::default();
        let mut fixes = Vec::new();

        non_negative("perception_radius", &mut self.perception_radius, &mut fixes);
        non_negative("cohesion_radius", &mut self.cohesion_radius, &mut fixes);
        non_negative("separation_radius", &mut self.separation_radius, &mut fixes);
        non_negative("pointer_radius", &mut self.pointer_radius, &mut fixes);
        non_negative("align_strength", &mut self.align_strength, &mut fixes);
        non_negative("cohesion_strength", &mut self.cohesion_strength, &mut fixes);
        non_negative("separation_strength", &mut self.separation_strength, &mut fixes);
        non_negative("pointer_strength", &mut self.pointer_strength, &mut fixes);
        non_negative("noise_force", &mut self.noise_force, &mut fixes);
        non_negative("noise_drift", &mut self.noise_drift, &mut fixes);
        non_negative("noise_scale", &mut self.noise_scale, &mut fixes);
        non_negative("hue_jitter", &mut self.hue_jitter, &mut fixes);
        non_negative("min_viewport_area", &mut self.min_viewport_area, &mut fixes);

        positive("max_speed", &mut self.max_speed, defaults.max_speed, &mut fixes);
        positive("max_force", &mut self.max_force, defaults.max_force, &mut fixes);
        positive(
            "separation_force_scale",
            &mut self.separation_force_scale,
            defaults.separation_force_scale,
            &mut fixes,
        );
        positive(
            "pointer_force_scale",
            &mut self.pointer_force_scale,
            defaults.pointer_force_scale,
            &mut fixes,
        );
        positive("area_per_boid", &mut self.area_per_boid, defaults.area_per_boid, &mut fixes);
        positive("frame_rate", &mut self.frame_rate, defaults.frame_rate, &mut fixes);
        positive("max_frame_skip", &mut self.max_frame_skip, defaults.max_frame_skip, &mut fixes);
        positive("boid_size", &mut self.boid_size, defaults.boid_size, &mut fixes);
        positive(
            "desktop_boid_size",
            &mut self.desktop_boid_size,
            defaults.desktop_boid_size,
            &mut fixes,
        );
        positive(
            "mobile_boid_size",
            &mut self.mobile_boid_size,
            defaults.mobile_boid_size,
            &mut fixes,
        );

        // Jitter factors must keep per-agent caps strictly positive.
        within("speed_variety", &mut self.speed_variety, 0.0, 0.99, &mut fixes);
        within("size_variety", &mut self.size_variety, 0.0, 0.99, &mut fixes);
        within("size_jitter", &mut self.size_jitter, 0.0, 0.99, &mut fixes);
        within("max_speed_jitter", &mut self.max_speed_jitter, 0.0, 0.99, &mut fixes);
        within("max_force_jitter", &mut self.max_force_jitter, 0.0, 0.99, &mut fixes);

        if !(self.pointer_active_window_ms >= 0.0) {
            fixes.push(ConfigFix::NegativeClamped {
                field: "pointer_active_window_ms",
                from: self.pointer_active_window_ms as f32,
            });
            self.pointer_active_window_ms = 0.0;
        }

        if let RenderStyle::Polygon { sides, .. } = &mut self.appearance.style {
            if *sides < 3 {
                fixes.push(ConfigFix::OutOfRange {
                    field: "appearance.style.sides",
                    from: *sides as f32,
                    to: 3.0,
                });
                *sides = 3;
            }
        }

        for (field, cap) in [
            ("max_boids", &mut self.max_boids),
            ("desktop_max_boids", &mut self.desktop_max_boids),
            ("mobile_max_boids", &mut self.mobile_max_boids),
        ] {
            if *cap < self.min_boids {
                log::debug!("{} raised to min_boids", field);
                fixes.push(ConfigFix::MaxBoidsRaised {
                    from: *cap,
                    to: self.min_boids,
                });
                *cap = self.min_boids;
            }
        }

        for fix in &fixes {
            log::warn!("config: {}", fix);
        }
        fixes
    }
}
