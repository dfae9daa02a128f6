use rand::Rng;

use crate::config::SimulationConfig;
use crate::vector::Vector2D;

/// Per-agent randomized parameters, drawn once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentParams {
    pub max_speed: f32,
    pub max_force: f32,
    pub size: f32,
    pub hue: f32,
    /// Magnitude of the initial velocity. May exceed `max_speed`; the first
    /// integration clamps it.
    pub initial_speed: f32,
}

impl AgentParams {
    /// Draws the jittered caps and visual attributes from `rng`.
    ///
    /// `base_size` is the device-dependent boid size in effect when the agent
    /// is created.
    pub fn derive<R: Rng + ?Sized>(rng: &mut R, config: &SimulationConfig, base_size: f32) -> Self {
        let initial_speed =
            config.max_speed * (1.0 - config.speed_variety + rng.gen::<f32>() * config.speed_variety * 2.0);
        let max_speed = config.max_speed
            * (1.0 - config.max_speed_jitter + rng.gen::<f32>() * config.max_speed_jitter * 2.0);
        let max_force = config.max_force
            * (1.0 - config.max_force_jitter + rng.gen::<f32>() * config.max_force_jitter * 2.0);
        let jitter = 1.0 + (rng.gen::<f32>() - 0.5) * config.size_jitter * 2.0;
        let size = base_size
            * (1.0 - config.size_variety + rng.gen::<f32>() * config.size_variety * 2.0)
            * jitter;
        let hue = config.appearance.hue + (rng.gen::<f32>() * 2.0 - 1.0) * config.hue_jitter;

        Self {
            max_speed,
            max_force,
            size,
            hue,
            initial_speed: if initial_speed > 0.0 { initial_speed } else { 1.0 },
        }
    }
}

/// A single boid.
#[derive(Debug, Clone)]
pub struct Agent {
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub acceleration: Vector2D,
    pub max_speed: f32,
    pub max_force: f32,
    pub size: f32,
    pub hue: f32,
}

impl Agent {
    pub fn new(position: Vector2D, velocity: Vector2D, params: AgentParams) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector2D::zero(),
            max_speed: params.max_speed,
            max_force: params.max_force,
            size: params.size,
            hue: params.hue,
        }
    }

    /// An agent at a uniformly random point of a `width` x `height` viewport,
    /// heading in a random direction.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        width: f32,
        height: f32,
        config: &SimulationConfig,
        base_size: f32,
    ) -> Self {
        let position = Vector2D::new(random_coordinate(rng, width), random_coordinate(rng, height));
        let heading = Vector2D::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        let params = AgentParams::derive(rng, config, base_size);
        // A zero heading would never pick up speed from `with_magnitude`.
        let heading = if heading.magnitude_squared() > 0.0 {
            heading
        } else {
            Vector2D::new(1.0, 0.0)
        };
        Self::new(position, heading.with_magnitude(params.initial_speed), params)
    }

    pub fn apply_force(&mut self, force: Vector2D) {
        self.acceleration += force;
    }

    /// Adds `net_force` and advances one step of `dt` nominal frames.
    ///
    /// After this call `|velocity| <= max_speed` and the accumulator is zero.
    pub fn integrate(&mut self, net_force: Vector2D, dt: f32) {
        self.apply_force(net_force);
        self.velocity += self.acceleration * dt;
        self.velocity = self.velocity.limit(self.max_speed);
        self.position += self.velocity * dt;
        self.acceleration = Vector2D::zero();
    }

    /// Toroidal wrap: a coordinate past one edge is reset to the opposite edge.
    ///
    /// Afterwards `x` is in `[0, width)` and `y` in `[0, height)`. A degenerate
    /// viewport axis pins the coordinate to 0.
    pub fn wrap_edges(&mut self, width: f32, height: f32) {
        self.position.x = wrap_axis(self.position.x, width);
        self.position.y = wrap_axis(self.position.y, height);
    }

    /// Direction of travel, for the renderer.
    pub fn heading(&self) -> f32 {
        self.velocity.heading()
    }

    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }
}

fn random_coordinate<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent > 0.0 {
        wrap_axis(rng.gen_range(0.0..extent), extent)
    } else {
        0.0
    }
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    if !(extent > 0.0) || !value.is_finite() {
        return 0.0;
    }
    if value >= extent {
        0.0
    } else if value < 0.0 {
        largest_below(extent)
    } else {
        value
    }
}

/// The largest `f32` strictly below a positive finite `value`.
fn largest_below(value: f32) -> f32 {
    f32::from_bits(value.to_bits() - 1)
}
