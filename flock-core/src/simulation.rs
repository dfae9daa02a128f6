//! The tick loop.
//!
//! A tick is read-all-then-write-all: every agent's net force is computed
//! against the snapshot taken at tick start, and only then are agents
//! integrated and wrapped. No agent ever sees another's same-tick update.
//!
//! Reproducibility: with the same seed, config, viewport sequence and pointer
//! trajectory two runs produce bit-identical trajectories. That relies on a
//! fixed summation order; both neighbor queries yield ascending indices for
//! this reason. A query that returned neighbors in another order would give
//! results equal only up to floating-point rounding, which is allowed.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::Agent;
use crate::config::{NeighborStrategy, SimulationConfig};
use crate::forces::{pointer_repulsion, PointerSnapshot, Wander};
use crate::neighbor::{build_query, resolve_strategy, NeighborQuery};
use crate::population::{
    adjust_bounds_for_device, classify_device, compute_target_count, reconcile, DeviceBounds,
    DeviceClass, DeviceHints, Viewport,
};
use crate::render::{AgentPose, Renderer};
use crate::steering::{flock, SteeringParams};
use crate::vector::Vector2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// No agents yet; waiting for the first viewport.
    Uninitialized,
    Running,
}

/// What the host hands the simulation each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub viewport: Viewport,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Seconds since the simulation started; drives the drift field.
    pub elapsed: f64,
    /// Host clock in milliseconds, same clock as pointer timestamps.
    pub now_ms: f64,
    pub pointer: PointerSnapshot,
}

impl FrameInput {
    /// A frame exactly one nominal tick after the previous one.
    pub fn nominal(viewport: Viewport, tick: u64, frame_rate: f32) -> Self {
        let elapsed = tick as f64 / frame_rate as f64;
        Self {
            viewport,
            dt: 1.0 / frame_rate,
            elapsed,
            now_ms: elapsed * 1000.0,
            pointer: PointerSnapshot::default(),
        }
    }
}

pub struct Simulation {
    config: SimulationConfig,
    steering: SteeringParams,
    bounds: DeviceBounds,
    device: DeviceClass,
    viewport: Viewport,
    agents: Vec<Agent>,
    forces: Vec<Vector2D>,
    neighbors: Vec<usize>,
    query: Box<dyn NeighborQuery>,
    strategy: NeighborStrategy,
    wander: Wander,
    rng: StdRng,
    state: SimulationState,
    tick: u64,
    elapsed: f64,
}

impl Simulation {
    /// Sanitizes `config` and prepares an empty simulation. `seed` drives
    /// every random draw (positions, headings, per-agent jitter).
    pub fn new(mut config: SimulationConfig, seed: u64) -> Self {
        config.sanitize();
        let steering = SteeringParams::from(&config);
        let bounds = DeviceBounds::from_config(&config);
        Self {
            wander: Wander::new(config.noise_seed),
            query: build_query(NeighborStrategy::Naive, steering.max_radius()),
            strategy: NeighborStrategy::Naive,
            steering,
            bounds,
            device: DeviceClass::Desktop,
            viewport: Viewport::default(),
            agents: Vec::new(),
            forces: Vec::new(),
            neighbors: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            state: SimulationState::Uninitialized,
            tick: 0,
            elapsed: 0.0,
            config,
        }
    }

    /// Applies a viewport / device change and reconciles the population.
    ///
    /// The first call with a non-empty viewport seeds the initial agents and
    /// moves the simulation to `Running`; until then the viewport is only
    /// recorded. Must not overlap a `step`; between two steps is fine.
    /// Returns the new population size.
    pub fn resize(&mut self, viewport: Viewport, device: DeviceClass) -> usize {
        self.device = device;
        self.bounds = adjust_bounds_for_device(device, &self.config);
        self.viewport = viewport;

        if self.state == SimulationState::Uninitialized && !has_area(viewport) {
            log::debug!(
                "deferring flock start: empty viewport {}x{}",
                viewport.width,
                viewport.height
            );
            return 0;
        }

        let target = compute_target_count(viewport, &self.bounds, &self.config);
        reconcile(
            &mut self.agents,
            target,
            &mut self.rng,
            viewport,
            &self.bounds,
            &self.config,
        );

        if self.state == SimulationState::Uninitialized {
            self.state = SimulationState::Running;
            log::info!(
                "flock started: {} agents, {:?}, max_boids {}, {}x{}",
                self.agents.len(),
                device,
                self.bounds.max_boids,
                viewport.width,
                viewport.height
            );
        }
        self.agents.len()
    }

    /// Classifies the device from host hints, then [`resize`](Self::resize)s.
    pub fn resize_with_hints(&mut self, viewport: Viewport, hints: &DeviceHints) -> usize {
        let device = classify_device(viewport.width, hints, &self.config);
        self.resize(viewport, device)
    }

    /// Replaces the live agents, e.g. to start a test from fixed positions.
    ///
    /// The count is taken as given, outside `[min_boids, max_boids]` if need
    /// be; the next `resize` reconciles it back into bounds.
    pub fn set_agents(&mut self, agents: Vec<Agent>) {
        self.agents = agents;
        self.state = SimulationState::Running;
    }

    /// Advances every agent by one tick.
    ///
    /// A step before any non-empty viewport is known does nothing.
    pub fn step(&mut self, frame: &FrameInput) {
        if self.state == SimulationState::Uninitialized {
            self.resize(frame.viewport, self.device);
            if self.state == SimulationState::Uninitialized {
                return;
            }
        }
        self.viewport = frame.viewport;
        self.elapsed = frame.elapsed;
        let dt = self.frame_scale(frame.dt);

        self.select_query();
        self.query.rebuild(&self.agents);

        // Read phase: every force sees the tick-start snapshot.
        self.forces.clear();
        for i in 0..self.agents.len() {
            self.neighbors.clear();
            self.query.neighbors(
                &self.agents,
                i,
                self.steering.max_radius(),
                &mut self.neighbors,
            );

            let agent = &self.agents[i];
            let force = flock(&self.agents, i, &self.neighbors, &self.steering)
                + pointer_repulsion(agent, &frame.pointer, frame.now_ms, &self.config)
                + self.wander.force(agent.position, frame.elapsed, &self.config);
            self.forces.push(force);
        }

        // Write phase.
        let (width, height) = (self.viewport.width, self.viewport.height);
        for (agent, force) in self.agents.iter_mut().zip(self.forces.iter()) {
            agent.integrate(*force, dt);
            agent.wrap_edges(width, height);
        }

        self.tick += 1;
    }

    /// Converts a host delta in seconds to nominal frames, capped so a long
    /// pause doesn't teleport the flock.
    fn frame_scale(&self, dt: f32) -> f32 {
        if !dt.is_finite() {
            return 1.0;
        }
        (dt * self.config.frame_rate).clamp(0.0, self.config.max_frame_skip)
    }

    fn select_query(&mut self) {
        let wanted = resolve_strategy(
            self.config.neighbor_strategy,
            self.agents.len(),
            self.config.grid_threshold,
        );
        if wanted != self.strategy {
            log::debug!(
                "neighbor query {:?} -> {:?} at {} agents",
                self.strategy,
                wanted,
                self.agents.len()
            );
            self.query = build_query(wanted, self.steering.max_radius());
            self.strategy = wanted;
        }
    }

    /// Hands every agent's pose to `renderer`.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        let appearance = &self.config.appearance;
        renderer.begin_frame(appearance);
        for agent in &self.agents {
            renderer.draw_agent(&AgentPose::from(agent), appearance);
        }
        renderer.end_frame();
    }

    pub fn poses(&self) -> impl Iterator<Item = AgentPose> + '_ {
        self.agents.iter().map(AgentPose::from)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn bounds(&self) -> DeviceBounds {
        self.bounds
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn neighbor_query(&self) -> &'static str {
        self.query.name()
    }
}

fn has_area(viewport: Viewport) -> bool {
    viewport.width > 0.0 && viewport.height > 0.0
}

impl core::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("state", &self.state)
            .field("tick", &self.tick)
            .field("agents", &self.agents.len())
            .field("device", &self.device)
            .field("viewport", &self.viewport)
            .field("query", &self.query.name())
            .finish()
    }
}
