//! Flocking engine for an ambient background: Reynolds alignment / cohesion /
//! separation plus a transient pointer void and a noise-driven drift.
//!
//! The host owns the frame loop, the pointer and the canvas. Each frame it
//! calls [`Simulation::step`] with a [`FrameInput`] and then
//! [`Simulation::render`] with its own [`Renderer`].

pub mod agent;
pub mod config;
pub mod forces;
pub mod neighbor;
pub mod population;
pub mod render;
pub mod simulation;
pub mod steering;
pub mod vector;

pub use agent::{Agent, AgentParams};
pub use config::{Appearance, Background, ConfigFix, NeighborStrategy, RenderStyle, SimulationConfig};
pub use forces::{pointer_repulsion, PointerCell, PointerSnapshot, Wander};
pub use neighbor::{GridQuery, NaiveQuery, NeighborQuery};
pub use population::{
    adjust_bounds_for_device, classify_device, compute_target_count, reconcile, DeviceBounds,
    DeviceClass, DeviceHints, Viewport,
};
pub use render::{AgentPose, PoseCollector, Renderer};
pub use simulation::{FrameInput, Simulation, SimulationState};
pub use steering::SteeringParams;
pub use vector::Vector2D;
