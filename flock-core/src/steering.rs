//! Reynolds steering: alignment, cohesion and separation.
//!
//! Each rule follows `steer = desired - velocity`, where `desired` points the
//! way the rule wants at the agent's own `max_speed`, then caps the result.
//! The returned forces are pre-scale; [`flock`] applies the strengths.

use crate::agent::Agent;
use crate::config::SimulationConfig;
use crate::vector::Vector2D;

/// Radii and strengths for one steering pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringParams {
    pub align_radius: f32,
    pub cohesion_radius: f32,
    pub separation_radius: f32,
    pub align_strength: f32,
    pub cohesion_strength: f32,
    pub separation_strength: f32,
    /// Separation may exceed `max_force` by this factor.
    pub separation_force_scale: f32,
}

impl From<&SimulationConfig> for SteeringParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            align_radius: config.perception_radius,
            cohesion_radius: config.cohesion_radius,
            separation_radius: config.separation_radius,
            align_strength: config.align_strength,
            cohesion_strength: config.cohesion_strength,
            separation_strength: config.separation_strength,
            separation_force_scale: config.separation_force_scale,
        }
    }
}

impl SteeringParams {
    pub fn max_radius(&self) -> f32 {
        self.align_radius
            .max(self.cohesion_radius)
            .max(self.separation_radius)
    }
}

/// Steer toward the average heading of neighbors within `radius`.
pub fn alignment<'a, I>(agent: &Agent, others: I, radius: f32) -> Vector2D
where
    I: Iterator<Item = &'a Agent>,
{
    let mut sum = Vector2D::zero();
    let mut count = 0;

    for other in others {
        if agent.position.distance(&other.position) < radius {
            sum += other.velocity;
            count += 1;
        }
    }

    if count == 0 {
        return Vector2D::zero();
    }

    let desired = (sum / count as f32).with_magnitude(agent.max_speed);
    (desired - agent.velocity).limit(agent.max_force)
}

/// Steer toward the centroid of neighbors within `radius`.
pub fn cohesion<'a, I>(agent: &Agent, others: I, radius: f32) -> Vector2D
where
    I: Iterator<Item = &'a Agent>,
{
    let mut sum = Vector2D::zero();
    let mut count = 0;

    for other in others {
        if agent.position.distance(&other.position) < radius {
            sum += other.position;
            count += 1;
        }
    }

    if count == 0 {
        return Vector2D::zero();
    }

    seek(agent, sum / count as f32)
}

/// Desired velocity toward `target` at full speed, minus current velocity.
pub fn seek(agent: &Agent, target: Vector2D) -> Vector2D {
    let desired = (target - agent.position).with_magnitude(agent.max_speed);
    (desired - agent.velocity).limit(agent.max_force)
}

/// Steer away from neighbors strictly within `radius`, closer ones pushing
/// harder (each contribution is the unit offset divided by distance).
///
/// Coincident agents (distance 0) are skipped. The result is capped at
/// `force_scale * max_force`.
pub fn separation<'a, I>(agent: &Agent, others: I, radius: f32, force_scale: f32) -> Vector2D
where
    I: Iterator<Item = &'a Agent>,
{
    let mut sum = Vector2D::zero();
    let mut count = 0;

    for other in others {
        let distance = agent.position.distance(&other.position);
        if distance > 0.0 && distance < radius {
            sum += (agent.position - other.position).normalize() / distance;
            count += 1;
        }
    }

    if count == 0 {
        return Vector2D::zero();
    }

    let desired = (sum / count as f32).with_magnitude(agent.max_speed);
    (desired - agent.velocity).limit(agent.max_force * force_scale)
}

/// Net flocking force on `agents[index]` from the given neighbor indices:
/// the three rules, each scaled by its strength, summed.
pub fn flock(agents: &[Agent], index: usize, neighbors: &[usize], params: &SteeringParams) -> Vector2D {
    let agent = &agents[index];

    let align = alignment(agent, neighbors.iter().map(|&j| &agents[j]), params.align_radius)
        * params.align_strength;
    let coh = cohesion(agent, neighbors.iter().map(|&j| &agents[j]), params.cohesion_radius)
        * params.cohesion_strength;
    let sep = separation(
        agent,
        neighbors.iter().map(|&j| &agents[j]),
        params.separation_radius,
        params.separation_force_scale,
    ) * params.separation_strength;

    align + coh + sep
}
