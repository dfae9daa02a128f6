use crate::agent::Agent;
use crate::config::Appearance;
use crate::vector::Vector2D;

/// Everything a renderer needs to draw one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentPose {
    pub position: Vector2D,
    /// Direction of travel in radians, `atan2(vy, vx)`.
    pub heading: f32,
    pub size: f32,
    pub hue: f32,
}

impl From<&Agent> for AgentPose {
    fn from(agent: &Agent) -> Self {
        Self {
            position: agent.position,
            heading: agent.heading(),
            size: agent.size,
            hue: agent.hue,
        }
    }
}

/// The drawing side of the host. The simulation doesn't care how (or whether)
/// poses become pixels.
pub trait Renderer {
    /// Called once per frame before any agent, e.g. to clear or fade.
    fn begin_frame(&mut self, _appearance: &Appearance) {}

    fn draw_agent(&mut self, pose: &AgentPose, appearance: &Appearance);

    fn end_frame(&mut self) {}
}

/// Collects poses into a buffer; handy for hosts that draw elsewhere.
#[derive(Debug, Default, Clone)]
pub struct PoseCollector {
    pub poses: Vec<AgentPose>,
}

impl Renderer for PoseCollector {
    fn begin_frame(&mut self, _appearance: &Appearance) {
        self.poses.clear();
    }

    fn draw_agent(&mut self, pose: &AgentPose, _appearance: &Appearance) {
        self.poses.push(*pose);
    }
}
