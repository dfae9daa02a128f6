//! Neighbor enumeration.
//!
//! Both implementations return the same set of indices for the same query, and
//! both return them in ascending index order, so steering sums are accumulated
//! in the same order whichever query is active.

use crate::agent::Agent;
use crate::config::NeighborStrategy;

/// A pluggable neighbor query that can be swapped without touching steering.
pub trait NeighborQuery: Send {
    /// Rebuild internal structures from the tick's snapshot of agents.
    fn rebuild(&mut self, agents: &[Agent]);

    /// Push into `out` the indices of agents strictly within `radius` of
    /// `agents[index]`, excluding `index` itself, in ascending order.
    fn neighbors(&self, agents: &[Agent], index: usize, radius: f32, out: &mut Vec<usize>);

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;
}

#[inline]
fn within(agents: &[Agent], index: usize, other: usize, radius: f32) -> bool {
    other != index && agents[index].position.distance(&agents[other].position) < radius
}

/// Exhaustive pairwise check: O(n) per query, O(n^2) per tick.
#[derive(Debug, Default)]
pub struct NaiveQuery;

impl NeighborQuery for NaiveQuery {
    fn rebuild(&mut self, _agents: &[Agent]) {
        // Nothing to rebuild for a pairwise scan.
    }

    fn neighbors(&self, agents: &[Agent], index: usize, radius: f32, out: &mut Vec<usize>) {
        out.extend((0..agents.len()).filter(|&j| within(agents, index, j, radius)));
    }

    fn name(&self) -> &'static str {
        "naive"
    }
}

/// Caps the grid so a huge, sparse snapshot (e.g. right after a resize) can't
/// allocate millions of cells.
const MAX_CELLS_PER_AXIS: usize = 512;

/// Uniform bucket grid over the bounding box of the snapshot.
#[derive(Debug)]
pub struct GridQuery {
    requested_cell_size: f32,
    cell_size: f32,
    origin_x: f32,
    origin_y: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl GridQuery {
    /// `cell_size` should be on the order of the largest query radius; a query
    /// with a larger radius searches more rings of cells.
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        Self {
            requested_cell_size: cell_size,
            cell_size,
            origin_x: 0.0,
            origin_y: 0.0,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    #[inline]
    fn cell_coords(&self, agent: &Agent) -> (usize, usize) {
        let cx = ((agent.position.x - self.origin_x) / self.cell_size) as usize;
        let cy = ((agent.position.y - self.origin_y) / self.cell_size) as usize;
        (cx.min(self.cols - 1), cy.min(self.rows - 1))
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
}

impl NeighborQuery for GridQuery {
    fn rebuild(&mut self, agents: &[Agent]) {
        for cell in &mut self.cells {
            cell.clear();
        }
        if agents.is_empty() {
            self.cols = 0;
            self.rows = 0;
            return;
        }

        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for agent in agents {
            min_x = min_x.min(agent.position.x);
            min_y = min_y.min(agent.position.y);
            max_x = max_x.max(agent.position.x);
            max_y = max_y.max(agent.position.y);
        }

        let span = (max_x - min_x).max(max_y - min_y);
        self.cell_size = self
            .requested_cell_size
            .max(span / (MAX_CELLS_PER_AXIS - 1) as f32);
        self.origin_x = min_x;
        self.origin_y = min_y;
        self.cols = ((max_x - min_x) / self.cell_size) as usize + 1;
        self.rows = ((max_y - min_y) / self.cell_size) as usize + 1;

        let needed = self.cols * self.rows;
        if self.cells.len() < needed {
            self.cells.resize_with(needed, Vec::new);
        }

        for (i, agent) in agents.iter().enumerate() {
            let (cx, cy) = self.cell_coords(agent);
            self.cells[cy * self.cols + cx].push(i);
        }
    }

    fn neighbors(&self, agents: &[Agent], index: usize, radius: f32, out: &mut Vec<usize>) {
        if self.cols == 0 || !(radius > 0.0) {
            return;
        }
        let start = out.len();
        let (cx, cy) = self.cell_coords(&agents[index]);
        let reach = libm::ceilf(radius / self.cell_size) as usize;

        let x_lo = cx.saturating_sub(reach);
        let x_hi = (cx + reach).min(self.cols - 1);
        let y_lo = cy.saturating_sub(reach);
        let y_hi = (cy + reach).min(self.rows - 1);

        for y in y_lo..=y_hi {
            let row = y * self.cols;
            for x in x_lo..=x_hi {
                out.extend(
                    self.cells[row + x]
                        .iter()
                        .copied()
                        .filter(|&j| within(agents, index, j, radius)),
                );
            }
        }

        out[start..].sort_unstable();
    }

    fn name(&self) -> &'static str {
        "grid"
    }
}

/// Resolves the configured strategy for the current population.
pub fn resolve_strategy(
    strategy: NeighborStrategy,
    population: usize,
    grid_threshold: usize,
) -> NeighborStrategy {
    match strategy {
        NeighborStrategy::Auto if population >= grid_threshold => NeighborStrategy::Grid,
        NeighborStrategy::Auto => NeighborStrategy::Naive,
        other => other,
    }
}

/// Builds a query for a resolved strategy (`Auto` is treated as naive).
pub fn build_query(strategy: NeighborStrategy, cell_size: f32) -> Box<dyn NeighborQuery> {
    match strategy {
        NeighborStrategy::Grid => Box::new(GridQuery::new(cell_size)),
        NeighborStrategy::Naive | NeighborStrategy::Auto => Box::new(NaiveQuery),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentParams;
    use crate::vector::Vector2D;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn agent_at(x: f32, y: f32) -> Agent {
        Agent::new(
            Vector2D::new(x, y),
            Vector2D::zero(),
            AgentParams {
                max_speed: 3.0,
                max_force: 0.2,
                size: 3.0,
                hue: 210.0,
                initial_speed: 3.0,
            },
        )
    }

    fn query_all(query: &mut dyn NeighborQuery, agents: &[Agent], radius: f32) -> Vec<Vec<usize>> {
        query.rebuild(agents);
        (0..agents.len())
            .map(|i| {
                let mut out = Vec::new();
                query.neighbors(agents, i, radius, &mut out);
                out
            })
            .collect()
    }

    #[test]
    fn test_naive_excludes_self_and_far_agents() {
        let agents = vec![agent_at(0.0, 0.0), agent_at(10.0, 0.0), agent_at(100.0, 0.0)];
        let mut out = Vec::new();
        NaiveQuery.neighbors(&agents, 0, 50.0, &mut out);
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn test_radius_is_strict() {
        let agents = vec![agent_at(0.0, 0.0), agent_at(30.0, 0.0)];
        let mut out = Vec::new();
        NaiveQuery.neighbors(&agents, 0, 30.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_coincident_agents_are_neighbors() {
        let agents = vec![agent_at(5.0, 5.0), agent_at(5.0, 5.0)];
        let mut grid = GridQuery::new(50.0);
        let result = query_all(&mut grid, &agents, 50.0);
        assert_eq!(result, vec![vec![1], vec![0]]);
    }

    #[test]
    fn test_grid_matches_naive() {
        let mut rng = StdRng::seed_from_u64(42);
        let agents: Vec<Agent> = (0..600)
            .map(|_| agent_at(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..700.0)))
            .collect();

        for radius in [10.0, 30.0, 50.0, 120.0] {
            let naive = query_all(&mut NaiveQuery, &agents, radius);
            let grid = query_all(&mut GridQuery::new(50.0), &agents, radius);
            assert_eq!(naive, grid, "radius {}", radius);
        }
    }

    #[test]
    fn test_grid_handles_out_of_bounds_snapshot() {
        let agents = vec![agent_at(-20.0, 5.0), agent_at(-5.0, 5.0), agent_at(5000.0, 9000.0)];
        let naive = query_all(&mut NaiveQuery, &agents, 30.0);
        let mut grid = GridQuery::new(30.0);
        assert_eq!(naive, query_all(&mut grid, &agents, 30.0));
        let (cols, rows) = grid.dimensions();
        assert!(cols <= MAX_CELLS_PER_AXIS && rows <= MAX_CELLS_PER_AXIS);
    }

    #[test]
    fn test_grid_empty_snapshot() {
        let mut grid = GridQuery::new(30.0);
        grid.rebuild(&[]);
        assert_eq!(grid.dimensions(), (0, 0));
    }

    #[test]
    fn test_resolve_strategy() {
        assert_eq!(resolve_strategy(NeighborStrategy::Auto, 100, 300), NeighborStrategy::Naive);
        assert_eq!(resolve_strategy(NeighborStrategy::Auto, 300, 300), NeighborStrategy::Grid);
        assert_eq!(resolve_strategy(NeighborStrategy::Naive, 5000, 300), NeighborStrategy::Naive);
        assert_eq!(build_query(NeighborStrategy::Grid, 50.0).name(), "grid");
    }
}
