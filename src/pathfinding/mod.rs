//! Lowest-cost routes across a height field.

pub mod astar;
pub mod cost;

use crate::config::PathfindingConfig;
use crate::heightfield::HeightField;

pub use cost::PathCostModel;

/// Ordered cells from start to end inclusive, with the summed move cost.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub nodes: Vec<(usize, usize)>,
    pub total_cost: f64,
}

impl Path {
    /// The "no route" result: no nodes, infinite cost.
    pub fn invalid() -> Self {
        Self {
            nodes: Vec::new(),
            total_cost: f64::INFINITY,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.nodes.is_empty() && self.total_cost.is_finite()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Find the cheapest path between two cells. Endpoints off the map give an
/// invalid path; this never fails.
pub fn find_path(
    field: &HeightField,
    start: (usize, usize),
    end: (usize, usize),
    config: &PathfindingConfig,
) -> Path {
    let on_map = |(x, y): (usize, usize)| x < field.width() && y < field.height();
    if !on_map(start) || !on_map(end) {
        log::debug!("Path endpoints {:?} -> {:?} outside the map", start, end);
        return Path::invalid();
    }

    let model = PathCostModel::new(field, config);
    astar::search(&model, start, end)
}
