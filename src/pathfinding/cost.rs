//! Traversal cost over a height field.

use crate::config::PathfindingConfig;
use crate::heightfield::HeightField;

/// Edge costs and the A* heuristic for one height field.
///
/// A move costs its horizontal length times the flat cost. Uphill moves add
/// `(slope * climb_multiplier)^2`; downhill moves add nothing.
#[derive(Clone, Copy)]
pub struct PathCostModel<'a> {
    field: &'a HeightField,
    flat_move_cost: f64,
    climb_cost_multiplier: f64,
}

impl<'a> PathCostModel<'a> {
    pub fn new(field: &'a HeightField, config: &PathfindingConfig) -> Self {
        Self {
            field,
            flat_move_cost: config.flat_move_cost,
            climb_cost_multiplier: config.climb_cost_multiplier,
        }
    }

    pub fn field(&self) -> &'a HeightField {
        self.field
    }

    /// Cost of stepping from `a` to the neighbouring cell `b`.
    pub fn move_cost(&self, a: (usize, usize), b: (usize, usize)) -> f64 {
        let distance = euclidean(a, b);
        let mut cost = distance * self.flat_move_cost;

        let ha = self.height(a);
        let hb = self.height(b);
        if hb > ha && distance > 0.0 {
            let slope = (hb - ha) / distance;
            let penalty = slope * self.climb_cost_multiplier;
            cost += penalty * penalty;
        }
        cost
    }

    /// Straight-line distance at flat cost; never more than the true cost.
    pub fn heuristic(&self, node: (usize, usize), end: (usize, usize)) -> f64 {
        euclidean(node, end) * self.flat_move_cost
    }

    fn height(&self, (x, y): (usize, usize)) -> f64 {
        self.field.get_height(x as i32, y as i32) as f64
    }
}

pub fn euclidean(a: (usize, usize), b: (usize, usize)) -> f64 {
    let dx = a.0 as f64 - b.0 as f64;
    let dy = a.1 as f64 - b.1 as f64;
    dx.hypot(dy)
}
