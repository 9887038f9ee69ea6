//! A* over the 8-connected grid.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::cost::PathCostModel;
use super::Path;
use crate::tilemap::{Tilemap, NEIGHBOR_OFFSETS_8};

#[derive(Clone, Copy, PartialEq)]
struct Node {
    pos: (usize, usize),
    g: f64,
    f: f64,
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f
        other.f.total_cmp(&self.f)
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lowest-cost path from `start` to `end`. Both must be on the map.
///
/// Stale heap entries are skipped on pop rather than removed on update.
pub fn search(model: &PathCostModel, start: (usize, usize), end: (usize, usize)) -> Path {
    let altitude = model.field().altitude();
    let (width, height) = (altitude.width, altitude.height);

    let mut g_score: Tilemap<f64> = Tilemap::new_with(width, height, f64::INFINITY);
    let mut came_from: Tilemap<Option<(usize, usize)>> = Tilemap::new_with(width, height, None);
    let mut open = BinaryHeap::new();
    let mut expanded = 0usize;

    g_score.set(start.0, start.1, 0.0);
    open.push(Node {
        pos: start,
        g: 0.0,
        f: model.heuristic(start, end),
    });

    while let Some(current) = open.pop() {
        if current.g > *g_score.get(current.pos.0, current.pos.1) {
            continue;
        }

        if current.pos == end {
            let mut nodes = vec![end];
            let mut pos = end;
            while let Some(prev) = *came_from.get(pos.0, pos.1) {
                nodes.push(prev);
                pos = prev;
            }
            nodes.reverse();
            log::debug!(
                "Path {:?} -> {:?}: {} nodes, cost {:.2}, {} expanded",
                start,
                end,
                nodes.len(),
                current.g,
                expanded
            );
            return Path {
                nodes,
                total_cost: current.g,
            };
        }
        expanded += 1;

        for &(dx, dy) in NEIGHBOR_OFFSETS_8.iter() {
            let Some(neighbor) = altitude.cell(current.pos.0 as i32 + dx, current.pos.1 as i32 + dy) else {
                continue;
            };

            let tentative_g = current.g + model.move_cost(current.pos, neighbor);
            if tentative_g < *g_score.get(neighbor.0, neighbor.1) {
                came_from.set(neighbor.0, neighbor.1, Some(current.pos));
                g_score.set(neighbor.0, neighbor.1, tentative_g);
                open.push(Node {
                    pos: neighbor,
                    g: tentative_g,
                    f: tentative_g + model.heuristic(neighbor, end),
                });
            }
        }
    }

    log::debug!("No path {:?} -> {:?} after {} expansions", start, end, expanded);
    Path::invalid()
}
