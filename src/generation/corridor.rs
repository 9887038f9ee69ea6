//! Safe corridor: a winding walker path from high ground to the shelter and
//! the masks derived from its distance field.
//!
//! The walker follows three forces each step:
//! - gravity, down the smooth (trap-free) basin;
//! - a magnet toward the shelter, stronger inside the lock-on range;
//! - a noise wobble perpendicular to the magnet, weaker inside the lock-on range.
//!
//! Every cell then gets its distance to the walker's polyline, which is
//! shaped into a trap attenuation mask and, optionally, a ravine carve mask.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::GenerationConfig;
use crate::generation::basin::flat_wall_remap;
use crate::generation::noise_field::NoiseSynthesizer;
use crate::generation::{safe_denominator, LogicalGrid, LOGICAL_EXTENT};
use crate::tilemap::Tilemap;

const VEC_EPSILON: f64 = 1e-9;

/// Masks produced by one corridor run. Transient: used to shape the terrain
/// and kept only for inspection.
#[derive(Clone, Debug)]
pub struct CorridorMask {
    /// 1 = traps at full strength, 0 = traps removed
    pub trap_attenuation: Tilemap<f32>,
    /// 1 = full carve depth at the centreline, 0 = no carving
    pub ravine_carve: Option<Tilemap<f32>>,
    /// Walker centreline in logical coordinates, start to shelter
    pub polyline: Vec<(f64, f64)>,
    /// Pixel where the walker started
    pub start: (usize, usize),
}

/// Outcome of the walker simulation.
#[derive(Clone, Debug)]
pub struct WalkerPath {
    pub points: Vec<(f64, f64)>,
    /// False if the step cap was hit and the target was appended by force
    pub converged: bool,
}

/// Force weights for one walker step.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ForceWeights {
    wobble: f64,
    magnet: f64,
    gravity: f64,
}

pub struct CorridorGenerator<'a> {
    config: &'a GenerationConfig,
    wobble_noise: NoiseSynthesizer,
}

impl<'a> CorridorGenerator<'a> {
    pub fn new(config: &'a GenerationConfig, wobble_seed: u64) -> Self {
        Self {
            config,
            wobble_noise: NoiseSynthesizer::new(wobble_seed, config.corridor_wobble_octaves),
        }
    }

    /// Build the corridor masks for a map.
    ///
    /// `smooth_map` is the shelter basin plus detail noise, without traps; the
    /// start cell is drawn from it and the walker's gravity follows it.
    pub fn generate(
        &self,
        grid: &LogicalGrid,
        shelter: (f64, f64),
        smooth_map: &Tilemap<f32>,
        rng: &mut ChaCha8Rng,
    ) -> CorridorMask {
        let start = self.find_start_point(smooth_map, rng);
        let walk = self.walk(grid, grid.logical(start.0, start.1), shelter, smooth_map);
        log::debug!(
            "Corridor walker: {} points from {:?}, converged: {}",
            walk.points.len(),
            start,
            walk.converged
        );

        let distance = distance_field(grid, &walk.points);
        let (trap_attenuation, ravine_carve) = self.shape_masks(&distance);

        CorridorMask {
            trap_attenuation,
            ravine_carve,
            polyline: walk.points,
            start,
        }
    }

    /// Pick a random cell at or above the configured fraction of the map's
    /// altitude range, or the highest cell if none qualifies.
    pub fn find_start_point(&self, smooth_map: &Tilemap<f32>, rng: &mut ChaCha8Rng) -> (usize, usize) {
        let normalized = smooth_map.normalized();
        let (_, max_val) = normalized.min_max();
        let threshold = (self.config.start_altitude_threshold_percent * max_val as f64) as f32;

        let candidates: Vec<(usize, usize)> = normalized
            .iter()
            .filter(|&(_, _, &h)| h >= threshold)
            .map(|(x, y, _)| (x, y))
            .collect();

        if candidates.is_empty() {
            smooth_map.argmax()
        } else {
            candidates[rng.gen_range(0..candidates.len())]
        }
    }

    /// Simulate the walker from `start` toward `target` (logical coordinates).
    pub fn walk(
        &self,
        grid: &LogicalGrid,
        start: (f64, f64),
        target: (f64, f64),
        smooth_map: &Tilemap<f32>,
    ) -> WalkerPath {
        let step_size = self.config.corridor_step_size;
        let mut points = vec![start];
        let mut current = start;

        for _ in 0..self.config.corridor_max_steps {
            let to_target = (target.0 - current.0, target.1 - current.1);
            let distance = length(to_target);
            if distance < step_size {
                points.push(target);
                return WalkerPath { points, converged: true };
            }

            let weights = self.weights(distance);
            let magnet = normalize(to_target);
            let gravity = normalize(negate(basin_gradient(grid, smooth_map, current)));

            let wobble_freq = self.config.corridor_wobble_frequency;
            let wobble_value = self
                .wobble_noise
                .sample(current.0 * wobble_freq, current.1 * wobble_freq);
            let wobble = (magnet.1 * wobble_value, -magnet.0 * wobble_value);

            let primary = normalize((
                gravity.0 * weights.gravity + magnet.0 * weights.magnet,
                gravity.1 * weights.gravity + magnet.1 * weights.magnet,
            ));
            let combined = normalize((
                primary.0 + wobble.0 * weights.wobble,
                primary.1 + wobble.1 * weights.wobble,
            ));
            let direction = if length(combined) > VEC_EPSILON { combined } else { magnet };

            current = (
                (current.0 + direction.0 * step_size).clamp(-LOGICAL_EXTENT, LOGICAL_EXTENT),
                (current.1 + direction.1 * step_size).clamp(-LOGICAL_EXTENT, LOGICAL_EXTENT),
            );
            points.push(current);
        }

        // The last step may have landed inside the arrival radius
        if length((target.0 - current.0, target.1 - current.1)) < step_size {
            points.push(target);
            return WalkerPath { points, converged: true };
        }

        log::warn!(
            "Corridor walker reached max steps ({}) without arriving; forcing the endpoint",
            self.config.corridor_max_steps
        );
        if points.last() != Some(&target) {
            points.push(target);
        }
        WalkerPath { points, converged: false }
    }

    /// Wobble fades and the magnet strengthens as the walker closes in.
    fn weights(&self, distance_to_target: f64) -> ForceWeights {
        let falloff = (distance_to_target / safe_denominator(self.config.corridor_lockon_range)).clamp(0.0, 1.0);
        ForceWeights {
            wobble: self.config.corridor_wobble_strength * falloff,
            magnet: self.config.corridor_magnet_strength
                + self.config.corridor_lockon_strength * (1.0 - falloff),
            gravity: self.config.corridor_gravity_strength,
        }
    }

    /// Shape the distance field into the trap attenuation mask and the
    /// optional ravine carve mask.
    pub fn shape_masks(&self, distance: &Tilemap<f32>) -> (Tilemap<f32>, Option<Tilemap<f32>>) {
        let config = self.config;
        let corridor_width = safe_denominator(config.corridor_width);
        let min_strength = config.corridor_min_strength.clamp(0.0, 1.0);

        let trap_attenuation = distance.map(|&d| {
            let t = d as f64 / corridor_width;
            let curve = flat_wall_remap(t, config.corridor_flat_ratio, config.corridor_wall_sharpness);
            (min_strength + (1.0 - min_strength) * curve) as f32
        });

        let ravine_carve = config.ravine_enabled.then(|| {
            // The ravine lives inside the fully trap-free shelf
            let shelf = safe_denominator(config.corridor_width * config.corridor_flat_ratio);
            distance.map(|&d| {
                let t = d as f64 / shelf;
                if t >= 1.0 {
                    return 0.0;
                }
                let wall = flat_wall_remap(t, config.ravine_shelf_ratio, config.ravine_wall_sharpness);
                (1.0 - wall) as f32
            })
        });

        (trap_attenuation, ravine_carve)
    }
}

/// Gradient of the smooth map at the walker's pixel, in altitude per logical
/// unit. Central differences, one-sided at the borders.
fn basin_gradient(grid: &LogicalGrid, map: &Tilemap<f32>, point: (f64, f64)) -> (f64, f64) {
    let (px, py) = grid.to_pixel(point.0, point.1);
    let x_lo = px.saturating_sub(1);
    let x_hi = (px + 1).min(map.width - 1);
    let y_lo = py.saturating_sub(1);
    let y_hi = (py + 1).min(map.height - 1);

    let span_x = (x_hi - x_lo) as f64 * grid.spacing_x();
    let span_y = (y_hi - y_lo) as f64 * grid.spacing_y();

    let gx = (*map.get(x_hi, py) - *map.get(x_lo, py)) as f64 / safe_denominator(span_x);
    let gy = (*map.get(px, y_hi) - *map.get(px, y_lo)) as f64 / safe_denominator(span_y);
    (gx, gy)
}

/// Minimum distance from every cell's logical position to the polyline.
pub fn distance_field(grid: &LogicalGrid, polyline: &[(f64, f64)]) -> Tilemap<f32> {
    Tilemap::par_from_fn(grid.width, grid.height, |px, py| {
        let p = grid.logical(px, py);
        let nearest = match polyline {
            [] => f64::INFINITY,
            [only] => length((p.0 - only.0, p.1 - only.1)),
            _ => polyline
                .windows(2)
                .map(|seg| point_segment_distance(p, seg[0], seg[1]))
                .fold(f64::INFINITY, f64::min),
        };
        nearest as f32
    })
}

/// Distance from `p` to segment `a`-`b`; a degenerate segment is a point.
pub fn point_segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let seg = (b.0 - a.0, b.1 - a.1);
    let len_sq = seg.0 * seg.0 + seg.1 * seg.1;
    if len_sq < VEC_EPSILON {
        return length((p.0 - a.0, p.1 - a.1));
    }
    let t = (((p.0 - a.0) * seg.0 + (p.1 - a.1) * seg.1) / len_sq).clamp(0.0, 1.0);
    let closest = (a.0 + t * seg.0, a.1 + t * seg.1);
    length((p.0 - closest.0, p.1 - closest.1))
}

fn length(v: (f64, f64)) -> f64 {
    v.0.hypot(v.1)
}

fn negate(v: (f64, f64)) -> (f64, f64) {
    (-v.0, -v.1)
}

/// Unit vector, or zero for a vanishing input.
fn normalize(v: (f64, f64)) -> (f64, f64) {
    let len = length(v);
    if len < VEC_EPSILON {
        (0.0, 0.0)
    } else {
        (v.0 / len, v.1 / len)
    }
}
