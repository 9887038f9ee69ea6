//! Radial wells: the map-spanning shelter basin and the trap sinks.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::GenerationConfig;
use crate::generation::noise_field::WarpField;
use crate::generation::{safe_denominator, LogicalGrid, LOGICAL_EXTENT};
use crate::tilemap::Tilemap;

/// Placement attempts per trap before it is dropped
const TRAP_PLACEMENT_ATTEMPTS: usize = 64;

/// `1 - (1 - t)^sharpness` with `t` clipped to [0, 1] first, so the base of
/// the fractional power is never negative.
pub fn wall_profile(t: f64, sharpness: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powf(sharpness)
}

/// Remap a normalised distance through a flat interior and a curved wall.
///
/// 0 for `t <= flat_ratio`, rising along `wall_profile` to 1 at `t >= 1`.
pub fn flat_wall_remap(t: f64, flat_ratio: f64, sharpness: f64) -> f64 {
    let wall = safe_denominator(1.0 - flat_ratio);
    wall_profile((t - flat_ratio) / wall, sharpness)
}

/// Flat-bottomed well: `-depth` inside the flat radius, rising smoothly to 0
/// at `total_radius`.
#[derive(Clone, Debug)]
pub struct FlatBottomWell {
    pub center: (f64, f64),
    pub depth: f64,
    pub total_radius: f64,
    pub flat_bottom_ratio: f64,
    pub sharpness: f64,
}

impl FlatBottomWell {
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        let distance = (x - self.center.0).hypot(y - self.center.1);
        let t = distance / safe_denominator(self.total_radius);
        let strength = flat_wall_remap(t, self.flat_bottom_ratio, self.sharpness);
        -self.depth * (1.0 - strength)
    }
}

/// A Gaussian trap sink.
#[derive(Clone, Debug, PartialEq)]
pub struct Trap {
    pub center: (f64, f64),
    pub depth: f64,
    pub width: f64,
}

impl Trap {
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.center.0;
        let dy = y - self.center.1;
        let width = safe_denominator(self.width);
        -self.depth * (-(dx * dx + dy * dy) / (width * width)).exp()
    }
}

/// Distance from `center` to the farthest corner of the logical square.
pub fn farthest_corner_distance(center: (f64, f64)) -> f64 {
    [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)]
        .iter()
        .map(|&(sx, sy): &(f64, f64)| (sx * LOGICAL_EXTENT - center.0).hypot(sy * LOGICAL_EXTENT - center.1))
        .fold(0.0, f64::max)
}

/// Sample a well over the warped grid.
pub fn well_layer(grid: &LogicalGrid, warp: &WarpField, well: &FlatBottomWell) -> Tilemap<f32> {
    Tilemap::par_from_fn(grid.width, grid.height, |px, py| {
        let (x, y) = warp.warped_point(grid, px, py);
        well.value_at(x, y) as f32
    })
}

/// Randomly place traps, keeping clear of the shelter.
///
/// Count is `max(1, base + {-1..=2})` with `base = floor(area * density)`;
/// a non-positive density disables traps.
pub fn place_traps(
    grid: &LogicalGrid,
    config: &GenerationConfig,
    shelter: (f64, f64),
    rng: &mut ChaCha8Rng,
) -> Vec<Trap> {
    if config.trap_density <= 0.0 {
        return Vec::new();
    }

    let area = (grid.width * grid.height) as f64;
    let base = (area * config.trap_density).floor() as i64;
    let count = rng.gen_range(base - 1..=base + 2).max(1) as usize;

    let depth_lo = config.shelter_depth * config.trap_depth_min_ratio;
    let depth_hi = config.shelter_depth * config.trap_depth_max_ratio;
    let width_lo = config.trap_width_min;
    let width_hi = config.trap_width_max;

    let mut traps = Vec::with_capacity(count);
    for _ in 0..count {
        let center = (0..TRAP_PLACEMENT_ATTEMPTS).find_map(|_| {
            let x = rng.gen_range(-LOGICAL_EXTENT..=LOGICAL_EXTENT);
            let y = rng.gen_range(-LOGICAL_EXTENT..=LOGICAL_EXTENT);
            let clear = (x - shelter.0).hypot(y - shelter.1) >= config.trap_shelter_clearance;
            clear.then_some((x, y))
        });
        let Some(center) = center else {
            continue;
        };

        traps.push(Trap {
            center,
            depth: uniform(rng, depth_lo, depth_hi),
            width: uniform(rng, width_lo, width_hi),
        });
    }
    traps
}

/// Uniform draw that tolerates reversed or empty ranges.
fn uniform(rng: &mut ChaCha8Rng, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi - lo <= f64::EPSILON {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}

/// Sum of all trap sinks over the warped grid.
pub fn trap_layer(grid: &LogicalGrid, warp: &WarpField, traps: &[Trap]) -> Tilemap<f32> {
    Tilemap::par_from_fn(grid.width, grid.height, |px, py| {
        let (x, y) = warp.warped_point(grid, px, py);
        traps.iter().map(|trap| trap.value_at(x, y)).sum::<f64>() as f32
    })
}
