//! Map generation
//!
//! Builds a height field in layers:
//! 1. A flat-bottomed shelter basin spanning the whole map
//! 2. Ridged detail noise
//! 3. Gaussian traps, attenuated along a safe corridor to the shelter
//! 4. An optional ravine carved down the corridor's centreline
//!
//! The sum is normalised to 0-255 with the shelter anchored at 0 and every
//! other cell kept at or above 1, which makes the shelter the unique global
//! minimum by construction.

pub mod basin;
pub mod corridor;
pub mod noise_field;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::heightfield::{HeightField, MAX_ALTITUDE};
use crate::seeds::TerrainSeeds;
use crate::tilemap::Tilemap;

use basin::{FlatBottomWell, farthest_corner_distance};
use noise_field::{NoiseSynthesizer, WarpField};

pub use corridor::{CorridorGenerator, CorridorMask};

/// The logical square spans `[-LOGICAL_EXTENT, LOGICAL_EXTENT]` on both axes.
pub const LOGICAL_EXTENT: f64 = 5.0;

/// Denominators at or below this are replaced by 1.0
const DENOMINATOR_EPSILON: f64 = 1e-9;

/// Rejection-sampling attempts for the shelter position
const SHELTER_ATTEMPTS: usize = 1000;

/// Altitude used when the generated field is flat
const FLAT_FIELD_ALTITUDE: f32 = 128.0;

/// Lowest altitude any cell other than the shelter may take
const LOW_BAND_FLOOR: f64 = 1.0;
/// Cells scaled below this are compressed into the low band
const LOW_BAND_TOP: f64 = 3.0;

pub(crate) fn safe_denominator(value: f64) -> f64 {
    if value <= DENOMINATOR_EPSILON {
        1.0
    } else {
        value
    }
}

/// Smooth Hermite step; a zero-width band becomes a hard step at `edge1`.
fn smooth_step(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 - edge0 <= DENOMINATOR_EPSILON {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Maps pixels to the resolution-independent logical square and back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogicalGrid {
    pub width: usize,
    pub height: usize,
}

impl LogicalGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Logical units between adjacent pixel centres along x.
    pub fn spacing_x(&self) -> f64 {
        axis_spacing(self.width)
    }

    pub fn spacing_y(&self) -> f64 {
        axis_spacing(self.height)
    }

    /// Logical position of a pixel (`linspace(-5, 5, n)` per axis).
    pub fn logical(&self, px: usize, py: usize) -> (f64, f64) {
        (axis_logical(px, self.width), axis_logical(py, self.height))
    }

    /// Nearest pixel to a logical position, clamped onto the map.
    pub fn to_pixel(&self, x: f64, y: f64) -> (usize, usize) {
        (axis_pixel(x, self.width), axis_pixel(y, self.height))
    }
}

fn axis_spacing(n: usize) -> f64 {
    if n > 1 {
        2.0 * LOGICAL_EXTENT / (n - 1) as f64
    } else {
        2.0 * LOGICAL_EXTENT
    }
}

fn axis_logical(p: usize, n: usize) -> f64 {
    if n > 1 {
        -LOGICAL_EXTENT + p as f64 * axis_spacing(n)
    } else {
        0.0
    }
}

fn axis_pixel(v: f64, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let p = ((v + LOGICAL_EXTENT) / axis_spacing(n)).round();
    p.clamp(0.0, (n - 1) as f64) as usize
}

/// Every intermediate layer of one generation run.
pub struct GeneratedLayers {
    pub shelter_basin: Tilemap<f32>,
    pub detail_noise: Tilemap<f32>,
    pub traps_full: Tilemap<f32>,
    pub traps_final: Tilemap<f32>,
    pub ravine: Tilemap<f32>,
    pub trap_count: usize,
}

/// Procedural map generator. The output is a pure function of the size, the
/// seeds and the config.
pub struct MapGenerator {
    config: GenerationConfig,
}

impl MapGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate a map. `None` draws a fresh master seed, which is logged so
    /// the map can be reproduced.
    pub fn generate(&self, width: usize, height: usize, seed: Option<u64>) -> (HeightField, CorridorMask) {
        let master = seed.unwrap_or_else(rand::random);
        let seeds = TerrainSeeds::from_master(master);
        let (field, mask, _) = self.generate_with_seeds(width, height, &seeds);
        (field, mask)
    }

    /// Generate a map from explicit per-layer seeds, also returning the
    /// intermediate layers.
    pub fn generate_with_seeds(
        &self,
        width: usize,
        height: usize,
        seeds: &TerrainSeeds,
    ) -> (HeightField, CorridorMask, GeneratedLayers) {
        let config = &self.config;
        let grid = LogicalGrid::new(width, height);
        log::info!("Generating {}x{} map with seed {}", grid.width, grid.height, seeds.master);
        log::debug!("{}", seeds);

        // Shelter, snapped to a pixel so the basin centre sits on a cell
        let mut shelter_rng = ChaCha8Rng::seed_from_u64(seeds.shelter);
        let shelter_logical = pick_shelter(config, &mut shelter_rng);
        let shelter_px = grid.to_pixel(shelter_logical.0, shelter_logical.1);
        let shelter_center = grid.logical(shelter_px.0, shelter_px.1);

        let warp = if config.warp_enabled {
            WarpField::generate(
                &grid,
                seeds.warp_x,
                seeds.warp_y,
                config.warp_frequency,
                config.warp_amplitude,
                config.warp_octaves,
            )
        } else {
            WarpField::identity(&grid)
        };

        // Layers 1 + 2: the smooth, trap-free map
        let well = FlatBottomWell {
            center: shelter_center,
            depth: config.shelter_depth,
            total_radius: farthest_corner_distance(shelter_center),
            flat_bottom_ratio: config.shelter_flat_bottom_ratio,
            sharpness: config.shelter_wall_sharpness,
        };
        let shelter_basin = basin::well_layer(&grid, &warp, &well);
        let detail_noise = detail_layer(&grid, &warp, config, seeds.detail_noise);
        let smooth_map = shelter_basin.zip_map(&detail_noise, |b, n| b + n);

        // Layer 3: traps at full strength, placed without knowledge of the corridor
        let mut trap_rng = ChaCha8Rng::seed_from_u64(seeds.traps);
        let traps = basin::place_traps(&grid, config, shelter_center, &mut trap_rng);
        let traps_full = basin::trap_layer(&grid, &warp, &traps);

        let mut corridor_rng = ChaCha8Rng::seed_from_u64(seeds.corridor);
        let corridor = CorridorGenerator::new(config, seeds.wobble_noise);
        let raw_mask = corridor.generate(&grid, shelter_center, &smooth_map, &mut corridor_rng);

        // Attenuation and carving fade out toward the basin rim
        let depth = safe_denominator(config.shelter_depth.abs());
        let fade = shelter_basin.map(|&b| {
            let relative = (b as f64 + depth) / depth;
            let top = config.corridor_fade_altitude;
            (1.0 - smooth_step(top - config.corridor_fade_feather.max(0.0), top, relative)) as f32
        });
        let trap_attenuation = raw_mask
            .trap_attenuation
            .zip_map(&fade, |&m, &f| 1.0 - (1.0 - m) * f);
        let ravine_carve = raw_mask
            .ravine_carve
            .as_ref()
            .map(|carve| carve.zip_map(&fade, |&c, &f| c * f));

        let traps_final = traps_full.zip_map(&trap_attenuation, |&t, &a| t * a);
        let ravine = match &ravine_carve {
            Some(carve) => carve.map(|&c| -(c as f64 * config.ravine_depth) as f32),
            None => Tilemap::new_with(grid.width, grid.height, 0.0),
        };

        let total = Tilemap::from_fn(grid.width, grid.height, |x, y| {
            *shelter_basin.get(x, y) + *traps_final.get(x, y) + *detail_noise.get(x, y) + *ravine.get(x, y)
        });
        let altitude = normalize_anchored(&total, shelter_px);

        let field = HeightField::new(altitude, shelter_px, config.start_altitude_threshold());
        log::info!(
            "Map ready: shelter at {:?}, {} traps, corridor of {} points from {:?}",
            shelter_px,
            traps.len(),
            raw_mask.polyline.len(),
            raw_mask.start
        );

        let mask = CorridorMask {
            trap_attenuation,
            ravine_carve,
            polyline: raw_mask.polyline,
            start: raw_mask.start,
        };
        let layers = GeneratedLayers {
            shelter_basin,
            detail_noise,
            traps_full,
            traps_final,
            ravine,
            trap_count: traps.len(),
        };
        (field, mask, layers)
    }
}

/// Generation entry point: default config plus optional overrides.
pub fn generate(
    width: usize,
    height: usize,
    seed: Option<u64>,
    config_overrides: Option<&Map<String, Value>>,
) -> Result<(HeightField, CorridorMask)> {
    let config = match config_overrides {
        Some(overrides) => GenerationConfig::default().with_overrides(overrides)?,
        None => GenerationConfig::default(),
    };
    Ok(MapGenerator::new(config).generate(width, height, seed))
}

/// Rejection-sample a shelter inside the border margin and away from the
/// centre (`|x| + |y| > edge_bias`).
fn pick_shelter(config: &GenerationConfig, rng: &mut ChaCha8Rng) -> (f64, f64) {
    let reach = (LOGICAL_EXTENT - config.shelter_border_margin).max(0.0);
    if reach > 0.0 {
        for _ in 0..SHELTER_ATTEMPTS {
            let x = rng.gen_range(-reach..=reach);
            let y = rng.gen_range(-reach..=reach);
            if x.abs() + y.abs() > config.shelter_edge_bias {
                return (x, y);
            }
        }
    }

    log::warn!(
        "No shelter position satisfied edge bias {} within margin {}; using a corner",
        config.shelter_edge_bias,
        config.shelter_border_margin
    );
    let sx = if rng.gen_bool(0.5) { reach } else { -reach };
    let sy = if rng.gen_bool(0.5) { reach } else { -reach };
    (sx, sy)
}

/// Ridged detail noise sampled at warped coordinates.
fn detail_layer(grid: &LogicalGrid, warp: &WarpField, config: &GenerationConfig, seed: u64) -> Tilemap<f32> {
    let noise = NoiseSynthesizer::new(seed, config.detail_noise_octaves);
    let freq = config.detail_noise_frequency;
    let amp = config.detail_noise_amplitude;
    Tilemap::par_from_fn(grid.width, grid.height, |px, py| {
        let (x, y) = warp.warped_point(grid, px, py);
        (noise.turbulence(x * freq, y * freq) * amp) as f32
    })
}

/// Affine map to 0-255 that pins the shelter cell to 0.
///
/// Every other cell is kept at or above `LOW_BAND_FLOOR`: cells that land
/// below `LOW_BAND_TOP` (including trap pits dug beneath the shelter's own
/// value) are remapped linearly into `[LOW_BAND_FLOOR, LOW_BAND_TOP]`, which
/// keeps their relief and leaves the shelter as the unique minimum. A flat
/// field becomes a constant mid value.
fn normalize_anchored(total: &Tilemap<f32>, shelter: (usize, usize)) -> Tilemap<f32> {
    let anchor = *total.get(shelter.0, shelter.1) as f64;
    let (_, max_val) = total.min_max();
    let range = max_val as f64 - anchor;

    if range < DENOMINATOR_EPSILON {
        return total.map(|_| FLAT_FIELD_ALTITUDE);
    }

    let scale = |v: f32| MAX_ALTITUDE as f64 * (v as f64 - anchor) / range;
    let lowest = total
        .iter()
        .filter(|&(x, y, _)| (x, y) != shelter)
        .map(|(_, _, &v)| scale(v))
        .fold(f64::INFINITY, f64::min);
    let band = LOW_BAND_TOP - lowest;

    Tilemap::from_fn(total.width, total.height, |x, y| {
        if (x, y) == shelter {
            return 0.0;
        }
        let scaled = scale(*total.get(x, y));
        let lifted = if scaled >= LOW_BAND_TOP {
            scaled
        } else if band > DENOMINATOR_EPSILON {
            LOW_BAND_FLOOR + (LOW_BAND_TOP - LOW_BAND_FLOOR) * (scaled - lowest) / band
        } else {
            LOW_BAND_TOP
        };
        lifted.clamp(LOW_BAND_FLOOR, MAX_ALTITUDE as f64) as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::find_path;
    use crate::config::PathfindingConfig;
    use serde_json::json;

    fn global_min(field: &HeightField) -> u8 {
        field.height_data().iter().flatten().copied().min().unwrap()
    }

    #[test]
    fn test_logical_grid_linspace() {
        let grid = LogicalGrid::new(11, 3);
        assert_eq!(grid.logical(0, 0), (-5.0, -5.0));
        assert_eq!(grid.logical(10, 2), (5.0, 5.0));
        assert_eq!(grid.logical(5, 1), (0.0, 0.0));
        assert_eq!(grid.to_pixel(0.4, -0.1), (5, 1));
        assert_eq!(grid.to_pixel(-9.0, 9.0), (0, 2));

        let single = LogicalGrid::new(1, 1);
        assert_eq!(single.logical(0, 0), (0.0, 0.0));
        assert_eq!(single.to_pixel(3.0, -3.0), (0, 0));
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let generator = MapGenerator::new(GenerationConfig::default());
        let (a, _) = generator.generate(48, 40, Some(7));
        let (b, _) = generator.generate(48, 40, Some(7));
        assert_eq!(a.altitude(), b.altitude());
        assert_eq!(a.height_data(), b.height_data());
        assert_eq!(a.shelter_coords(), b.shelter_coords());
    }

    #[test]
    fn test_different_seeds_differ() {
        let generator = MapGenerator::new(GenerationConfig::default());
        let (a, _) = generator.generate(32, 32, Some(1));
        let (b, _) = generator.generate(32, 32, Some(2));
        assert_ne!(a.altitude(), b.altitude());
    }

    #[test]
    fn test_shelter_is_global_minimum() {
        let generator = MapGenerator::new(GenerationConfig::default());
        for seed in 0..6 {
            let (field, _) = generator.generate(40, 36, Some(seed));
            let (sx, sy) = field.shelter_coords();
            assert_eq!(*field.altitude().get(sx, sy), 0.0);
            assert_eq!(field.height_data()[sy][sx], global_min(&field));
            assert!(field.altitude().iter().all(|(_, _, &h)| (0.0..=255.0).contains(&h)));
            assert!(field.is_in_global_minimum_basin(sx as i32, sy as i32));
            for (x, y, &h) in field.altitude().iter() {
                if h == 0.0 {
                    assert!(field.is_in_global_minimum_basin(x as i32, y as i32));
                }
            }
        }
    }

    #[test]
    fn test_trap_pits_stay_above_shelter() {
        // Dense, deep traps land on the basin walls and dig below the floor
        let config = GenerationConfig {
            trap_density: 0.004,
            trap_depth_min_ratio: 0.5,
            trap_depth_max_ratio: 0.9,
            ..Default::default()
        };
        let generator = MapGenerator::new(config);
        for seed in 0..3 {
            let seeds = TerrainSeeds::from_master(seed);
            let (field, _, layers) = generator.generate_with_seeds(96, 96, &seeds);
            assert!(layers.trap_count > 0);

            let shelter = field.shelter_coords();
            let zeros: Vec<(usize, usize)> = field
                .height_data()
                .iter()
                .enumerate()
                .flat_map(|(y, row)| row.iter().enumerate().filter(|&(_, &h)| h == 0).map(move |(x, _)| (x, y)))
                .collect();
            assert_eq!(zeros, vec![shelter], "seed {}", seed);
            for (x, y, &h) in field.altitude().iter() {
                if (x, y) != shelter {
                    assert!(h >= LOW_BAND_FLOOR as f32);
                }
            }
        }
    }

    #[test]
    fn test_normalization_lifts_cells_below_shelter() {
        // Shelter at (0, 0) = -10; a pit at (2, 0) reaches -14
        let total = Tilemap::from_vec(4, 2, vec![-10.0f32, -9.0, -14.0, -12.0, 5.0, 0.0, -10.0, 10.0]).unwrap();
        let altitude = normalize_anchored(&total, (0, 0));

        assert_eq!(*altitude.get(0, 0), 0.0);
        assert_eq!(*altitude.get(2, 0), LOW_BAND_FLOOR as f32);
        assert_eq!(*altitude.get(3, 1), MAX_ALTITUDE);
        // Relief inside the pit survives, ordering is preserved
        assert!(altitude.get(2, 0) < altitude.get(3, 0));
        assert!(altitude.get(3, 0) < altitude.get(2, 1));
        assert!(altitude.get(2, 1) < altitude.get(1, 0));
        assert!(altitude.iter().filter(|&(x, y, _)| (x, y) != (0, 0)).all(|(_, _, &h)| h >= 1.0));
    }

    #[test]
    fn test_shelter_respects_margin_and_bias() {
        let config = GenerationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let (x, y) = pick_shelter(&config, &mut rng);
            assert!(x.abs() <= LOGICAL_EXTENT - config.shelter_border_margin);
            assert!(y.abs() <= LOGICAL_EXTENT - config.shelter_border_margin);
            assert!(x.abs() + y.abs() > config.shelter_edge_bias);
        }
    }

    #[test]
    fn test_impossible_bias_falls_back_to_corner() {
        let config = GenerationConfig {
            shelter_edge_bias: 100.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (x, y) = pick_shelter(&config, &mut rng);
        assert_eq!(x.abs(), 4.0);
        assert_eq!(y.abs(), 4.0);
    }

    #[test]
    fn test_tiny_and_flat_maps_never_fail() {
        let generator = MapGenerator::new(GenerationConfig::default());
        for &(w, h) in &[(1, 1), (2, 2), (1, 7), (3, 2)] {
            let (field, mask) = generator.generate(w, h, Some(11));
            assert_eq!((field.width(), field.height()), (w, h));
            assert_eq!((mask.trap_attenuation.width, mask.trap_attenuation.height), (w, h));
            assert!(field.altitude().iter().all(|(_, _, h)| h.is_finite()));
        }

        let flat = GenerationConfig {
            shelter_depth: 0.0,
            detail_noise_amplitude: 0.0,
            trap_density: 0.0,
            ravine_enabled: false,
            ..Default::default()
        };
        let (field, _) = MapGenerator::new(flat).generate(16, 16, Some(4));
        assert!(field.altitude().iter().all(|(_, _, &h)| h == FLAT_FIELD_ALTITUDE));
    }

    #[test]
    fn test_masks_stay_in_unit_range() {
        let generator = MapGenerator::new(GenerationConfig::default());
        let (_, mask) = generator.generate(40, 40, Some(5));
        assert!(mask.trap_attenuation.iter().all(|(_, _, &v)| (0.0..=1.0).contains(&v)));
        let carve = mask.ravine_carve.expect("ravine enabled by default");
        assert!(carve.iter().all(|(_, _, &v)| (0.0..=1.0).contains(&v)));
        assert!(mask.polyline.len() >= 2);
    }

    #[test]
    fn test_traps_suppressed_on_low_corridor() {
        let config = GenerationConfig {
            trap_density: 0.01,
            ..Default::default()
        };
        let generator = MapGenerator::new(config.clone());
        let seeds = TerrainSeeds::from_master(21);
        let (_, mask, layers) = generator.generate_with_seeds(48, 48, &seeds);
        let base = (48.0 * 48.0 * config.trap_density).floor() as usize;
        assert!(layers.trap_count > 0 && layers.trap_count <= base + 2);

        for (x, y, &a) in mask.trap_attenuation.iter() {
            let relative = (*layers.shelter_basin.get(x, y) as f64 + config.shelter_depth) / config.shelter_depth;
            if a == 0.0 {
                assert_eq!(*layers.traps_final.get(x, y), 0.0);
            }
            if relative > config.corridor_fade_altitude {
                // Above the fade band the corridor is invisible
                assert_eq!(a, 1.0);
                assert_eq!(*layers.traps_final.get(x, y), *layers.traps_full.get(x, y));
            }
        }
    }

    #[test]
    fn test_overrides_entry_point() {
        let overrides = json!({ "TRAP_DENSITY": 0.0, "ravine_enabled": false });
        let (field, mask) = generate(24, 24, Some(3), overrides.as_object()).unwrap();
        assert!(mask.ravine_carve.is_none());
        assert_eq!(field.width(), 24);

        let bad = json!({ "no_such_key": true });
        assert!(generate(24, 24, Some(3), bad.as_object()).is_err());
    }

    #[test]
    fn test_example_scenario_64() {
        let config = GenerationConfig::default();
        let (field, _) = generate(64, 64, Some(42), None).unwrap();
        let (sx, sy) = field.shelter_coords();
        assert!(sx < 64 && sy < 64);
        assert_eq!(
            field.start_altitude_threshold(),
            (config.start_altitude_threshold_percent * 255.0).round() as f32
        );

        let costs = PathfindingConfig::default();
        let path = find_path(&field, (0, 0), (sx, sy), &costs);
        assert!(path.is_valid());
        let manhattan = (sx + sy) as f64;
        assert!(path.total_cost < costs.flat_move_cost * manhattan * 3.0);
    }
}
