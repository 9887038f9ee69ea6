//! Seeded coherent noise and coordinate warping shared by the generation
//! layers.

use noise::{NoiseFn, Perlin};

use crate::generation::LogicalGrid;
use crate::seeds::noise_seed;
use crate::tilemap::Tilemap;

/// Amplitude decay per octave
const PERSISTENCE: f64 = 0.5;
/// Frequency multiplier per octave
const LACUNARITY: f64 = 2.0;

/// Multi-octave Perlin noise. Same seed, octaves and sample point always
/// give the same value.
pub struct NoiseSynthesizer {
    noise: Perlin,
    octaves: u32,
}

impl NoiseSynthesizer {
    pub fn new(seed: u64, octaves: u32) -> Self {
        Self {
            noise: Perlin::new(noise_seed(seed)),
            octaves,
        }
    }

    /// Fractal Brownian motion, normalised to roughly [-1, 1].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        fbm(&self.noise, x, y, self.octaves, PERSISTENCE, LACUNARITY)
    }

    /// Absolute-value noise; ridged, non-negative.
    pub fn turbulence(&self, x: f64, y: f64) -> f64 {
        self.sample(x, y).abs()
    }
}

fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    if max_value > 0.0 {
        total / max_value
    } else {
        0.0
    }
}

/// Per-cell displacement added to logical coordinates before any radial
/// distance is measured. The two axes come from independently seeded noise.
pub struct WarpField {
    pub dx: Tilemap<f32>,
    pub dy: Tilemap<f32>,
}

impl WarpField {
    pub fn generate(
        grid: &LogicalGrid,
        seed_x: u64,
        seed_y: u64,
        frequency: f64,
        amplitude: f64,
        octaves: u32,
    ) -> Self {
        let noise_x = NoiseSynthesizer::new(seed_x, octaves);
        let noise_y = NoiseSynthesizer::new(seed_y, octaves);

        let displacement = |noise: &NoiseSynthesizer| {
            Tilemap::par_from_fn(grid.width, grid.height, |px, py| {
                let (x, y) = grid.logical(px, py);
                (noise.sample(x * frequency, y * frequency) * amplitude) as f32
            })
        };

        Self {
            dx: displacement(&noise_x),
            dy: displacement(&noise_y),
        }
    }

    /// A warp that leaves coordinates untouched.
    pub fn identity(grid: &LogicalGrid) -> Self {
        Self {
            dx: Tilemap::new_with(grid.width, grid.height, 0.0),
            dy: Tilemap::new_with(grid.width, grid.height, 0.0),
        }
    }

    /// Warped logical position of a pixel.
    pub fn warped_point(&self, grid: &LogicalGrid, px: usize, py: usize) -> (f64, f64) {
        let (x, y) = grid.logical(px, py);
        (x + *self.dx.get(px, py) as f64, y + *self.dy.get(px, py) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_values() {
        let a = NoiseSynthesizer::new(77, 4);
        let b = NoiseSynthesizer::new(77, 4);
        for i in 0..20 {
            let (x, y) = (i as f64 * 0.173, i as f64 * -0.311);
            assert_eq!(a.sample(x, y), b.sample(x, y));
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = NoiseSynthesizer::new(1, 3);
        let b = NoiseSynthesizer::new(2, 3);
        let differs = (0..20).any(|i| {
            let (x, y) = (i as f64 * 0.37 + 0.1, i as f64 * 0.23 + 0.2);
            a.sample(x, y) != b.sample(x, y)
        });
        assert!(differs);
    }

    #[test]
    fn test_turbulence_non_negative_and_zero_octaves() {
        let n = NoiseSynthesizer::new(5, 3);
        for i in 0..50 {
            assert!(n.turbulence(i as f64 * 0.13, i as f64 * 0.07) >= 0.0);
        }
        let silent = NoiseSynthesizer::new(5, 0);
        assert_eq!(silent.sample(0.3, 0.7), 0.0);
    }

    #[test]
    fn test_warp_is_deterministic_and_bounded() {
        let grid = LogicalGrid::new(16, 12);
        let a = WarpField::generate(&grid, 10, 11, 0.3, 0.4, 2);
        let b = WarpField::generate(&grid, 10, 11, 0.3, 0.4, 2);
        assert_eq!(a.dx, b.dx);
        assert_eq!(a.dy, b.dy);
        assert!(a.dx.iter().all(|(_, _, &d)| d.is_finite() && d.abs() <= 0.6));

        let identity = WarpField::identity(&grid);
        assert_eq!(identity.warped_point(&grid, 3, 4), grid.logical(3, 4));
    }
}
