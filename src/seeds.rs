//! Seed management for map generation
//!
//! Provides separate seeds for each generation layer so that every random
//! stream and noise field of a map is derived from one master seed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeds for all map generation layers.
///
/// Each layer gets its own seed, derived from the master seed, so changing
/// one layer's stream never shifts another's.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Shelter placement
    pub shelter: u64,
    /// Trap count, positions, depths and widths
    pub traps: u64,
    /// Corridor start-point choice
    pub corridor: u64,
    /// Detail (turbulence) noise layer
    pub detail_noise: u64,
    /// Coordinate warp, x displacement
    pub warp_x: u64,
    /// Coordinate warp, y displacement
    pub warp_y: u64,
    /// Lateral wobble of the corridor walker
    pub wobble_noise: u64,
}

impl TerrainSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            shelter: derive_seed(master, "shelter"),
            traps: derive_seed(master, "traps"),
            corridor: derive_seed(master, "corridor"),
            detail_noise: derive_seed(master, "detail_noise"),
            warp_x: derive_seed(master, "warp_x"),
            warp_y: derive_seed(master, "warp_y"),
            wobble_noise: derive_seed(master, "wobble_noise"),
        }
    }
}

/// Derive a sub-seed from a master seed and a layer name.
fn derive_seed(master: u64, layer: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    layer.hash(&mut hasher);
    hasher.finish()
}

/// Fold a 64-bit seed into the 32-bit seed space used by noise functions.
pub fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

impl std::fmt::Display for TerrainSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TerrainSeeds {{ master: {}, shelter: {}, traps: {}, corridor: {}, \
             detail_noise: {}, warp_x: {}, warp_y: {}, wobble_noise: {} }}",
            self.master,
            self.shelter,
            self.traps,
            self.corridor,
            self.detail_noise,
            self.warp_x,
            self.warp_y,
            self.wobble_noise,
        )
    }
}
