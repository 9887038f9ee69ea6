//! Generation, pathfinding and tool parameters.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only
//! needs to name the values it changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TerrainError};

/// Parameters for map generation. Distances and depths are in logical units
/// (the map spans `[-5, 5]` on both axes); ratios are fractions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    // =========================================================================
    // Shelter basin
    // =========================================================================
    /// Depth of the map-spanning shelter well
    pub shelter_depth: f64,
    /// Fraction of the shelter radius that forms the flat bottom
    pub shelter_flat_bottom_ratio: f64,
    /// Exponent of the wall curve (higher = steeper near the rim)
    pub shelter_wall_sharpness: f64,
    /// Minimum logical distance between the shelter and the map border
    pub shelter_border_margin: f64,
    /// Shelter must satisfy |x| + |y| > this (keeps it away from the centre)
    pub shelter_edge_bias: f64,

    // =========================================================================
    // Traps
    // =========================================================================
    /// Traps per pixel of map area
    pub trap_density: f64,
    /// Trap depth range, as fractions of the shelter depth
    pub trap_depth_min_ratio: f64,
    pub trap_depth_max_ratio: f64,
    /// Trap width range (Gaussian sigma-like radius)
    pub trap_width_min: f64,
    pub trap_width_max: f64,
    /// Traps are never centred closer than this to the shelter
    pub trap_shelter_clearance: f64,

    // =========================================================================
    // Coordinate warp
    // =========================================================================
    pub warp_enabled: bool,
    pub warp_frequency: f64,
    pub warp_amplitude: f64,
    pub warp_octaves: u32,

    // =========================================================================
    // Detail noise
    // =========================================================================
    pub detail_noise_frequency: f64,
    pub detail_noise_amplitude: f64,
    pub detail_noise_octaves: u32,

    // =========================================================================
    // Corridor walker
    // =========================================================================
    pub corridor_max_steps: usize,
    pub corridor_step_size: f64,
    pub corridor_gravity_strength: f64,
    pub corridor_magnet_strength: f64,
    /// Below this distance to the shelter the magnet grows and the wobble fades
    pub corridor_lockon_range: f64,
    pub corridor_lockon_strength: f64,
    pub corridor_wobble_strength: f64,
    pub corridor_wobble_frequency: f64,
    pub corridor_wobble_octaves: u32,

    // =========================================================================
    // Corridor mask
    // =========================================================================
    /// Half-width of the trap-attenuating corridor
    pub corridor_width: f64,
    /// Fraction of the corridor width where traps are fully suppressed
    pub corridor_flat_ratio: f64,
    pub corridor_wall_sharpness: f64,
    /// Attenuation floor at the centreline (0 = traps removed entirely)
    pub corridor_min_strength: f64,
    /// Attenuation and carving fade out above this relative basin elevation
    pub corridor_fade_altitude: f64,
    /// Width of the smoothstep band below `corridor_fade_altitude`
    pub corridor_fade_feather: f64,

    // =========================================================================
    // Ravine
    // =========================================================================
    pub ravine_enabled: bool,
    pub ravine_depth: f64,
    /// Fraction of the trap-free shelf forming the flat ravine floor
    pub ravine_shelf_ratio: f64,
    pub ravine_wall_sharpness: f64,

    // =========================================================================
    // Start altitude
    // =========================================================================
    /// Minimum altitude (fraction of the 0-255 range) of a valid start cell
    pub start_altitude_threshold_percent: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            shelter_depth: 10.0,
            shelter_flat_bottom_ratio: 0.12,
            shelter_wall_sharpness: 2.0,
            shelter_border_margin: 1.0,
            shelter_edge_bias: 3.0,

            trap_density: 0.0008,
            trap_depth_min_ratio: 0.25,
            trap_depth_max_ratio: 0.5,
            trap_width_min: 0.3,
            trap_width_max: 0.8,
            trap_shelter_clearance: 1.5,

            warp_enabled: true,
            warp_frequency: 0.3,
            warp_amplitude: 0.4,
            warp_octaves: 2,

            detail_noise_frequency: 0.4,
            detail_noise_amplitude: 0.6,
            detail_noise_octaves: 4,

            corridor_max_steps: 400,
            corridor_step_size: 0.1,
            corridor_gravity_strength: 0.5,
            corridor_magnet_strength: 1.0,
            corridor_lockon_range: 3.0,
            corridor_lockon_strength: 2.0,
            corridor_wobble_strength: 0.8,
            corridor_wobble_frequency: 0.6,
            corridor_wobble_octaves: 2,

            corridor_width: 0.8,
            corridor_flat_ratio: 0.5,
            corridor_wall_sharpness: 2.0,
            corridor_min_strength: 0.0,
            corridor_fade_altitude: 0.75,
            corridor_fade_feather: 0.15,

            ravine_enabled: true,
            ravine_depth: 0.8,
            ravine_shelf_ratio: 0.3,
            ravine_wall_sharpness: 2.0,

            start_altitude_threshold_percent: 0.6,
        }
    }
}

impl GenerationConfig {
    /// Apply string-keyed overrides on top of this config.
    ///
    /// Keys may be `snake_case` or `UPPER_SNAKE_CASE`. Unknown keys and values
    /// of the wrong type are rejected.
    pub fn with_overrides(&self, overrides: &Map<String, Value>) -> Result<Self> {
        let mut base = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(TerrainError::Config("config did not serialize to an object".into())),
        };

        for (key, value) in overrides {
            let field = if key.chars().all(|c| !c.is_ascii_lowercase()) {
                key.to_ascii_lowercase()
            } else {
                key.clone()
            };
            if !base.contains_key(&field) {
                return Err(TerrainError::Config(format!("unknown generation setting '{}'", key)));
            }
            base.insert(field, value.clone());
        }

        serde_json::from_value(Value::Object(base))
            .map_err(|e| TerrainError::Config(format!("invalid generation override: {}", e)))
    }

    /// Absolute start threshold on the 0-255 altitude scale.
    pub fn start_altitude_threshold(&self) -> f32 {
        (self.start_altitude_threshold_percent.clamp(0.0, 1.0) * 255.0).round() as f32
    }
}

/// Cost model parameters for the path search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingConfig {
    /// Cost per unit of horizontal distance
    pub flat_move_cost: f64,
    /// Scales the slope before squaring it into the climb penalty
    pub climb_cost_multiplier: f64,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            flat_move_cost: 1.0,
            climb_cost_multiplier: 0.1,
        }
    }
}

/// Terrain tool parameters. Heights are on the 0-255 altitude scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Radius of the affected disc, in cells
    pub radius: u32,
    pub excavator_depth: f32,
    pub filler_height: f32,
    /// Fraction of the distance to the local mean removed per application
    pub grader_intensity: f32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            radius: 5,
            excavator_depth: 30.0,
            filler_height: 30.0,
            grader_intensity: 0.5,
        }
    }
}

/// Charges available to the player per map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCharges {
    pub excavator: u32,
    pub filler: u32,
    pub grader: u32,
}

impl Default for ToolCharges {
    fn default() -> Self {
        Self {
            excavator: 3,
            filler: 3,
            grader: 3,
        }
    }
}

/// Top-level configuration for the game front-ends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub map_width: usize,
    pub map_height: usize,
    /// Directory where map snapshots are written
    pub saves_path: PathBuf,
    pub generation: GenerationConfig,
    pub pathfinding: PathfindingConfig,
    pub tool: ToolConfig,
    pub tool_charges: ToolCharges,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_width: 256,
            map_height: 256,
            saves_path: PathBuf::from("data/terrain_saves"),
            generation: GenerationConfig::default(),
            pathfinding: PathfindingConfig::default(),
            tool: ToolConfig::default(),
            tool_charges: ToolCharges::default(),
        }
    }
}

impl GameConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Default snapshot location inside `saves_path`.
    pub fn default_save_file(&self) -> PathBuf {
        self.saves_path.join("terrain_map.json")
    }
}
