//! Map snapshot save/load.
//!
//! A snapshot is a single JSON document holding the quantized height data,
//! the shelter location and the start threshold. Gradients are never stored;
//! they are rebuilt on load.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::heightfield::HeightField;
use crate::tilemap::Tilemap;

/// On-disk shape of a map snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Row-major, `height` rows of `width` values
    pub height_data: Vec<Vec<u8>>,
    pub width: usize,
    pub height: usize,
    /// `[x, y]`
    pub shelter_coords: [usize; 2],
    pub start_altitude_threshold: u8,
}

impl MapSnapshot {
    pub fn from_field(field: &HeightField) -> Self {
        let (sx, sy) = field.shelter_coords();
        Self {
            height_data: field.height_data(),
            width: field.width(),
            height: field.height(),
            shelter_coords: [sx, sy],
            start_altitude_threshold: field.start_altitude_threshold().round().clamp(0.0, 255.0) as u8,
        }
    }

    /// Rebuild a height field, rejecting structurally inconsistent data.
    pub fn into_field(self) -> Result<HeightField> {
        if self.width == 0 || self.height == 0 {
            return Err(TerrainError::InvalidMap(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.height_data.len() != self.height {
            return Err(TerrainError::InvalidMap(format!(
                "expected {} rows, found {}",
                self.height,
                self.height_data.len()
            )));
        }
        if let Some((y, row)) = self.height_data.iter().enumerate().find(|(_, row)| row.len() != self.width) {
            return Err(TerrainError::InvalidMap(format!(
                "row {} has {} values, expected {}",
                y,
                row.len(),
                self.width
            )));
        }
        let [sx, sy] = self.shelter_coords;
        if sx >= self.width || sy >= self.height {
            return Err(TerrainError::InvalidMap(format!(
                "shelter ({}, {}) lies outside the {}x{} map",
                sx, sy, self.width, self.height
            )));
        }

        let data: Vec<f32> = self.height_data.into_iter().flatten().map(f32::from).collect();
        let altitude = Tilemap::from_vec(self.width, self.height, data)
            .ok_or_else(|| TerrainError::InvalidMap("height data size mismatch".into()))?;

        Ok(HeightField::new(altitude, (sx, sy), f32::from(self.start_altitude_threshold)))
    }
}

/// Save a height field as a JSON snapshot, creating parent directories.
pub fn save_to_json(field: &HeightField, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let snapshot = MapSnapshot::from_field(field);
    let json = serde_json::to_string(&snapshot)?;
    fs::write(path, json)?;

    log::info!("Saved {}x{} map to {}", field.width(), field.height(), path.display());
    Ok(())
}

/// Load a height field from a JSON snapshot.
pub fn load_from_json(path: &Path) -> Result<HeightField> {
    let text = fs::read_to_string(path)?;
    let snapshot: MapSnapshot = serde_json::from_str(&text)?;
    let field = snapshot.into_field()?;

    log::info!("Loaded {}x{} map from {}", field.width(), field.height(), path.display());
    Ok(field)
}
