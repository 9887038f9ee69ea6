//! Terraforming tools.
//!
//! Each tool edits a disc of `radius` cells around its centre with a
//! raised-cosine falloff: full strength at the centre, zero at the rim.

use std::f32::consts::FRAC_PI_2;
use std::str::FromStr;

use crate::config::ToolConfig;
use crate::error::TerrainError;
use crate::heightfield::MAX_ALTITUDE;
use crate::tilemap::Tilemap;

/// The fixed set of terrain tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Digs a crater
    Excavator,
    /// Raises a mound
    Filler,
    /// Pulls heights toward the local mean
    Grader,
}

impl ToolKind {
    pub fn all() -> &'static [Self] {
        &[Self::Excavator, Self::Filler, Self::Grader]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excavator => "Lowers terrain inside the disc",
            Self::Filler => "Raises terrain inside the disc",
            Self::Grader => "Smooths terrain toward the disc's mean height",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excavator => write!(f, "excavator"),
            Self::Filler => write!(f, "filler"),
            Self::Grader => write!(f, "grader"),
        }
    }
}

impl FromStr for ToolKind {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "excavator" => Ok(Self::Excavator),
            "filler" => Ok(Self::Filler),
            "grader" => Ok(Self::Grader),
            other => Err(TerrainError::Config(format!("unknown tool '{}'", other))),
        }
    }
}

/// Raised-cosine weight for a cell at `dist` from the centre.
pub fn falloff(dist: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return if dist <= 0.0 { 1.0 } else { 0.0 };
    }
    if dist > radius {
        return 0.0;
    }
    let c = (FRAC_PI_2 * dist / radius).cos();
    c * c
}

/// Cells of the disc that lie on the map, with their falloff weights.
fn disc_cells(altitude: &Tilemap<f32>, radius: u32, cx: i32, cy: i32) -> Vec<(usize, usize, f32)> {
    let r = radius as i32;
    let mut cells = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r * r {
                continue;
            }
            if let Some((x, y)) = altitude.cell(cx + dx, cy + dy) {
                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                cells.push((x, y, falloff(dist, radius as f32)));
            }
        }
    }
    cells
}

/// Apply `kind` at `(cx, cy)`. Returns whether any altitude changed.
pub fn apply(kind: ToolKind, params: &ToolConfig, altitude: &mut Tilemap<f32>, cx: i32, cy: i32) -> bool {
    let cells = disc_cells(altitude, params.radius, cx, cy);
    if cells.is_empty() {
        return false;
    }

    let targets: Vec<f32> = match kind {
        ToolKind::Excavator => cells
            .iter()
            .map(|&(x, y, w)| *altitude.get(x, y) - params.excavator_depth * w)
            .collect(),
        ToolKind::Filler => cells
            .iter()
            .map(|&(x, y, w)| *altitude.get(x, y) + params.filler_height * w)
            .collect(),
        ToolKind::Grader => {
            // A single cell has nothing to average against
            if cells.len() < 2 {
                return false;
            }
            let mean = cells.iter().map(|&(x, y, _)| *altitude.get(x, y)).sum::<f32>() / cells.len() as f32;
            cells
                .iter()
                .map(|&(x, y, w)| {
                    let h = *altitude.get(x, y);
                    h + (mean - h) * params.grader_intensity * w
                })
                .collect()
        }
    };

    let mut changed = false;
    for (&(x, y, _), target) in cells.iter().zip(targets) {
        let new_height = target.clamp(0.0, MAX_ALTITUDE);
        let cell = altitude.get_mut(x, y);
        if new_height != *cell {
            *cell = new_height;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ToolConfig {
        ToolConfig {
            radius: 3,
            excavator_depth: 20.0,
            filler_height: 15.0,
            grader_intensity: 0.5,
        }
    }

    #[test]
    fn test_falloff_shape() {
        assert_eq!(falloff(0.0, 4.0), 1.0);
        assert!((falloff(2.0, 4.0) - 0.5).abs() < 1e-6);
        assert!(falloff(4.0, 4.0) < 1e-6);
        assert_eq!(falloff(4.5, 4.0), 0.0);
    }

    #[test]
    fn test_excavator_full_depth_at_centre() {
        let mut map = Tilemap::new_with(11, 11, 100.0f32);
        assert!(apply(ToolKind::Excavator, &params(), &mut map, 5, 5));
        assert_eq!(*map.get(5, 5), 80.0);
        assert!(*map.get(6, 5) > 80.0 && *map.get(6, 5) < 100.0);
    }

    #[test]
    fn test_filler_full_height_at_centre() {
        let mut map = Tilemap::new_with(11, 11, 100.0f32);
        assert!(apply(ToolKind::Filler, &params(), &mut map, 5, 5));
        assert_eq!(*map.get(5, 5), 115.0);
    }

    #[test]
    fn test_cells_outside_radius_untouched() {
        for &kind in ToolKind::all() {
            let mut map = Tilemap::from_fn(15, 15, |x, y| (x * 7 + y * 3) as f32);
            let before = map.clone();
            apply(kind, &params(), &mut map, 7, 7);
            for (x, y, &h) in map.iter() {
                let dx = x as i32 - 7;
                let dy = y as i32 - 7;
                if dx * dx + dy * dy > 9 {
                    assert_eq!(h, *before.get(x, y), "{} touched ({}, {})", kind, x, y);
                }
            }
        }
    }

    #[test]
    fn test_excavator_clamps_at_zero() {
        let mut map = Tilemap::new_with(7, 7, 5.0f32);
        assert!(apply(ToolKind::Excavator, &params(), &mut map, 3, 3));
        assert_eq!(*map.get(3, 3), 0.0);
        assert!(map.iter().all(|(_, _, &h)| h >= 0.0));

        // Digging an already-empty pit changes nothing
        let mut flat = Tilemap::new_with(7, 7, 0.0f32);
        assert!(!apply(ToolKind::Excavator, &params(), &mut flat, 3, 3));
    }

    #[test]
    fn test_disc_fully_off_map_is_noop() {
        let mut map = Tilemap::new_with(5, 5, 50.0f32);
        for &kind in ToolKind::all() {
            assert!(!apply(kind, &params(), &mut map, 40, -40));
        }
    }

    #[test]
    fn test_grader_pulls_toward_mean() {
        let mut map = Tilemap::new_with(9, 9, 10.0f32);
        map.set(4, 4, 50.0);
        assert!(apply(ToolKind::Grader, &params(), &mut map, 4, 4));
        assert!(*map.get(4, 4) < 50.0);
        assert!(*map.get(4, 4) > 10.0);
        // Neighbours rise toward the mean
        assert!(*map.get(4, 5) > 10.0);

        // A flat area is already at its mean
        let mut flat = Tilemap::new_with(9, 9, 10.0f32);
        assert!(!apply(ToolKind::Grader, &params(), &mut flat, 4, 4));
    }

    #[test]
    fn test_parse_tool_names() {
        assert_eq!("Excavator".parse::<ToolKind>().unwrap(), ToolKind::Excavator);
        assert_eq!("grader".parse::<ToolKind>().unwrap(), ToolKind::Grader);
        assert!("bulldozer".parse::<ToolKind>().is_err());
    }
}
