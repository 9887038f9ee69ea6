//! Height field: the altitude grid of one map plus its derived fields.
//!
//! Altitudes live on a 0-255 scale but are kept as `f32` so repeated tool
//! edits do not accumulate rounding. Gradients and the global-minimum basin
//! are derived data and are refreshed after every successful edit.

use std::collections::VecDeque;

use image::{GrayImage, Luma};

use crate::config::ToolConfig;
use crate::tilemap::Tilemap;
use crate::tools::{self, ToolKind};

/// Highest altitude a cell can hold.
pub const MAX_ALTITUDE: f32 = 255.0;

/// Altitude grid with cached Sobel gradients and the shelter location.
#[derive(Clone, Debug)]
pub struct HeightField {
    altitude: Tilemap<f32>,
    gradient_x: Tilemap<f32>,
    gradient_y: Tilemap<f32>,
    /// Cells 4-connected to the shelter at exactly the shelter's altitude
    minimum_basin: Tilemap<bool>,
    shelter: (usize, usize),
    start_altitude_threshold: f32,
}

impl HeightField {
    /// Build a field from an altitude grid. The shelter is clamped onto the
    /// map; callers loading external data validate it beforehand.
    pub fn new(altitude: Tilemap<f32>, shelter: (usize, usize), start_altitude_threshold: f32) -> Self {
        let shelter = (
            shelter.0.min(altitude.width.saturating_sub(1)),
            shelter.1.min(altitude.height.saturating_sub(1)),
        );
        let (gradient_x, gradient_y) = compute_sobel_gradients(&altitude);
        let minimum_basin = flood_minimum_basin(&altitude, shelter);

        Self {
            altitude,
            gradient_x,
            gradient_y,
            minimum_basin,
            shelter,
            start_altitude_threshold,
        }
    }

    pub fn width(&self) -> usize {
        self.altitude.width
    }

    pub fn height(&self) -> usize {
        self.altitude.height
    }

    pub fn altitude(&self) -> &Tilemap<f32> {
        &self.altitude
    }

    pub fn gradient_x(&self) -> &Tilemap<f32> {
        &self.gradient_x
    }

    pub fn gradient_y(&self) -> &Tilemap<f32> {
        &self.gradient_y
    }

    pub fn shelter_coords(&self) -> (usize, usize) {
        self.shelter
    }

    pub fn start_altitude_threshold(&self) -> f32 {
        self.start_altitude_threshold
    }

    /// Altitude at a cell; 0 off the map.
    pub fn get_height(&self, x: i32, y: i32) -> f32 {
        self.altitude.get_checked(x, y).copied().unwrap_or(0.0)
    }

    /// Gradient `(d/dx, d/dy)` at a cell; `(0, 0)` off the map.
    pub fn get_gradient(&self, x: i32, y: i32) -> (f32, f32) {
        match self.altitude.cell(x, y) {
            Some((cx, cy)) => (*self.gradient_x.get(cx, cy), *self.gradient_y.get(cx, cy)),
            None => (0.0, 0.0),
        }
    }

    /// Gradient length at a cell; infinite off the map so an edge is never
    /// picked as a step.
    pub fn get_gradient_magnitude(&self, x: i32, y: i32) -> f32 {
        if self.altitude.cell(x, y).is_none() {
            return f32::INFINITY;
        }
        let (gx, gy) = self.get_gradient(x, y);
        (gx * gx + gy * gy).sqrt()
    }

    /// True if a skier may be launched from this cell.
    pub fn is_valid_start(&self, x: i32, y: i32) -> bool {
        self.get_height(x, y) >= self.start_altitude_threshold
    }

    /// True if the cell belongs to the flat region at the shelter's altitude
    /// that is 4-connected to the shelter.
    pub fn is_in_global_minimum_basin(&self, x: i32, y: i32) -> bool {
        self.minimum_basin.get_checked(x, y).copied().unwrap_or(false)
    }

    /// Apply a terrain tool centred on `(cx, cy)`.
    ///
    /// Returns whether any altitude changed. Derived fields are recomputed
    /// before returning when it did.
    pub fn apply_tool(&mut self, kind: ToolKind, params: &ToolConfig, cx: i32, cy: i32) -> bool {
        let changed = tools::apply(kind, params, &mut self.altitude, cx, cy);
        if changed {
            self.refresh_derived();
            log::debug!("{} applied at ({}, {})", kind, cx, cy);
        }
        changed
    }

    /// Recompute gradients and the minimum basin from the current altitude.
    fn refresh_derived(&mut self) {
        let (gradient_x, gradient_y) = compute_sobel_gradients(&self.altitude);
        self.gradient_x = gradient_x;
        self.gradient_y = gradient_y;
        self.minimum_basin = flood_minimum_basin(&self.altitude, self.shelter);
    }

    /// Altitudes quantized to the 0-255 integer scale, row-major.
    pub fn height_data(&self) -> Vec<Vec<u8>> {
        (0..self.height())
            .map(|y| self.altitude.row(y).iter().map(|&h| quantize(h)).collect())
            .collect()
    }

    /// Grayscale preview (black = low).
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            Luma([quantize(*self.altitude.get(x as usize, y as usize))])
        })
    }

    /// First cell in row-major order that is a valid start.
    pub fn first_valid_start(&self) -> Option<(usize, usize)> {
        self.altitude
            .iter()
            .find(|&(_, _, &h)| h >= self.start_altitude_threshold)
            .map(|(x, y, _)| (x, y))
    }
}

/// Round and clamp an altitude to the stored 8-bit scale.
pub fn quantize(h: f32) -> u8 {
    h.round().clamp(0.0, MAX_ALTITUDE) as u8
}

/// Sobel gradients per axis. Borders replicate the edge cells; the kernel
/// sum is divided by 8 so a unit ramp has gradient 1.
pub fn compute_sobel_gradients(altitude: &Tilemap<f32>) -> (Tilemap<f32>, Tilemap<f32>) {
    let sample = |x: i64, y: i64| *altitude.get_clamped(x, y);

    let gradient_x = Tilemap::par_from_fn(altitude.width, altitude.height, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let right = sample(x + 1, y - 1) + 2.0 * sample(x + 1, y) + sample(x + 1, y + 1);
        let left = sample(x - 1, y - 1) + 2.0 * sample(x - 1, y) + sample(x - 1, y + 1);
        (right - left) / 8.0
    });
    let gradient_y = Tilemap::par_from_fn(altitude.width, altitude.height, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let down = sample(x - 1, y + 1) + 2.0 * sample(x, y + 1) + sample(x + 1, y + 1);
        let up = sample(x - 1, y - 1) + 2.0 * sample(x, y - 1) + sample(x + 1, y - 1);
        (down - up) / 8.0
    });

    (gradient_x, gradient_y)
}

/// Breadth-first flood from the shelter through cells of exactly the
/// shelter's altitude.
fn flood_minimum_basin(altitude: &Tilemap<f32>, shelter: (usize, usize)) -> Tilemap<bool> {
    let mut basin = Tilemap::new_with(altitude.width, altitude.height, false);
    if altitude.width == 0 || altitude.height == 0 {
        return basin;
    }

    let level = *altitude.get(shelter.0, shelter.1);
    let mut queue = VecDeque::new();
    basin.set(shelter.0, shelter.1, true);
    queue.push_back(shelter);

    while let Some((x, y)) = queue.pop_front() {
        for (nx, ny) in altitude.neighbors(x, y) {
            if !*basin.get(nx, ny) && *altitude.get(nx, ny) == level {
                basin.set(nx, ny, true);
                queue.push_back((nx, ny));
            }
        }
    }

    basin
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5x5 field sloping up to the right, with a 2-cell flat pit at the shelter.
    fn ramp_field() -> HeightField {
        let mut altitude = Tilemap::from_fn(5, 5, |x, _| 10.0 + 10.0 * x as f32);
        altitude.set(0, 2, 0.0);
        altitude.set(0, 3, 0.0);
        altitude.set(4, 4, 0.0);
        HeightField::new(altitude, (0, 2), 40.0)
    }

    #[test]
    fn test_out_of_bounds_sentinels() {
        let field = ramp_field();
        assert_eq!(field.get_height(-1, 0), 0.0);
        assert_eq!(field.get_height(0, 5), 0.0);
        assert_eq!(field.get_gradient(5, 5), (0.0, 0.0));
        assert_eq!(field.get_gradient_magnitude(-3, 2), f32::INFINITY);
        assert!(!field.is_in_global_minimum_basin(-1, 2));
    }

    #[test]
    fn test_sobel_on_linear_ramp() {
        let altitude = Tilemap::from_fn(6, 4, |x, y| 3.0 * x as f32 + 0.5 * y as f32);
        let (gx, gy) = compute_sobel_gradients(&altitude);
        // Interior cells see the exact slope
        assert!((gx.get(2, 1) - 3.0).abs() < 1e-5);
        assert!((gy.get(2, 1) - 0.5).abs() < 1e-5);
        // Replicated borders halve the difference at the edge
        assert!((gx.get(0, 1) - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_valid_start_threshold() {
        let field = ramp_field();
        assert!(!field.is_valid_start(1, 0));
        assert!(field.is_valid_start(3, 0));
        assert!(!field.is_valid_start(10, 0));
        assert_eq!(field.first_valid_start(), Some((3, 0)));
    }

    #[test]
    fn test_minimum_basin_is_connected_region() {
        let field = ramp_field();
        assert!(field.is_in_global_minimum_basin(0, 2));
        assert!(field.is_in_global_minimum_basin(0, 3));
        // Same altitude, but not connected to the shelter
        assert!(!field.is_in_global_minimum_basin(4, 4));
        assert!(!field.is_in_global_minimum_basin(1, 2));
    }

    #[test]
    fn test_height_data_quantizes_and_clamps() {
        let altitude = Tilemap::from_vec(3, 1, vec![-4.0, 127.6, 300.0]).unwrap();
        let field = HeightField::new(altitude, (0, 0), 0.0);
        assert_eq!(field.height_data(), vec![vec![0, 128, 255]]);
        assert_eq!(field.to_image().get_pixel(1, 0).0, [128]);
    }

    #[test]
    fn test_shelter_clamped_onto_map() {
        let field = HeightField::new(Tilemap::new_with(3, 2, 1.0), (7, 9), 0.0);
        assert_eq!(field.shelter_coords(), (2, 1));
    }

    #[test]
    fn test_gradients_recomputed_after_tool() {
        let mut field = ramp_field();
        let params = ToolConfig { radius: 2, ..Default::default() };
        assert!(field.apply_tool(ToolKind::Filler, &params, 2, 2));

        let (gx, gy) = compute_sobel_gradients(field.altitude());
        assert_eq!(&gx, field.gradient_x());
        assert_eq!(&gy, field.gradient_y());
    }

    #[test]
    fn test_basin_recomputed_after_tool() {
        let mut field = ramp_field();
        let params = ToolConfig { radius: 0, filler_height: 5.0, ..Default::default() };
        // Raising the second pit cell detaches it from the shelter level
        assert!(field.apply_tool(ToolKind::Filler, &params, 0, 3));
        assert!(field.is_in_global_minimum_basin(0, 2));
        assert!(!field.is_in_global_minimum_basin(0, 3));
    }
}
