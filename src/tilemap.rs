/// A bounded 2D grid stored row-major. Unlike a world map it does not wrap:
/// every edge is a hard border.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

/// Offsets of the 8-connected neighbourhood, orthogonal moves first.
pub const NEIGHBOR_OFFSETS_8: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Tilemap<T> {
    /// Wrap an existing row-major buffer. Returns `None` when the buffer
    /// length does not match the dimensions.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Build a map by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Convert signed coordinates to a cell position if they are on the map.
    pub fn cell(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    /// Checked access with signed coordinates.
    pub fn get_checked(&self, x: i32, y: i32) -> Option<&T> {
        self.cell(x, y).map(|(cx, cy)| self.get(cx, cy))
    }

    /// Access with coordinates clamped to the border (edge replication).
    pub fn get_clamped(&self, x: i64, y: i64) -> &T {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.get(cx, cy)
    }

    /// Get neighbors (4-connectivity), clipped at the borders.
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(4);
        if x > 0 {
            result.push((x - 1, y));
        }
        if x + 1 < self.width {
            result.push((x + 1, y));
        }
        if y > 0 {
            result.push((x, y - 1));
        }
        if y + 1 < self.height {
            result.push((x, y + 1));
        }
        result
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// One row of the map.
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Cell-wise transform into a new map of the same shape.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Tilemap<U> {
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Combine two maps of the same shape cell by cell.
    pub fn zip_map<U, V>(&self, other: &Tilemap<U>, f: impl Fn(&T, &U) -> V) -> Tilemap<V> {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "zip_map requires maps of equal shape"
        );
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().zip(other.data.iter()).map(|(a, b)| f(a, b)).collect(),
        }
    }
}

impl<T: Send + Sync> Tilemap<T> {
    /// Build a map row-parallel. Every cell is computed independently, so the
    /// result is identical to `from_fn`.
    pub fn par_from_fn(
        width: usize,
        height: usize,
        f: impl Fn(usize, usize) -> T + Send + Sync,
    ) -> Self {
        use rayon::prelude::*;

        let rows: Vec<Vec<T>> = (0..height)
            .into_par_iter()
            .map(|y| (0..width).map(|x| f(x, y)).collect())
            .collect();
        let data = rows.into_iter().flatten().collect();
        Self { width, height, data }
    }
}

impl Tilemap<f32> {
    /// Minimum and maximum value. Returns `(0, 0)` for an empty map.
    pub fn min_max(&self) -> (f32, f32) {
        if self.data.is_empty() {
            return (0.0, 0.0);
        }
        self.data
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Position of the highest cell (first one in row-major order on ties).
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = 0;
        for (idx, &v) in self.data.iter().enumerate() {
            if v > self.data[best] {
                best = idx;
            }
        }
        (best % self.width.max(1), best / self.width.max(1))
    }

    /// Copy normalised to 0..1. A flat map normalises to all zeros.
    pub fn normalized(&self) -> Tilemap<f32> {
        let (min_val, max_val) = self.min_max();
        let range = max_val - min_val;
        if range < 1e-9 {
            return self.map(|_| 0.0);
        }
        self.map(|&v| (v - min_val) / range)
    }
}
