use serde::Serialize;

use crate::error::{Result, TerrainError};

/// A 2D grid stored row-major (`index = x + y * width`). Edges do not wrap.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    values: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    /// Wrap an existing row-major buffer. The length must be `width * height`.
    pub fn from_values(width: usize, height: usize, values: Vec<T>) -> Result<Self> {
        let expected = width * height;
        if values.len() != expected {
            return Err(TerrainError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { width, height, values })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.values[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.values[idx] = value;
    }

    /// Signed lookup; `None` for anything outside the grid.
    pub fn try_get(&self, x: isize, y: isize) -> Option<&T> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(self.index(x, y))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.values.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }
}

/// Summary statistics of an elevation grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GridStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

impl Grid<f32> {
    /// Value at signed coordinates, or 0.0 when out of range.
    pub fn get_or_zero(&self, x: isize, y: isize) -> f32 {
        self.try_get(x, y).copied().unwrap_or(0.0)
    }

    pub fn stats(&self) -> GridStats {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0f64;
        for &v in &self.values {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
        }
        if self.values.is_empty() {
            return GridStats {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        GridStats {
            min,
            max,
            mean: (sum / self.values.len() as f64) as f32,
        }
    }

    pub fn all_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let grid = Grid::from_values(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(*grid.get(0, 0), 0);
        assert_eq!(*grid.get(2, 0), 2);
        assert_eq!(*grid.get(0, 1), 3);
        assert_eq!(grid.index(1, 1), 4);
    }

    #[test]
    fn test_from_values_rejects_wrong_length() {
        let err = Grid::from_values(3, 3, vec![0.0f32; 8]).unwrap_err();
        match err {
            TerrainError::LengthMismatch { expected, actual } => {
                assert_eq!(expected, 9);
                assert_eq!(actual, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_reads_are_zero() {
        let grid = Grid::new_with(3, 3, 1.0f32);
        assert_eq!(grid.get_or_zero(-1, 0), 0.0);
        assert_eq!(grid.get_or_zero(0, -1), 0.0);
        assert_eq!(grid.get_or_zero(3, 1), 0.0);
        assert_eq!(grid.get_or_zero(1, 3), 0.0);
        assert_eq!(grid.get_or_zero(2, 2), 1.0);
    }

    #[test]
    fn test_edges_do_not_wrap() {
        let mut grid = Grid::new(4, 1);
        grid.set(3, 0, 7.0f32);
        // Left of column 0 must not alias the last column
        assert_eq!(grid.get_or_zero(-1, 0), 0.0);
    }

    #[test]
    fn test_non_square_lookup() {
        let grid = Grid::from_values(4, 2, (0..8).map(|v| v as f32).collect()).unwrap();
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.try_get(3, 1), Some(&7.0));
        assert_eq!(grid.try_get(1, 2), None);
        assert_eq!(grid.try_get(4, 0), None);
    }

    #[test]
    fn test_stats() {
        let grid = Grid::from_values(2, 2, vec![-1.0f32, 0.0, 1.0, 2.0]).unwrap();
        let stats = grid.stats();
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 2.0);
        assert!((stats.mean - 0.5).abs() < 1e-6);
    }
}
