use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TerrainError};
use crate::grid::Grid;

/// How the 3x3 smoothing window treats cells outside the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SmoothingMode {
    /// Missing neighbors count as 0 and the sum is always divided by 9.
    #[default]
    #[value(name = "fixed")]
    FixedDivisor,
    /// Only in-range cells are averaged.
    BoundsAware,
}

/// Parameters for turning elevations into world-space vertex heights
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshParams {
    /// Lowest vertex height; negative elevations are clamped here
    pub floor_height: f32,
    /// World units per unit of smoothed elevation
    pub amplitude: f32,
    pub smoothing: SmoothingMode,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            floor_height: 40.0,
            amplitude: 80.0,
            smoothing: SmoothingMode::FixedDivisor,
        }
    }
}

impl MeshParams {
    pub fn validate(&self) -> Result<()> {
        if !self.floor_height.is_finite() || !self.amplitude.is_finite() {
            return Err(TerrainError::Config(format!(
                "floor_height and amplitude must be finite (got {}, {})",
                self.floor_height, self.amplitude
            )));
        }
        Ok(())
    }
}

/// Vertex position, laid out as three packed `f32`s for upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Triangle mesh derived from a height grid.
///
/// One vertex per grid cell in row-major order and two triangles per cell
/// quad, so `vertices.len() == width * height` and
/// `indices.len() == (width - 1) * (height - 1) * 6`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Mesh {
    pub width: usize,
    pub height: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Positions as a flat `[x0, y0, z0, x1, ...]` slice.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

/// Build a mesh with the default floor, amplitude and smoothing.
pub fn build(grid: &Grid<f32>) -> Mesh {
    build_with(grid, &MeshParams::default())
}

pub fn build_with(grid: &Grid<f32>, params: &MeshParams) -> Mesh {
    if params.smoothing == SmoothingMode::BoundsAware {
        warn!("Smoothing with bounds-aware divisor");
    }

    let vertices = build_vertices(grid, params);
    let indices = build_indices(grid.width(), grid.height());

    info!(
        width = grid.width(),
        height = grid.height(),
        vertices = vertices.len(),
        triangles = indices.len() / 3,
        "Built terrain mesh"
    );

    Mesh {
        width: grid.width(),
        height: grid.height(),
        vertices,
        indices,
    }
}

fn build_vertices(grid: &Grid<f32>, params: &MeshParams) -> Vec<Vertex> {
    let width = grid.width();
    (0..grid.len())
        .into_par_iter()
        .map(|idx| {
            let x = idx % width;
            let z = idx / width;
            let smoothed = smoothed_elevation(grid, x, z, params.smoothing);
            let y = params.floor_height.max(params.floor_height + smoothed * params.amplitude);
            Vertex { x: x as f32, y, z: z as f32 }
        })
        .collect()
}

/// Mean of the 3x3 window centered on `(x, z)`.
fn smoothed_elevation(grid: &Grid<f32>, x: usize, z: usize, mode: SmoothingMode) -> f32 {
    let (cx, cz) = (x as isize, z as isize);
    let window = (-1..=1).flat_map(|dz| (-1..=1).map(move |dx| (cx + dx, cz + dz)));
    match mode {
        SmoothingMode::FixedDivisor => {
            window.map(|(nx, nz)| grid.get_or_zero(nx, nz)).sum::<f32>() / 9.0
        }
        SmoothingMode::BoundsAware => {
            let (sum, count) = window
                .filter_map(|(nx, nz)| grid.try_get(nx, nz))
                .fold((0.0f32, 0u32), |(sum, count), &v| (sum + v, count + 1));
            sum / count as f32
        }
    }
}

/// Two triangles per quad: `{tl, tl+w, tl+1}` and `{tl+1, tl+w, tl+w+1}`.
fn build_indices(width: usize, height: usize) -> Vec<u32> {
    let quads = width.saturating_sub(1) * height.saturating_sub(1);
    let mut indices = Vec::with_capacity(quads * 6);
    let w = width as u32;
    for z in 0..height.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            let tl = (x + z * width) as u32;
            indices.extend_from_slice(&[tl, tl + w, tl + 1, tl + 1, tl + w, tl + w + 1]);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_single_quad_indices() {
        let grid = Grid::new(3, 3);
        let mesh = build(&grid);
        assert_eq!(mesh.indices.len(), 4 * 6);
        assert_eq!(&mesh.indices[..6], &[0, 3, 1, 1, 3, 4]);

        let grid = Grid::new(2, 2);
        let mesh = build(&grid);
        assert_eq!(mesh.indices, vec![0, 2, 1, 1, 2, 3]);
    }

    #[test]
    fn test_size_three_generated_mesh() {
        // Generated 3x3 grid: one pass, four quads, the first one at the origin
        let grid = heightmap::generate(3, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let mesh = build(&grid);
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.indices.len(), (3 - 1) * (3 - 1) * 6);
        assert_eq!(&mesh.indices[..6], &[0, 3, 1, 1, 3, 4]);
    }

    #[test]
    fn test_shape_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for n in 1..=7 {
            let size = (1usize << n) + 1;
            let grid = heightmap::generate(size, &mut rng).unwrap();
            let mesh = build(&grid);
            assert_eq!(mesh.vertices.len(), size * size);
            assert_eq!(mesh.indices.len(), (size - 1) * (size - 1) * 6);
            assert_eq!(mesh.triangle_count(), (size - 1) * (size - 1) * 2);
            let n_vertices = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&i| i < n_vertices));
            assert!(mesh.vertices.iter().all(|v| v.y >= 40.0));
        }
    }

    #[test]
    fn test_vertices_follow_grid_coordinates() {
        let grid = Grid::new(5, 5);
        let mesh = build(&grid);
        for (i, v) in mesh.vertices.iter().enumerate() {
            assert_eq!(v.x, (i % 5) as f32);
            assert_eq!(v.z, (i / 5) as f32);
            assert_eq!(v.y, 40.0);
        }
    }

    #[test]
    fn test_fixed_divisor_darkens_edges() {
        let grid = Grid::new_with(3, 3, 0.9f32);
        let mesh = build(&grid);
        let at = |x: usize, z: usize| mesh.vertices[x + z * 3].y;

        // Interior: full window, mean 0.9
        assert!((at(1, 1) - (40.0 + 0.9 * 80.0)).abs() < 1e-3);
        // Edge: 6 of 9 in range
        assert!((at(1, 0) - (40.0 + 0.9 * 6.0 / 9.0 * 80.0)).abs() < 1e-3);
        // Corner: 4 of 9 in range
        assert!((at(0, 0) - (40.0 + 0.9 * 4.0 / 9.0 * 80.0)).abs() < 1e-3);
    }

    #[test]
    fn test_x_edges_do_not_read_adjacent_row() {
        // Only the last cell of row 0 is raised; it is not a 2-D neighbor of (0, 1)
        let mut grid = Grid::new(3, 3);
        grid.set(2, 0, 0.9f32);
        let mesh = build(&grid);
        assert_eq!(mesh.vertices[3].y, 40.0);
        assert!(mesh.vertices[1].y > 40.0);
    }

    #[test]
    fn test_non_square_grid() {
        let grid = Grid::new_with(4, 3, 0.9f32);
        let mesh = build(&grid);
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.indices.len(), 3 * 2 * 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        // Bottom-left corner: 4 of 9 in range
        let corner = mesh.vertices[8];
        assert_eq!((corner.x, corner.z), (0.0, 2.0));
        assert!((corner.y - (40.0 + 0.9 * 4.0 / 9.0 * 80.0)).abs() < 1e-3);
    }

    #[test]
    fn test_smoothing_flag_names() {
        use clap::ValueEnum;
        assert_eq!(SmoothingMode::from_str("fixed", false), Ok(SmoothingMode::FixedDivisor));
        assert_eq!(
            SmoothingMode::from_str("bounds-aware", false),
            Ok(SmoothingMode::BoundsAware)
        );
    }

    #[test]
    fn test_bounds_aware_smoothing() {
        let grid = Grid::new_with(3, 3, 0.5f32);
        let params = MeshParams { smoothing: SmoothingMode::BoundsAware, ..Default::default() };
        let mesh = build_with(&grid, &params);
        assert!(mesh.vertices.iter().all(|v| (v.y - 80.0).abs() < 1e-3));
    }

    #[test]
    fn test_negative_elevation_clamps_to_floor() {
        let grid = Grid::new_with(4, 4, -1.0f32);
        let mesh = build(&grid);
        assert!(mesh.vertices.iter().all(|v| v.y == 40.0));
    }

    #[test]
    fn test_consistent_winding() {
        // Every triangle in a flat mesh has the same facing
        let grid = Grid::new(4, 4);
        let mesh = build(&grid);
        let p = |i: u32| mesh.vertices[i as usize];
        for [a, b, c] in mesh.triangles() {
            let (a, b, c) = (p(a), p(b), p(c));
            let (ux, uz) = (b.x - a.x, b.z - a.z);
            let (vx, vz) = (c.x - a.x, c.z - a.z);
            // y component of (b - a) x (c - a)
            let cross_y = uz * vx - ux * vz;
            assert!(cross_y > 0.0);
        }
    }

    #[test]
    fn test_positions_flat() {
        let grid = Grid::new(2, 2);
        let mesh = build(&grid);
        let flat = mesh.positions_flat();
        assert_eq!(flat.len(), 12);
        assert_eq!(&flat[..6], &[0.0, 40.0, 0.0, 1.0, 40.0, 0.0]);
    }
}
