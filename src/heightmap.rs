use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, TerrainError};
use crate::grid::Grid;

// =============================================================================
// GENERATOR PARAMETERS
// =============================================================================

/// Largest supported `n` in a side length of `2^n + 1` (32769 cells per side).
pub const MAX_EXPONENT: u32 = 15;

/// How the four grid corners are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CornerMode {
    /// Corners are never written and stay at 0.
    #[default]
    Zero,
    /// Corners get uniform noise at the initial scale before the first pass.
    Seeded,
}

/// Parameters for diamond-square generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Displacement amplitude of the coarsest pass
    pub initial_scale: f32,
    /// Amplitude multiplier applied after every pass (0.0-1.0]
    pub scale_decay: f32,
    pub corners: CornerMode,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            initial_scale: 0.5,
            scale_decay: 0.5,
            corners: CornerMode::Zero,
        }
    }
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<()> {
        if !self.initial_scale.is_finite() || self.initial_scale < 0.0 {
            return Err(TerrainError::Config(format!(
                "initial_scale must be a finite, non-negative number (got {})",
                self.initial_scale
            )));
        }
        if !(self.scale_decay > 0.0 && self.scale_decay <= 1.0) {
            return Err(TerrainError::Config(format!(
                "scale_decay must be in (0, 1] (got {})",
                self.scale_decay
            )));
        }
        Ok(())
    }
}

// =============================================================================
// SIZE VALIDATION
// =============================================================================

/// True when `size` is `2^n + 1` with `0 <= n <= MAX_EXPONENT`.
pub fn is_valid_size(size: usize) -> bool {
    if size < 2 {
        return false;
    }
    let span = size - 1;
    span.is_power_of_two() && span.trailing_zeros() <= MAX_EXPONENT
}

pub fn validate_size(size: usize) -> Result<()> {
    if is_valid_size(size) {
        Ok(())
    } else {
        Err(TerrainError::InvalidSize { size })
    }
}

/// Side length `2^exponent + 1`.
pub fn size_for_exponent(exponent: u32) -> Result<usize> {
    if exponent > MAX_EXPONENT {
        return Err(TerrainError::ExponentTooLarge { exponent });
    }
    let size = (1usize << exponent) + 1;
    validate_size(size)?;
    Ok(size)
}

// =============================================================================
// DIAMOND-SQUARE
// =============================================================================

/// Generate a `size` x `size` height field with default parameters.
pub fn generate(size: usize, rng: &mut impl Rng) -> Result<Grid<f32>> {
    generate_with(size, &GeneratorParams::default(), rng)
}

/// Generate a height field by iterative diamond-square midpoint displacement.
///
/// Each pass runs a square step then a diamond step at the current chunk size,
/// after which the chunk size and the displacement scale are both reduced.
/// The grid starts at 0 and, in `CornerMode::Zero`, its corners are never
/// touched by either step.
pub fn generate_with(
    size: usize,
    params: &GeneratorParams,
    rng: &mut impl Rng,
) -> Result<Grid<f32>> {
    validate_size(size)?;
    params.validate()?;

    let mut grid = Grid::new_with(size, size, 0.0f32);
    let mut scale = params.initial_scale;

    if params.corners == CornerMode::Seeded {
        warn!("Seeding grid corners with random elevations");
        let last = size - 1;
        for (x, y) in [(0, 0), (last, 0), (0, last), (last, last)] {
            grid.set(x, y, displacement(rng, scale));
        }
    }

    // Every cell of a 2x2 grid is a corner; there is no center to displace.
    let mut chunk_size = if size == 2 { 1 } else { size };
    let mut passes = 0u32;
    while chunk_size > 1 {
        let half = chunk_size / 2;
        debug!(pass = passes, chunk_size, half, scale, "diamond-square pass");

        square_step(&mut grid, chunk_size, half, scale, rng);
        diamond_step(&mut grid, chunk_size, half, scale, rng);

        chunk_size = half;
        scale *= params.scale_decay;
        passes += 1;
    }

    info!(size, passes, "Generated height field");
    Ok(grid)
}

/// Uniform noise in `[-scale, scale)` from a single `[0, 1)` draw.
fn displacement(rng: &mut impl Rng, scale: f32) -> f32 {
    scale * (rng.gen::<f32>() * 2.0 - 1.0)
}

/// Fill every chunk center from the mean of its four diagonal corners.
fn square_step(
    grid: &mut Grid<f32>,
    chunk_size: usize,
    half: usize,
    scale: f32,
    rng: &mut impl Rng,
) {
    let size = grid.width();
    for y in (half..size).step_by(chunk_size) {
        for x in (half..size).step_by(chunk_size) {
            let avg = (*grid.get(x - half, y - half)
                + *grid.get(x - half, y + half)
                + *grid.get(x + half, y - half)
                + *grid.get(x + half, y + half))
                / 4.0;
            grid.set(x, y, avg + displacement(rng, scale));
        }
    }
}

/// Fill edge midpoints from the mean of whichever axis neighbors at distance
/// `half` are inside the grid. Even rows start at `half`, odd rows at 0.
fn diamond_step(
    grid: &mut Grid<f32>,
    chunk_size: usize,
    half: usize,
    scale: f32,
    rng: &mut impl Rng,
) {
    let size = grid.width();
    for (row, y) in (0..size).step_by(half).enumerate() {
        let x_begin = if row % 2 == 1 { 0 } else { half };
        for x in (x_begin..size).step_by(chunk_size) {
            let mut sum = 0.0f32;
            let mut count = 0u32;
            if x >= half {
                sum += *grid.get(x - half, y);
                count += 1;
            }
            if x + half < size {
                sum += *grid.get(x + half, y);
                count += 1;
            }
            if y >= half {
                sum += *grid.get(x, y - half);
                count += 1;
            }
            if y + half < size {
                sum += *grid.get(x, y + half);
                count += 1;
            }
            grid.set(x, y, sum / count as f32 + displacement(rng, scale));
        }
    }
}
