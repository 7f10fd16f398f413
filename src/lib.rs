//! Fractal terrain generation library
//!
//! Builds a height field with diamond-square midpoint displacement and turns
//! it into a smoothed, triangulated mesh ready for a renderer.

pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod heightmap;
pub mod mesh;

pub use error::{Result, TerrainError};
pub use grid::Grid;
pub use mesh::Mesh;
