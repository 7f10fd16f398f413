use thiserror::Error;

/// Errors raised while configuring, generating or exporting terrain.
#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("Invalid grid size {size}: side length must be 2^n + 1")]
    InvalidSize { size: usize },

    #[error("Exponent {exponent} is too large (max {max})", max = crate::heightmap::MAX_EXPONENT)]
    ExponentTooLarge { exponent: u32 },

    #[error("Grid buffer has {actual} values, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
