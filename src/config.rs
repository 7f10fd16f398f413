use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::heightmap::{self, GeneratorParams};
use crate::mesh::MeshParams;

/// Side length used when nothing else is specified (2^8 + 1).
pub const DEFAULT_SIZE: usize = 257;

/// Everything needed to reproduce one terrain: grid size, seed and the
/// generator and mesh parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub size: usize,
    /// Random seed (a fresh one is drawn when absent)
    pub seed: Option<u64>,
    pub generator: GeneratorParams,
    pub mesh: MeshParams,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            seed: None,
            generator: GeneratorParams::default(),
            mesh: MeshParams::default(),
        }
    }
}

impl TerrainConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: TerrainConfig = serde_json::from_str(&text)?;
        debug!(path = %path.display(), ?config, "Loaded terrain config");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        heightmap::validate_size(self.size)?;
        self.generator.validate()?;
        self.mesh.validate()?;
        Ok(())
    }
}
