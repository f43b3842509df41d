//! # Sample Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) runs the stock 8K-particle scene.
//!
//! ```toml
//! particle_count = "num_8k"
//! range = [128.0, 128.0]
//! grid_dim = [16, 16]
//! disp_idx = 0
//! seed = 42
//! frames = 120
//!
//! [backend]
//! kind = "parallel"
//! threads = 0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lattice_core::{BackendKind, ExecutionBackend, GridConfig2D, GridError, GridResult};

/// Highest accepted `disp_idx` (per mille).
pub const DISP_IDX_MAX: u32 = 1000;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML is malformed or has unknown values.
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be written as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `disp_idx` is above [`DISP_IDX_MAX`].
    #[error("disp_idx {0} is out of range (0..=1000)")]
    DispIdx(u32),

    /// Range or grid dimensions are unusable.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Particle count presets, 1K to 32K in powers of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParticleCount {
    /// 1,024 particles.
    #[serde(rename = "num_1k")]
    Num1K,
    /// 2,048 particles.
    #[serde(rename = "num_2k")]
    Num2K,
    /// 4,096 particles.
    #[serde(rename = "num_4k")]
    Num4K,
    /// 8,192 particles.
    #[default]
    #[serde(rename = "num_8k")]
    Num8K,
    /// 16,384 particles.
    #[serde(rename = "num_16k")]
    Num16K,
    /// 32,768 particles.
    #[serde(rename = "num_32k")]
    Num32K,
}

impl ParticleCount {
    /// Every preset, smallest first.
    pub const ALL: [Self; 6] = [
        Self::Num1K,
        Self::Num2K,
        Self::Num4K,
        Self::Num8K,
        Self::Num16K,
        Self::Num32K,
    ];

    /// Number of particles.
    #[inline]
    #[must_use]
    pub const fn count(self) -> usize {
        1024 * match self {
            Self::Num1K => 1,
            Self::Num2K => 2,
            Self::Num4K => 4,
            Self::Num8K => 8,
            Self::Num16K => 16,
            Self::Num32K => 32,
        }
    }
}

/// Execution backend section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Serial or parallel dispatch.
    pub kind: BackendKind,
    /// Dedicated pool size; 0 uses the rayon global pool.
    pub threads: usize,
}

impl BackendConfig {
    /// Builds the backend.
    ///
    /// # Errors
    ///
    /// Fails if a dedicated thread pool cannot be created.
    pub fn build(&self) -> GridResult<ExecutionBackend> {
        ExecutionBackend::from_kind(self.kind, self.threads)
    }
}

/// Nearest neighbor sample configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleConfig {
    /// Particle count preset.
    pub particle_count: ParticleCount,
    /// World extent; particles spawn in `[1, range)` per axis.
    pub range: [f32; 2],
    /// Grid cells per axis.
    pub grid_dim: [u32; 2],
    /// Highlighted particle, per mille of the particle count.
    pub disp_idx: u32,
    /// RNG seed for particle placement.
    pub seed: u64,
    /// Frames the demo binary runs.
    pub frames: u32,
    /// Dispatch backend.
    pub backend: BackendConfig,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            particle_count: ParticleCount::Num8K,
            range: [128.0, 128.0],
            grid_dim: [16, 16],
            disp_idx: 0,
            seed: 42,
            frames: 120,
            backend: BackendConfig::default(),
        }
    }
}

impl SampleConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or unknown fields.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`SampleConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "sample config loaded");
        Ok(config)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] if TOML serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks the grid shape and display index.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Grid`] for an unusable range or grid,
    /// [`ConfigError::DispIdx`] for a display index above [`DISP_IDX_MAX`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid_config().validate()?;
        if self.disp_idx > DISP_IDX_MAX {
            return Err(ConfigError::DispIdx(self.disp_idx));
        }
        Ok(())
    }

    /// Number of particles.
    #[inline]
    #[must_use]
    pub const fn particle_count(&self) -> usize {
        self.particle_count.count()
    }

    /// Grid configuration for the optimizer.
    #[must_use]
    pub const fn grid_config(&self) -> GridConfig2D {
        GridConfig2D::new(self.particle_count(), self.range, self.grid_dim)
    }

    /// Sorted slot of the highlighted particle: `floor(disp_idx * N / 1000)`,
    /// capped at the last particle.
    #[must_use]
    pub fn display_slot(&self) -> usize {
        let n = self.particle_count();
        (self.disp_idx as usize * n / DISP_IDX_MAX as usize).min(n - 1)
    }
}
